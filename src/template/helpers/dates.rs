//! Date helpers: `formatDate`, `formatDateRange`, `now`

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use handlebars::{Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, ScopedJson};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::{derived, param, record_empty, to_text};
use crate::normalize::is_empty;

/// Output month abbreviations, whatever the input language
const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Separator between the two ends of a date range
const RANGE_SEPARATOR: &str = " - ";

/// Normalized month token to month number.
///
/// Tokens are stored the way [`fold_token`] produces them: decomposed,
/// combining marks removed, lowercased.
#[rustfmt::skip]
const MONTH_NAMES: &[(&str, u32)] = &[
    // English
    ("january", 1), ("jan", 1),
    ("february", 2), ("feb", 2),
    ("march", 3), ("mar", 3),
    ("april", 4), ("apr", 4),
    ("may", 5),
    ("june", 6), ("jun", 6),
    ("july", 7), ("jul", 7),
    ("august", 8), ("aug", 8),
    ("september", 9), ("sep", 9), ("sept", 9),
    ("october", 10), ("oct", 10),
    ("november", 11), ("nov", 11),
    ("december", 12), ("dec", 12),
    // Turkish
    ("ocak", 1), ("oca", 1),
    ("subat", 2), ("sub", 2), ("sbt", 2),
    ("mart", 3),
    ("nisan", 4), ("nis", 4),
    ("mayis", 5),
    ("haziran", 6), ("haz", 6),
    ("temmuz", 7), ("tem", 7),
    ("agustos", 8), ("agu", 8), ("ags", 8),
    ("eylul", 9), ("eyl", 9),
    ("ekim", 10), ("eki", 10),
    ("kasim", 11), ("kas", 11),
    ("aralik", 12), ("ara", 12),
    // Arabic, Gregorian names
    ("يناير", 1),
    ("فبراير", 2),
    ("مارس", 3),
    ("ابريل", 4),
    ("مايو", 5),
    ("يونيو", 6), ("يونيه", 6),
    ("يوليو", 7), ("يوليه", 7),
    ("اغسطس", 8),
    ("سبتمبر", 9),
    ("اكتوبر", 10),
    ("نوفمبر", 11),
    ("ديسمبر", 12),
    // Arabic, Levantine names
    ("شباط", 2),
    ("اذار", 3),
    ("نيسان", 4),
    ("ايار", 5),
    ("حزيران", 6),
    ("تموز", 7),
    ("اب", 8),
    ("ايلول", 9),
    // Hebrew
    ("ינואר", 1),
    ("פברואר", 2),
    ("מרץ", 3), ("מרס", 3),
    ("אפריל", 4),
    ("מאי", 5),
    ("יוני", 6),
    ("יולי", 7),
    ("אוגוסט", 8),
    ("ספטמבר", 9),
    ("אוקטובר", 10),
    ("נובמבר", 11),
    ("דצמבר", 12),
];

/// Formats tried when nothing more specific matched
const GENERIC_DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d-%b-%Y",
    "%Y%m%d",
];

const GENERIC_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

lazy_static! {
    /// `15/07/2025`, `15.07.2025`, `15-07-2025`
    static ref NUMERIC_DATE: Regex =
        Regex::new(r"^(\d{1,2})[./-](\d{1,2})[./-](\d{4})$").unwrap();

    /// `15 Jul 2025`, `15 Temmuz 2025`, `15 יולי 2025`
    static ref TEXTUAL_DATE: Regex =
        Regex::new(r"^(\d{1,2})\.?\s+([\p{L}\p{M}]+)\.?,?\s+(\d{4})$").unwrap();
}

/// Parse a loosely formatted date.
///
/// Tries, in order: RFC 3339 / ISO 8601, numeric day-month-year, day with a
/// month name in any supported language, then a list of generic formats.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    parse_iso(input)
        .or_else(|| parse_numeric(input))
        .or_else(|| parse_textual(input))
        .or_else(|| parse_generic(input))
}

fn parse_iso(input: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }

    GENERIC_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| NaiveDate::parse_from_str(input, "%Y-%m-%d").ok())
}

fn parse_numeric(input: &str) -> Option<NaiveDate> {
    let caps = NUMERIC_DATE.captures(input)?;
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_textual(input: &str) -> Option<NaiveDate> {
    let caps = TEXTUAL_DATE.captures(input)?;
    let day = caps[1].parse().ok()?;
    let month = month_number(&caps[2])?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_generic(input: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Some(dt.date_naive());
    }

    GENERIC_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(input, fmt).ok())
}

/// Decompose, drop combining marks, fold dotless i, lowercase, drop a trailing dot
pub(super) fn fold_token(token: &str) -> String {
    let folded: String = token
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| if c == 'ı' { 'i' } else { c })
        .flat_map(char::to_lowercase)
        .collect();
    folded.trim_end_matches('.').to_string()
}

fn month_number(token: &str) -> Option<u32> {
    let normalized = fold_token(token);
    let lookup = |name: &str| {
        MONTH_NAMES
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, month)| *month)
    };

    // Hebrew dates commonly carry the "in" prefix: 15 ביולי 2025
    lookup(&normalized).or_else(|| normalized.strip_prefix('ב').and_then(lookup))
}

fn canonical(date: NaiveDate) -> String {
    format!(
        "{:02} {} {}",
        date.day(),
        MONTH_ABBREVIATIONS[date.month0() as usize],
        date.year()
    )
}

/// Format a date as `DD Mon YYYY`, or return the input unchanged if unparsable.
///
/// Numbers are read as Unix epoch milliseconds.
pub fn format_date(value: &Value) -> String {
    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.date_naive()),
        Value::String(s) => parse_date(s),
        _ => None,
    };

    match parsed {
        Some(date) => canonical(date),
        None => to_text(value),
    }
}

/// Format both ends of `start - end`; a half-open range is returned unchanged
pub fn format_date_range(value: &Value) -> String {
    let Some(text) = value.as_str() else {
        return format_date(value);
    };

    match text.split_once(RANGE_SEPARATOR) {
        Some((start, end)) if start.trim().is_empty() || end.trim().is_empty() => text.to_string(),
        Some((start, end)) => format!(
            "{}{}{}",
            format_date(&Value::String(start.trim().to_string())),
            RANGE_SEPARATOR,
            format_date(&Value::String(end.trim().to_string()))
        ),
        None => format_date(value),
    }
}

/// `{{formatDate departureDate}}`
pub(super) struct FormatDateHelper;

impl HelperDef for FormatDateHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let value = param(h, 0);
        if is_empty(Some(value)) {
            record_empty("formatDate");
            return Ok(derived(Value::String(String::new())));
        }
        Ok(derived(Value::String(format_date(value))))
    }
}

/// `{{formatDateRange stayDates}}`
pub(super) struct FormatDateRangeHelper;

impl HelperDef for FormatDateRangeHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let value = param(h, 0);
        if is_empty(Some(value)) {
            record_empty("formatDateRange");
            return Ok(derived(Value::String(String::new())));
        }
        Ok(derived(Value::String(format_date_range(value))))
    }
}

/// `{{formatDate (now)}}`
pub(super) struct NowHelper;

impl HelperDef for NowHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        _: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        Ok(derived(Value::String(Utc::now().to_rfc3339())))
    }
}
