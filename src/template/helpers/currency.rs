//! `formatCurrency` helper

use fixed_decimal::{Decimal, FloatPrecision};
use handlebars::{
    Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, RenderErrorReason,
    ScopedJson,
};
use icu::decimal::{options::DecimalFormatterOptions, DecimalFormatter};
use icu::locale::{locale, Locale};
use serde_json::Value;

use super::{derived, param, record_empty, AmbientMeta};
use crate::locale::DEFAULT_INTL_LOCALE;
use crate::normalize::is_empty;

/// Currency used when the template passes none
pub const DEFAULT_CURRENCY: &str = "TRY";

/// Placement of the currency marker around a formatted number.
///
/// `{-}` is the minus sign, `{n}` the number and `{c}` the marker.
#[derive(Debug, Clone, Copy)]
struct CurrencyPattern {
    symbol: &'static str,
    code: &'static str,
}

const PREFIX: CurrencyPattern = CurrencyPattern {
    symbol: "{-}{c}{n}",
    code: "{-}{c}\u{00A0}{n}",
};

const HEBREW: CurrencyPattern = CurrencyPattern {
    symbol: "\u{200F}{-}{n}\u{00A0}\u{200F}{c}",
    code: "\u{200F}{-}{n}\u{00A0}\u{200F}{c}",
};

const ARABIC: CurrencyPattern = CurrencyPattern {
    symbol: "\u{200F}{-}{n}\u{00A0}{c}\u{200F}",
    code: "\u{200F}{-}{n}\u{00A0}{c}\u{200F}",
};

/// Locale for digits and separators; unsupported tags format as en-US
fn number_locale(intl_locale: &str) -> Locale {
    match intl_locale {
        "tr-TR" => locale!("tr-TR"),
        "ar-SA" => locale!("ar-SA"),
        "he-IL" => locale!("he-IL"),
        _ => locale!("en-US"),
    }
}

fn pattern_for(intl_locale: &str) -> CurrencyPattern {
    match intl_locale {
        "ar-SA" => ARABIC,
        "he-IL" => HEBREW,
        _ => PREFIX,
    }
}

fn symbol_for(currency: &str) -> Option<&'static str> {
    match currency {
        "TRY" => Some("₺"),
        "USD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "ILS" => Some("₪"),
        "JPY" => Some("¥"),
        "SAR" => Some("ر.س."),
        _ => None,
    }
}

fn fraction_digits(currency: &str) -> i16 {
    match currency {
        "JPY" | "KRW" => 0,
        _ => 2,
    }
}

/// Read an amount from a number or a numeric string
pub(crate) fn parse_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

/// Localized digits, grouping and decimal separator for `amount`
/// rounded to `digits` fraction digits.
///
/// Returns the number and whether it is non-zero after rounding.
fn format_number(amount: f64, digits: i16, intl_locale: &str) -> (String, bool) {
    let mut decimal = match Decimal::try_from_f64(amount.abs(), FloatPrecision::RoundTrip) {
        Ok(decimal) => decimal,
        Err(_) => return (format!("{:.*}", digits as usize, amount.abs()), amount != 0.0),
    };
    decimal.round(-digits);
    decimal.pad_end(-digits);

    let non_zero = decimal
        .to_string()
        .bytes()
        .any(|b| matches!(b, b'1'..=b'9'));

    let formatter = DecimalFormatter::try_new(
        number_locale(intl_locale).into(),
        DecimalFormatterOptions::default(),
    );
    let number = match formatter {
        Ok(formatter) => formatter.format(&decimal).to_string(),
        Err(e) => {
            tracing::debug!(locale = %intl_locale, error = %e, "Decimal formatter unavailable");
            decimal.to_string()
        }
    };

    (number, non_zero)
}

/// Format `amount` in `currency` using the conventions of `intl_locale`.
///
/// Unknown tags use en-US conventions; unknown currencies print their code.
pub fn format_currency(amount: f64, currency: &str, intl_locale: &str) -> String {
    let currency = currency.trim().to_ascii_uppercase();
    let pattern = pattern_for(intl_locale);

    let (number, non_zero) = format_number(amount, fraction_digits(&currency), intl_locale);
    let sign = if amount < 0.0 && non_zero { "-" } else { "" };

    let (template, marker) = match symbol_for(&currency) {
        Some(symbol) => (pattern.symbol, symbol),
        None => (pattern.code, currency.as_str()),
    };

    template
        .replace("{-}", sign)
        .replace("{c}", marker)
        .replace("{n}", &number)
}

/// `{{formatCurrency totalAmount currency}}`
pub(super) struct FormatCurrencyHelper;

impl HelperDef for FormatCurrencyHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let value = param(h, 0);
        if is_empty(Some(value)) {
            record_empty("formatCurrency");
            return Ok(derived(Value::String(String::new())));
        }

        let amount = parse_amount(value).ok_or(RenderErrorReason::InvalidParamType("number"))?;
        let currency = param(h, 1)
            .as_str()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(DEFAULT_CURRENCY);
        let intl_locale = AmbientMeta::resolve(ctx, rc)
            .intl_locale
            .unwrap_or_else(|| DEFAULT_INTL_LOCALE.to_string());

        Ok(derived(Value::String(format_currency(amount, currency, &intl_locale))))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{meta, render, render_err};
    use super::*;
    use serde_json::json;

    #[test]
    fn test_turkish_layout() {
        assert_eq!(format_currency(1234.5, "TRY", "tr-TR"), "₺1.234,50");
        assert_eq!(format_currency(1234567.891, "EUR", "tr-TR"), "€1.234.567,89");
        assert_eq!(format_currency(12.0, "CHF", "tr-TR"), "CHF\u{00A0}12,00");
    }

    #[test]
    fn test_english_layout() {
        assert_eq!(format_currency(1234.5, "usd", "en-US"), "$1,234.50");
        assert_eq!(format_currency(-99.999, "USD", "en-US"), "-$100.00");
        assert_eq!(format_currency(5000.0, "JPY", "en-US"), "¥5,000");
    }

    #[test]
    fn test_rounds_the_decimal_value() {
        assert_eq!(format_currency(2.675, "USD", "en-US"), "$2.68");
        assert_eq!(format_currency(1.999, "EUR", "en-US"), "€2.00");
    }

    #[test]
    fn test_hebrew_layout() {
        assert_eq!(
            format_currency(1234.5, "ILS", "he-IL"),
            "\u{200F}1,234.50\u{00A0}\u{200F}₪"
        );
    }

    #[test]
    fn test_arabic_layout() {
        let formatted = format_currency(1234.5, "SAR", "ar-SA");
        assert!(formatted.starts_with('\u{200F}'));
        assert!(formatted.ends_with("ر.س.\u{200F}"));
        assert!(!formatted.contains('-'));
    }

    #[test]
    fn test_unknown_tag_uses_english_layout() {
        assert_eq!(format_currency(1000.0, "EUR", "fr-FR"), "€1,000.00");
        assert_eq!(format_currency(1000.0, "EUR", "not a tag"), "€1,000.00");
    }

    #[test]
    fn test_negative_zero_has_no_sign() {
        assert_eq!(format_currency(-0.001, "USD", "en-US"), "$0.00");
    }

    #[test]
    fn test_amount_coercion() {
        assert_eq!(parse_amount(&json!(10)), Some(10.0));
        assert_eq!(parse_amount(&json!(" 10.5 ")), Some(10.5));
        assert_eq!(parse_amount(&json!("abc")), None);
        assert_eq!(parse_amount(&json!(true)), None);
    }

    #[test]
    fn test_helper_uses_ambient_tag_and_defaults() {
        assert_eq!(render("{{formatCurrency a}}", json!({"a": 1500})), "₺1.500,00");
        assert_eq!(
            render(
                "{{formatCurrency a c}}",
                json!({"a": "1500", "c": "USD", "__meta": meta("en", "ltr", "en-US")})
            ),
            "$1,500.00"
        );
        assert_eq!(render("{{formatCurrency a}}", json!({"a": 0})), "₺0,00");
    }

    #[test]
    fn test_helper_absent_amount() {
        assert_eq!(render("[{{formatCurrency missing}}]", json!({})), "[]");
    }

    #[test]
    fn test_helper_rejects_non_numeric_amount() {
        assert!(render_err(r#"{{formatCurrency "abc" "USD"}}"#, json!({})).is_some());
    }
}
