//! `salutation` helper

use std::fmt;

use handlebars::{Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, ScopedJson};
use serde_json::{Map, Value};

use super::dates::fold_token;
use super::{derived, param};

/// Record fields inspected for title-like markers, highest priority first
const TITLE_FIELDS: &[&str] = &["title", "type", "passengerType", "guestType"];

const GENDER_FIELD: &str = "gender";

const CHILD_MARKERS: &[&str] = &[
    "chd", "child", "children", "kid", "inf", "infant", "baby", "cocuk", "bebek",
];

const FEMALE_MARKERS: &[&str] = &[
    "mrs", "ms", "miss", "mme", "female", "woman", "bayan", "hanim", "kadin",
];

const FEMALE_GENDERS: &[&str] = &["f", "female", "woman", "k", "kadin", "bayan"];

/// Salutation token printed in templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Salutation {
    Mr,
    Mrs,
    Child,
}

impl Salutation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Salutation::Mr => "MR",
            Salutation::Mrs => "MRS",
            Salutation::Child => "CHD",
        }
    }
}

impl fmt::Display for Salutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Infer a salutation for a guest or passenger record.
///
/// Child markers in any title-like field win, then female markers, then the
/// gender field. Anything else, including non-record input, is `MR`.
pub fn infer_salutation(guest: &Value) -> Salutation {
    let Some(record) = guest.as_object() else {
        return Salutation::Mr;
    };

    let titles: Vec<String> = TITLE_FIELDS
        .iter()
        .filter_map(|field| normalized(record, field))
        .collect();

    if titles.iter().any(|t| CHILD_MARKERS.contains(&t.as_str())) {
        return Salutation::Child;
    }

    if titles.iter().any(|t| FEMALE_MARKERS.contains(&t.as_str())) {
        return Salutation::Mrs;
    }

    match normalized(record, GENDER_FIELD) {
        Some(gender) if FEMALE_GENDERS.contains(&gender.as_str()) => Salutation::Mrs,
        _ => Salutation::Mr,
    }
}

fn normalized(record: &Map<String, Value>, field: &str) -> Option<String> {
    let value = record.get(field)?.as_str()?;
    let folded = fold_token(value.trim());
    (!folded.is_empty()).then_some(folded)
}

/// `{{salutation passenger}}`
pub(super) struct SalutationHelper;

impl HelperDef for SalutationHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let salutation = infer_salutation(param(h, 0));
        Ok(derived(Value::String(salutation.as_str().to_string())))
    }
}
