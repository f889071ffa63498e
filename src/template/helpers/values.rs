//! Value-level helpers: comparison, arithmetic, fallbacks

use handlebars::{
    Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, RenderErrorReason,
    ScopedJson,
};
use serde_json::{Number, Value};

use super::{derived, param, record_empty, to_text};
use crate::normalize::is_empty;

/// Values `firstValid` treats as "no data"
const PLACEHOLDER_TOKENS: &[&str] = &["-", "--", "\u{2014}", "n/a", "na"];

/// Strict equality; numbers compare by value
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Trimmed, case-insensitive string equality; false if either side is absent
pub fn loose_equals(a: &Value, b: &Value) -> bool {
    if a.is_null() || b.is_null() {
        return false;
    }
    to_text(a).trim().to_lowercase() == to_text(b).trim().to_lowercase()
}

/// True for placeholder strings such as `-` or `N/A`
pub fn is_placeholder(value: &Value) -> bool {
    value.as_str().is_some_and(|s| {
        let token = s.trim().to_lowercase();
        PLACEHOLDER_TOKENS.contains(&token.as_str())
    })
}

/// First value that is neither absent nor `""`
pub fn first_non_empty<'a>(values: impl IntoIterator<Item = &'a Value>) -> Option<&'a Value> {
    values.into_iter().find(|v| !is_empty(Some(*v)))
}

/// As [`first_non_empty`], also skipping placeholder tokens
pub fn first_valid<'a>(values: impl IntoIterator<Item = &'a Value>) -> Option<&'a Value> {
    values
        .into_iter()
        .find(|v| !is_empty(Some(*v)) && !is_placeholder(v))
}

enum Operand {
    Int(i64),
    Float(f64),
}

fn operand(value: &Value) -> Option<Operand> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .map(Operand::Int)
            .or_else(|| n.as_f64().map(Operand::Float)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Operand::Int)
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(Operand::Float))
        }
        _ => None,
    }
}

/// Numeric addition over numbers and numeric strings
pub fn add(a: &Value, b: &Value) -> Option<Value> {
    let sum = match (operand(a)?, operand(b)?) {
        (Operand::Int(x), Operand::Int(y)) => match x.checked_add(y) {
            Some(sum) => return Some(Value::from(sum)),
            None => x as f64 + y as f64,
        },
        (Operand::Int(x), Operand::Float(y)) => x as f64 + y,
        (Operand::Float(x), Operand::Int(y)) => x + y as f64,
        (Operand::Float(x), Operand::Float(y)) => x + y,
    };
    Number::from_f64(sum).map(Value::Number)
}

/// `{{add nights 1}}`
pub(super) struct AddHelper;

impl HelperDef for AddHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let sum = add(param(h, 0), param(h, 1)).ok_or(RenderErrorReason::InvalidParamType("number"))?;
        Ok(derived(sum))
    }
}

/// `{{or guestName customerName "Guest"}}`
pub(super) struct FirstNonEmptyHelper;

impl HelperDef for FirstNonEmptyHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let value = first_non_empty(h.params().iter().map(|p| p.value()));
        Ok(derived(value.cloned().unwrap_or_else(|| Value::String(String::new()))))
    }
}

/// `{{firstValid pnr bookingRef "-"}}`
pub(super) struct FirstValidHelper;

impl HelperDef for FirstValidHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let value = first_valid(h.params().iter().map(|p| p.value()));
        Ok(derived(value.cloned().unwrap_or_else(|| Value::String(String::new()))))
    }
}

/// `{{concat firstName " " lastName}}`
pub(super) struct ConcatHelper;

impl HelperDef for ConcatHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let joined: String = h.params().iter().map(|p| to_text(p.value())).collect();
        Ok(derived(Value::String(joined)))
    }
}

/// `{{safe hotelName "hotelName"}}`
pub(super) struct SafeHelper;

impl HelperDef for SafeHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let value = param(h, 0);

        if is_empty(Some(value)) {
            let field = param(h, 1).as_str().unwrap_or("unknown");
            tracing::warn!(field = %field, "Template field is missing or empty");
            record_empty("safe");
            return Ok(derived(Value::String(String::new())));
        }

        Ok(derived(value.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{render, render_err};
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strict_equals_numbers() {
        assert!(strict_equals(&json!(1), &json!(1.0)));
        assert!(!strict_equals(&json!(1), &json!("1")));
        assert!(strict_equals(&Value::Null, &Value::Null));
    }

    #[test]
    fn test_loose_equals() {
        assert!(loose_equals(&json!(" Visa "), &json!("VISA")));
        assert!(!loose_equals(&Value::Null, &json!("")));
        assert!(loose_equals(&json!(5), &json!("5")));
    }

    #[test]
    fn test_add() {
        assert_eq!(add(&json!(2), &json!(3)), Some(json!(5)));
        assert_eq!(add(&json!("2"), &json!(1.5)), Some(json!(3.5)));
        assert_eq!(add(&json!("x"), &json!(1)), None);
        assert_eq!(add(&Value::Null, &json!(1)), None);
    }

    #[test]
    fn test_add_helper() {
        assert_eq!(render("{{add index 1}}", json!({"index": 0})), "1");
        assert!(render_err(r#"{{add "x" 1}}"#, json!({})).is_some());
    }

    #[test]
    fn test_or_helper() {
        let template = r#"{{or a b "fallback"}}"#;
        assert_eq!(render(template, json!({"a": "", "b": "B"})), "B");
        assert_eq!(render(template, json!({"a": 0})), "0");
        assert_eq!(render(template, json!({})), "fallback");
        assert_eq!(render("[{{or a b}}]", json!({})), "[]");
    }

    #[test]
    fn test_first_valid_helper() {
        let template = r#"{{firstValid a b c}}"#;
        assert_eq!(render(template, json!({"a": " N/A ", "b": "—", "c": "PNR42"})), "PNR42");
        assert_eq!(render(template, json!({"a": "--", "b": "na"})), "");
    }

    #[test]
    fn test_placeholder_tokens() {
        assert!(is_placeholder(&json!("-")));
        assert!(is_placeholder(&json!(" NA ")));
        assert!(!is_placeholder(&json!("nap")));
        assert!(!is_placeholder(&json!(0)));
    }

    #[test]
    fn test_concat_helper() {
        let out = render(r#"{{concat first " " missing last 7}}"#, json!({"first": "Ava", "last": "Doe"}));
        assert_eq!(out, "Ava Doe7");
    }

    #[test]
    fn test_safe_helper() {
        assert_eq!(render(r#"[{{safe name "name"}}]"#, json!({"name": ""})), "[]");
        assert_eq!(render(r#"[{{safe name "name"}}]"#, json!({})), "[]");
        assert_eq!(render(r#"[{{safe name "name"}}]"#, json!({"name": "Ava"})), "[Ava]");
        assert_eq!(render(r#"[{{safe n "n"}}]"#, json!({"n": 0})), "[0]");
    }
}
