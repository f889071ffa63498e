//! Dotted-key translation with locale fallback and parameter interpolation

use std::sync::Arc;

use serde_json::{Map, Value};

use super::store::LocaleStore;
use super::types::Locale;
use crate::metrics::TranslationMetrics;

/// Outcome of a translation lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationLookup {
    /// Found in the requested locale
    Found(String),
    /// Found in a locale further down the fallback chain
    Fallback { value: String, from: Locale },
    /// Not found in any locale of the chain
    Missing,
}

impl TranslationLookup {
    /// The resolved value, or an empty string when missing
    pub fn into_value(self) -> String {
        match self {
            TranslationLookup::Found(value) | TranslationLookup::Fallback { value, .. } => value,
            TranslationLookup::Missing => String::new(),
        }
    }
}

/// Resolves translation keys against the locale store
#[derive(Debug, Clone)]
pub struct Translator {
    store: Arc<LocaleStore>,
}

impl Translator {
    pub fn new(store: Arc<LocaleStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<LocaleStore> {
        &self.store
    }

    /// Walk the fallback chain for `dotted_key` without emitting signals
    pub fn lookup(&self, locale: &str, dotted_key: &str) -> TranslationLookup {
        let requested = locale.parse::<Locale>().ok();

        for candidate in Locale::fallback_chain(locale) {
            let Some(bundle) = self.store.get(candidate) else {
                continue;
            };

            if let Some(value) = bundle.lookup(dotted_key) {
                return if Some(candidate) == requested {
                    TranslationLookup::Found(value.to_string())
                } else {
                    TranslationLookup::Fallback {
                        value: value.to_string(),
                        from: candidate,
                    }
                };
            }
        }

        TranslationLookup::Missing
    }

    /// Resolve a key to a localized string.
    ///
    /// Never fails: a missing key yields an empty string. Fallbacks and misses
    /// are logged and counted.
    pub fn resolve(&self, locale: &str, dotted_key: &str, params: Option<&Map<String, Value>>) -> String {
        let translation = match self.lookup(locale, dotted_key) {
            TranslationLookup::Found(value) => value,
            TranslationLookup::Fallback { value, from } => {
                tracing::warn!(
                    key = %dotted_key,
                    requested = %locale,
                    resolved = %from,
                    "Translation fallback"
                );
                TranslationMetrics::record_fallback(locale, from.as_str());
                value
            }
            TranslationLookup::Missing => {
                tracing::warn!(key = %dotted_key, locale = %locale, "Translation not found in any locale");
                TranslationMetrics::record_missing();
                return String::new();
            }
        };

        match params {
            Some(params) if !params.is_empty() => interpolate(&translation, params),
            _ => translation,
        }
    }
}

/// Replace every literal `{{name}}` with the matching parameter.
///
/// Placeholders without a parameter are left verbatim.
pub fn interpolate(template: &str, params: &Map<String, Value>) -> String {
    let mut result = template.to_string();

    for (key, value) in params {
        let pattern = format!("{{{{{}}}}}", key);
        if result.contains(&pattern) {
            result = result.replace(&pattern, &stringify(value));
        }
    }

    result
}

/// Stringify a JSON value for embedding in text
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        // For arrays and objects, use JSON representation
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::test_support::store_from;
    use serde_json::json;

    fn translator() -> Translator {
        Translator::new(Arc::new(store_from(
            json!({"common": {"only_tr": "Sadece Türkçe", "hello": "Merhaba {{name}}"}}),
            json!({"common": {"hello": "Hello {{name}}, {{name}}! Ref {{ref}}", "default": "Default"}}),
            json!({"common": {"hello": "مرحبا {{name}}"}}),
            json!({}),
        )))
    }

    #[test]
    fn test_found_in_requested_locale() {
        let t = translator();
        assert_eq!(
            t.lookup("ar", "common.hello"),
            TranslationLookup::Found("مرحبا {{name}}".to_string())
        );
    }

    #[test]
    fn test_falls_back_to_ultimate_fallback_locale() {
        let t = translator();
        assert_eq!(
            t.lookup("he", "common.only_tr"),
            TranslationLookup::Fallback {
                value: "Sadece Türkçe".to_string(),
                from: Locale::Tr
            }
        );
        assert_eq!(t.resolve("he", "common.only_tr", None), "Sadece Türkçe");
    }

    #[test]
    fn test_falls_back_to_default_before_ultimate() {
        let t = translator();
        assert_eq!(
            t.lookup("he", "common.hello"),
            TranslationLookup::Fallback {
                value: "Hello {{name}}, {{name}}! Ref {{ref}}".to_string(),
                from: Locale::En
            }
        );
    }

    #[test]
    fn test_missing_key_returns_empty() {
        let t = translator();
        assert_eq!(t.lookup("en", "common.nope"), TranslationLookup::Missing);
        assert_eq!(t.resolve("en", "common.nope", None), "");
    }

    #[test]
    fn test_unknown_locale_uses_default_chain() {
        let t = translator();
        assert_eq!(
            t.lookup("fr", "common.default"),
            TranslationLookup::Fallback {
                value: "Default".to_string(),
                from: Locale::En
            }
        );
    }

    #[test]
    fn test_interpolation_replaces_every_occurrence() {
        let t = translator();
        let params = json!({"name": "Ava", "unused": 5});
        let result = t.resolve("en", "common.hello", params.as_object());
        assert_eq!(result, "Hello Ava, Ava! Ref {{ref}}");
    }

    #[test]
    fn test_interpolation_stringifies_values() {
        let params = json!({"n": 42, "flag": true, "none": null});
        let result = interpolate("{{n}}/{{flag}}/{{none}}.", params.as_object().unwrap());
        assert_eq!(result, "42/true/.");
    }
}
