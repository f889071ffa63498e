//! Locale bundle storage

use std::collections::HashMap;
use std::path::Path;

use super::types::{Locale, LocaleBundle, LocaleError, LocaleResult};

/// Immutable set of locale bundles, one per supported locale.
///
/// Built once at startup; a store can only exist if every locale in
/// [`Locale::ALL`] has a bundle.
#[derive(Debug)]
pub struct LocaleStore {
    bundles: HashMap<Locale, LocaleBundle>,
}

impl LocaleStore {
    /// Load `<dir>/<locale>.json` for every supported locale
    pub fn load(dir: impl AsRef<Path>) -> LocaleResult<Self> {
        let dir = dir.as_ref();
        let mut bundles = HashMap::with_capacity(Locale::ALL.len());

        for locale in Locale::ALL {
            let path = dir.join(format!("{}.json", locale));

            if !path.is_file() {
                return Err(LocaleError::MissingBundle(path));
            }

            let content = std::fs::read_to_string(&path).map_err(|source| LocaleError::Io {
                path: path.clone(),
                source,
            })?;

            let document: serde_json::Value = serde_json::from_str(&content)
                .map_err(|source| LocaleError::InvalidBundle {
                    path: path.clone(),
                    source,
                })?;

            let bundle =
                LocaleBundle::from_value(document).map_err(|source| LocaleError::InvalidBundle {
                    path: path.clone(),
                    source,
                })?;

            if bundle.meta.is_none() {
                tracing::warn!(locale = %locale, "Locale file has no meta, defaults will be used");
            }

            tracing::info!(locale = %locale, path = %path.display(), "Locale file loaded");
            bundles.insert(locale, bundle);
        }

        tracing::info!(count = bundles.len(), "All locale files loaded successfully");

        Ok(Self { bundles })
    }

    /// Build a store from in-memory bundles
    pub fn from_bundles(mut bundles: HashMap<Locale, LocaleBundle>) -> LocaleResult<Self> {
        for locale in Locale::ALL {
            if !bundles.contains_key(&locale) {
                return Err(LocaleError::Incomplete(locale));
            }
        }
        bundles.shrink_to_fit();
        Ok(Self { bundles })
    }

    /// Bundle for a supported locale
    pub fn get(&self, locale: Locale) -> Option<&LocaleBundle> {
        self.bundles.get(&locale)
    }

    /// Bundle for a caller-supplied locale string, if it names a supported locale
    pub fn bundle_for(&self, locale: &str) -> Option<&LocaleBundle> {
        locale.parse::<Locale>().ok().and_then(|l| self.get(l))
    }

    /// Translation tree for a locale string.
    ///
    /// Unknown locales get the tree of the first bundle in their fallback chain.
    pub fn translations_for(&self, locale: &str) -> &serde_json::Value {
        static EMPTY: serde_json::Value = serde_json::Value::Null;

        let requested = locale.parse::<Locale>().ok();

        for candidate in Locale::fallback_chain(locale) {
            if let Some(bundle) = self.get(candidate) {
                if Some(candidate) != requested {
                    tracing::warn!(
                        locale = %locale,
                        resolved = %candidate,
                        "Locale data not found, using fallback translations"
                    );
                }
                return &bundle.translations;
            }
        }

        &EMPTY
    }

    /// Number of loaded bundles
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    fn write_bundles(dir: &Path, skip: Option<Locale>) {
        for locale in Locale::ALL {
            if Some(locale) == skip {
                continue;
            }
            let doc = json!({
                "meta": {"direction": "ltr", "align": "left", "fontFamily": "Arial"},
                "subjects": {"welcome": format!("Welcome ({})", locale)},
                "greeting": format!("hello-{}", locale)
            });
            fs::write(dir.join(format!("{}.json", locale)), doc.to_string()).unwrap();
        }
    }

    #[test]
    fn test_load_all_bundles() {
        let dir = tempfile::tempdir().unwrap();
        write_bundles(dir.path(), None);

        let store = LocaleStore::load(dir.path()).unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(store.get(Locale::Ar).unwrap().lookup("greeting"), Some("hello-ar"));
        assert_eq!(store.bundle_for("he").unwrap().lookup("greeting"), Some("hello-he"));
        assert!(store.bundle_for("fr").is_none());
    }

    #[test]
    fn test_missing_bundle_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_bundles(dir.path(), Some(Locale::He));

        let result = LocaleStore::load(dir.path());
        assert!(matches!(result, Err(LocaleError::MissingBundle(p)) if p.ends_with("he.json")));
    }

    #[test]
    fn test_unparsable_bundle_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_bundles(dir.path(), None);
        fs::write(dir.path().join("en.json"), "{ not json").unwrap();

        let result = LocaleStore::load(dir.path());
        assert!(matches!(result, Err(LocaleError::InvalidBundle { .. })));
    }

    #[test]
    fn test_from_bundles_requires_every_locale() {
        let mut bundles = HashMap::new();
        bundles.insert(
            Locale::En,
            LocaleBundle::from_value(json!({"a": "b"})).unwrap(),
        );

        assert!(matches!(
            LocaleStore::from_bundles(bundles),
            Err(LocaleError::Incomplete(Locale::Tr))
        ));
    }

    #[test]
    fn test_translations_for_unknown_locale_uses_default() {
        let dir = tempfile::tempdir().unwrap();
        write_bundles(dir.path(), None);
        let store = LocaleStore::load(dir.path()).unwrap();

        assert_eq!(store.translations_for("fr")["greeting"], "hello-en");
        assert_eq!(store.translations_for("ar")["greeting"], "hello-ar");
    }
}
