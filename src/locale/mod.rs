//! Locale bundles and locale-dependent lookups.
//!
//! This module provides:
//! - Eager loading of one translation bundle per supported locale
//! - Dotted-key translation with a `[requested, en, tr]` fallback chain
//! - Presentation metadata (direction, alignment, font, numeric tag)
//! - Localized default subjects per template
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(LocaleStore::load("locales")?);
//! let translator = Translator::new(store.clone());
//!
//! let greeting = translator.resolve("ar", "welcome.greeting", params.as_object());
//! let meta = MetaResolver::new(store.clone(), None).resolve("ar");
//! assert_eq!(meta.direction, Direction::Rtl);
//! ```

mod meta;
mod store;
mod subject;
mod translator;
mod types;

pub use meta::{intl_locale_for, MetaResolver, DEFAULT_FONT_FAMILY, DEFAULT_INTL_LOCALE};
pub use store::LocaleStore;
pub use subject::{subject_key, SubjectResolver};
pub use translator::{interpolate, stringify, TranslationLookup, Translator};
pub use types::{
    Align, BundleMeta, Direction, Locale, LocaleBundle, LocaleError, LocaleMeta, LocaleResult,
};
