//! Per-locale presentation metadata

use std::sync::Arc;

use super::store::LocaleStore;
use super::types::{Align, Direction, LocaleMeta};

/// Font stack used when a bundle carries no metadata
pub const DEFAULT_FONT_FAMILY: &str = "Segoe UI, Tahoma, Geneva, Verdana, sans-serif";

/// Numeric tag used when a bundle carries no metadata
pub const DEFAULT_INTL_LOCALE: &str = "tr-TR";

/// Numeric tag for locales outside the lookup table
pub const GENERIC_INTL_LOCALE: &str = "en-US";

/// Map a locale to its number/date formatting tag
pub fn intl_locale_for(locale: &str) -> &'static str {
    match locale {
        "tr" => "tr-TR",
        "en" => "en-US",
        "ar" => "ar-SA",
        "he" => "he-IL",
        _ => GENERIC_INTL_LOCALE,
    }
}

/// Derives [`LocaleMeta`] for a render.
///
/// Resolution is total: unknown locales and bundles without `meta` fall back
/// to a left-to-right default.
#[derive(Debug, Clone)]
pub struct MetaResolver {
    store: Arc<LocaleStore>,
    logo_url: Option<String>,
}

impl MetaResolver {
    pub fn new(store: Arc<LocaleStore>, logo_url: Option<String>) -> Self {
        Self { store, logo_url }
    }

    pub fn resolve(&self, locale: &str) -> LocaleMeta {
        let Some(meta) = self.store.bundle_for(locale).and_then(|b| b.meta.as_ref()) else {
            return LocaleMeta {
                locale: locale.to_string(),
                direction: Direction::Ltr,
                align: Align::Left,
                opposite_align: Align::Right,
                font_family: DEFAULT_FONT_FAMILY.to_string(),
                intl_locale: DEFAULT_INTL_LOCALE.to_string(),
                logo_url: self.logo_url.clone(),
            };
        };

        LocaleMeta {
            locale: locale.to_string(),
            direction: meta.direction,
            align: meta.align,
            opposite_align: meta.align.opposite(),
            font_family: meta.font_family.clone(),
            intl_locale: intl_locale_for(locale).to_string(),
            logo_url: self.logo_url.clone(),
        }
    }
}
