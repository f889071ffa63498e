//! Locale types and error definitions

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Locale-specific error type.
///
/// Every variant is fatal: the service must not start without a complete
/// bundle set.
#[derive(Debug, Error)]
pub enum LocaleError {
    #[error("Locale file not found: {}", .0.display())]
    MissingBundle(PathBuf),

    #[error("Failed to read locale file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid locale file {}: {source}", .path.display())]
    InvalidBundle {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No bundle provided for locale: {0}")]
    Incomplete(Locale),
}

/// Result type for locale operations
pub type LocaleResult<T> = Result<T, LocaleError>;

/// Supported locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    Tr,
    En,
    Ar,
    He,
}

impl Locale {
    /// Every locale that must have a bundle at startup
    pub const ALL: [Locale; 4] = [Locale::Tr, Locale::En, Locale::Ar, Locale::He];

    /// Designated default locale, tried right after the requested one
    pub const DEFAULT: Locale = Locale::En;

    /// Ultimate fallback locale, tried last
    pub const FALLBACK: Locale = Locale::Tr;

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::Tr => "tr",
            Locale::En => "en",
            Locale::Ar => "ar",
            Locale::He => "he",
        }
    }

    /// Lookup order for a requested locale string.
    ///
    /// Unrecognized locales simply start at the default locale.
    pub fn fallback_chain(requested: &str) -> Vec<Locale> {
        let mut chain = Vec::with_capacity(3);
        if let Ok(locale) = requested.parse::<Locale>() {
            chain.push(locale);
        }
        for locale in [Locale::DEFAULT, Locale::FALLBACK] {
            if !chain.contains(&locale) {
                chain.push(locale);
            }
        }
        chain
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tr" => Ok(Locale::Tr),
            "en" => Ok(Locale::En),
            "ar" => Ok(Locale::Ar),
            "he" => Ok(Locale::He),
            _ => Err(()),
        }
    }
}

/// Text direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

/// Horizontal text alignment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Right,
}

impl Align {
    /// The horizontal complement
    pub fn opposite(self) -> Align {
        match self {
            Align::Left => Align::Right,
            Align::Right => Align::Left,
        }
    }
}

/// Presentation metadata stored in a bundle's `meta` object
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleMeta {
    pub direction: Direction,
    pub align: Align,
    pub font_family: String,
}

/// One locale's translation and metadata document.
///
/// `translations` holds the whole parsed document, so `meta.*` and
/// `subjects.*` stay addressable through dotted keys.
#[derive(Debug, Clone)]
pub struct LocaleBundle {
    pub meta: Option<BundleMeta>,
    pub subjects: HashMap<String, String>,
    pub translations: serde_json::Value,
}

impl LocaleBundle {
    /// Build a bundle from a parsed JSON document
    pub fn from_value(document: serde_json::Value) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        struct Header {
            #[serde(default)]
            meta: Option<BundleMeta>,
            #[serde(default)]
            subjects: HashMap<String, String>,
        }

        let header: Header = serde_json::from_value(document.clone())?;

        Ok(Self {
            meta: header.meta,
            subjects: header.subjects,
            translations: document,
        })
    }

    /// Navigate the translation tree along a dotted key.
    ///
    /// Only a string leaf counts as a value.
    pub fn lookup(&self, dotted_key: &str) -> Option<&str> {
        let mut current = &self.translations;
        for part in dotted_key.split('.') {
            current = current.as_object()?.get(part)?;
        }
        current.as_str()
    }

    /// Localized subject for an internal subject key
    pub fn subject(&self, subject_key: &str) -> Option<&str> {
        self.subjects
            .get(subject_key)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// Per-render presentation metadata, derived from a bundle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleMeta {
    pub locale: String,
    pub direction: Direction,
    pub align: Align,
    pub opposite_align: Align,
    pub font_family: String,
    pub intl_locale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}
