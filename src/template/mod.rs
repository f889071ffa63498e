//! Email template engine.
//!
//! This module provides:
//! - A per-instance handlebars registry with the email helper set
//! - Compile-once caching of `<templates_dir>/<key>.hbs` sources
//! - Reusable partials loaded from `<templates_dir>/partials`
//! - [`EmailRenderer`], the single entry point that normalizes the payload,
//!   injects translations and locale metadata, and executes the template
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(LocaleStore::load("locales")?);
//! let renderer = EmailRenderer::new(TemplateConfig::new("templates"), store, Some("cid:logo".into()))?;
//!
//! let data = json!({"customerName": "Ava", "cardLastFour": "4242"});
//! let html = renderer.render("welcome", "en", data.as_object().unwrap())?;
//! ```

mod compiler;
pub mod helpers;
mod renderer;

pub use compiler::{CompilerStats, TemplateCompiler, TemplateConfig};
pub use renderer::EmailRenderer;

use std::path::PathBuf;

use thiserror::Error;

/// Context key carrying the full translation tree of the active locale
pub const I18N_KEY: &str = "__i18n";

/// Context key carrying the serialized [`crate::locale::LocaleMeta`]
pub const META_KEY: &str = "__meta";

/// Template-specific error type
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Invalid template key: {0}")]
    InvalidKey(String),

    #[error("Failed to compile template {key}: {source}")]
    Compile {
        key: String,
        #[source]
        source: handlebars::TemplateError,
    },

    #[error("Failed to compile partial {name}: {source}")]
    Partial {
        name: String,
        #[source]
        source: handlebars::TemplateError,
    },

    #[error("Failed to render template {key} for locale {locale}: {source}")]
    Render {
        key: String,
        locale: String,
        #[source]
        source: handlebars::RenderError,
    },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Validate a template key before it is used to build a file path.
///
/// Keys are 1-64 characters of ASCII alphanumerics, dash or underscore.
pub fn validate_template_key(key: &str) -> TemplateResult<()> {
    if key.is_empty() || key.len() > 64 {
        return Err(TemplateError::InvalidKey(
            "Key must be 1-64 characters".to_string(),
        ));
    }

    if !key
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(TemplateError::InvalidKey(
            "Key must contain only alphanumeric, dash, or underscore".to_string(),
        ));
    }

    Ok(())
}
