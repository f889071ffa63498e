//! Payload normalization.
//!
//! Callers send payment details under many historical field names, at the
//! top level or nested in a `payment` object. [`DataNormalizer`] resolves
//! each logical field with a first-non-empty-wins rule and writes the winner
//! back under one canonical name, so templates only ever read
//! `cardLast4`, `totalAmount` and friends.
//!
//! Card logo references are only kept when they point at an inline
//! attachment, a data URI or a same-origin path.

mod payment;

pub use payment::{is_empty, is_safe_logo, PaymentFields, CARD_LOGO_FIELD};

use serde_json::{Map, Value};

/// Reconciles heterogeneous payload shapes into canonical fields
#[derive(Debug, Clone, Copy, Default)]
pub struct DataNormalizer;

impl DataNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Return a normalized shallow copy of `payload`.
    ///
    /// Total: unknown shapes are passed through untouched.
    pub fn normalize(&self, payload: &Map<String, Value>) -> Map<String, Value> {
        let fields = PaymentFields::collect(payload);
        let mut normalized = payload.clone();

        for (name, value) in fields.canonical() {
            if let Some(value) = value {
                normalized.insert(name.to_string(), value.clone());
            }
        }

        match fields.card_logo_url {
            Some(logo) if is_safe_logo(&logo) => {
                normalized.insert(CARD_LOGO_FIELD.to_string(), logo);
            }
            Some(logo) => {
                tracing::warn!(logo = %logo, "Dropping card logo with unsupported reference");
                payment::strip_logo(&mut normalized);
            }
            None => {}
        }

        normalized
    }
}
