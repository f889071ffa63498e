//! Default email subjects per template

use std::sync::Arc;

use super::store::LocaleStore;
use super::types::Locale;

/// Template key to subject dictionary key
const TEMPLATE_KEY_TO_SUBJECT: &[(&str, &str)] = &[
    ("welcome", "welcome"),
    ("password-reset", "passwordReset"),
    ("flight-ticket", "flightTicket"),
    ("flight-details", "flightDetails"),
    ("hotel-reservation", "hotelReservation"),
    ("reservation-confirmation", "reservationConfirmation"),
    ("package-reservation", "packageReservation"),
    ("transfer-reservation", "transferReservation"),
];

/// Subject dictionary key for a template, if the template is known
pub fn subject_key(template_key: &str) -> Option<&'static str> {
    TEMPLATE_KEY_TO_SUBJECT
        .iter()
        .find(|(template, _)| *template == template_key)
        .map(|(_, subject)| *subject)
}

/// Resolves a localized default subject for a template
#[derive(Debug, Clone)]
pub struct SubjectResolver {
    store: Arc<LocaleStore>,
}

impl SubjectResolver {
    pub fn new(store: Arc<LocaleStore>) -> Self {
        Self { store }
    }

    /// Localized subject, or the raw template key when none is known
    pub fn resolve(&self, locale: &str, template_key: &str) -> String {
        let Some(key) = subject_key(template_key) else {
            return template_key.to_string();
        };

        Locale::fallback_chain(locale)
            .into_iter()
            .filter_map(|candidate| self.store.get(candidate))
            .find_map(|bundle| bundle.subject(key))
            .map(str::to_string)
            .unwrap_or_else(|| template_key.to_string())
    }
}
