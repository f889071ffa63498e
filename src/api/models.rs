//! Request and response bodies for the email API.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::mail::{is_valid_email, OutgoingEmail};

/// Locale used when a request names none
pub const DEFAULT_REQUEST_LOCALE: &str = "tr";

/// Body of `POST /api/email/{template_key}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SendEmailRequest {
    pub to: Vec<String>,
    #[serde(default = "default_locale")]
    pub locale: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub meta: Option<EmailMeta>,
}

/// Optional delivery headers
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EmailMeta {
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub bcc: Vec<String>,
}

fn default_locale() -> String {
    DEFAULT_REQUEST_LOCALE.to_string()
}

/// One validation problem, addressed by its JSON path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub path: Vec<Value>,
    pub message: String,
}

impl FieldError {
    fn new(path: Vec<Value>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

/// Serialize validation problems for an error response
pub fn error_details(errors: &[FieldError]) -> Value {
    Value::Array(
        errors
            .iter()
            .map(|e| json!({"path": e.path, "message": e.message}))
            .collect(),
    )
}

impl SendEmailRequest {
    /// Decode and validate a request body
    pub fn from_value(body: Value) -> Result<Self, Vec<FieldError>> {
        let request: SendEmailRequest = serde_json::from_value(body)
            .map_err(|e| vec![FieldError::new(Vec::new(), e.to_string())])?;

        let errors = request.validate();
        if errors.is_empty() {
            Ok(request)
        } else {
            Err(errors)
        }
    }

    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.to.is_empty() {
            errors.push(FieldError::new(
                vec![json!("to")],
                "At least one recipient is required",
            ));
        }
        check_addresses(&mut errors, &[json!("to")], &self.to);

        if let Some(meta) = &self.meta {
            if let Some(reply_to) = &meta.reply_to {
                if !is_valid_email(reply_to) {
                    errors.push(FieldError::new(
                        vec![json!("meta"), json!("reply_to")],
                        "Invalid email",
                    ));
                }
            }
            check_addresses(&mut errors, &[json!("meta"), json!("cc")], &meta.cc);
            check_addresses(&mut errors, &[json!("meta"), json!("bcc")], &meta.bcc);
        }

        errors
    }

    /// Subject to send: the request's own, if non-blank
    pub fn explicit_subject(&self) -> Option<&str> {
        self.subject.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Assemble the outgoing message
    pub fn into_email(self, subject: String, html: String) -> OutgoingEmail {
        let meta = self.meta.unwrap_or_default();
        OutgoingEmail::new(self.to, subject, html)
            .with_reply_to(meta.reply_to)
            .with_cc(meta.cc)
            .with_bcc(meta.bcc)
    }
}

fn check_addresses(errors: &mut Vec<FieldError>, prefix: &[Value], addresses: &[String]) {
    for (index, address) in addresses.iter().enumerate() {
        if !is_valid_email(address) {
            let mut path = prefix.to_vec();
            path.push(json!(index));
            errors.push(FieldError::new(path, "Invalid email"));
        }
    }
}

/// Body of a successful send
#[derive(Debug, Serialize)]
pub struct SendEmailResponse {
    pub success: bool,
    pub message: String,
    pub data: SendEmailData,
}

#[derive(Debug, Serialize)]
pub struct SendEmailData {
    pub message_id: String,
}

/// Body of a successful cache clear
#[derive(Debug, Serialize)]
pub struct CacheClearResponse {
    pub success: bool,
    pub data: CacheClearData,
}

#[derive(Debug, Serialize)]
pub struct CacheClearData {
    pub partials: usize,
}
