//! Mail types and error definitions

use serde::Serialize;
use thiserror::Error;

/// Mail-specific error type
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid email address: {0}")]
    Address(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Failed to send email: {0}")]
    Send(String),

    #[error("SMTP connection failed: {0}")]
    Connection(String),

    #[error("Invalid mail configuration: {0}")]
    Config(String),
}

/// Result type for mail operations
pub type MailResult<T> = Result<T, MailError>;

/// A rendered email ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
}

impl OutgoingEmail {
    pub fn new(to: Vec<String>, subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            to,
            subject: subject.into(),
            html: html.into(),
            reply_to: None,
            cc: Vec::new(),
            bcc: Vec::new(),
        }
    }

    pub fn with_reply_to(mut self, reply_to: Option<String>) -> Self {
        self.reply_to = reply_to;
        self
    }

    pub fn with_cc(mut self, cc: Vec<String>) -> Self {
        self.cc = cc;
        self
    }

    pub fn with_bcc(mut self, bcc: Vec<String>) -> Self {
        self.bcc = bcc;
        self
    }

    /// Every address the message is delivered to
    pub fn recipient_count(&self) -> usize {
        self.to.len() + self.cc.len() + self.bcc.len()
    }
}

/// Image embedded in every message and referenced from HTML as `cid:<content_id>`
#[derive(Debug, Clone)]
pub struct InlineImage {
    pub content_id: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl InlineImage {
    /// Load an inline image from disk.
    ///
    /// A missing file is not an error: messages are then sent without it.
    pub fn load(path: &std::path::Path, content_id: &str) -> Option<Self> {
        match std::fs::read(path) {
            Ok(bytes) => Some(Self {
                content_id: content_id.to_string(),
                content_type: content_type_for(path).to_string(),
                bytes,
            }),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Inline image not readable, emails will be sent without it"
                );
                None
            }
        }
    }
}

fn content_type_for(path: &std::path::Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_outgoing_email_builder() {
        let email = OutgoingEmail::new(vec!["a@example.com".into()], "Hi", "<p>Hi</p>")
            .with_reply_to(Some("support@example.com".into()))
            .with_cc(vec!["b@example.com".into()])
            .with_bcc(vec!["c@example.com".into(), "d@example.com".into()]);

        assert_eq!(email.recipient_count(), 4);
        assert_eq!(email.reply_to.as_deref(), Some("support@example.com"));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("logo.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("logo.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("logo")), "application/octet-stream");
    }

    #[test]
    fn test_inline_image_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let image = InlineImage::load(&path, "logo").unwrap();
        assert_eq!(image.content_id, "logo");
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.bytes.len(), 4);

        assert!(InlineImage::load(&dir.path().join("missing.png"), "logo").is_none());
    }
}
