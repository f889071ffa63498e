//! Email delivery.
//!
//! This module provides:
//! - [`MailTransport`], the async seam between the HTTP layer and delivery
//! - [`SmtpTransport`], an SMTP relay client built on lettre
//! - [`MemoryTransport`], which records messages for tests and dry runs

mod memory;
mod smtp;
mod types;

pub use memory::{MemoryTransport, SentEmail};
pub use smtp::SmtpTransport;
pub use types::{InlineImage, MailError, MailResult, OutgoingEmail};

use std::sync::Arc;

use async_trait::async_trait;
use lettre::Address;

use crate::config::SmtpConfig;

/// Delivers rendered emails
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Send a message; returns its message id
    async fn send(&self, email: OutgoingEmail) -> MailResult<String>;

    /// Whether the transport can currently reach its relay
    async fn verify(&self) -> bool;

    /// Short transport name for logs and health output
    fn name(&self) -> &'static str;
}

/// Build the transport selected by `smtp.transport`
pub fn create_transport(
    config: &SmtpConfig,
    logo: Option<InlineImage>,
) -> MailResult<Arc<dyn MailTransport>> {
    match config.transport.as_str() {
        "smtp" => Ok(Arc::new(SmtpTransport::new(config, logo)?)),
        "memory" => {
            tracing::warn!("Using in-memory mail transport, emails will not be delivered");
            Ok(Arc::new(MemoryTransport::new()))
        }
        other => Err(MailError::Config(format!("unknown transport: {}", other))),
    }
}

/// Whether `email` is a syntactically valid bare address (`user@domain`)
pub fn is_valid_email(email: &str) -> bool {
    email.parse::<Address>().is_ok()
}
