//! In-memory mail transport

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use uuid::Uuid;

use super::types::{MailError, MailResult, OutgoingEmail};
use super::MailTransport;

/// A message accepted by [`MemoryTransport`]
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub message_id: String,
    pub email: OutgoingEmail,
}

/// Records messages instead of delivering them.
///
/// Used when `smtp.transport = "memory"` and in tests. A transport built
/// with [`MemoryTransport::failing`] rejects every message.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    sent: Mutex<Vec<SentEmail>>,
    failure: Option<String>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport whose every send fails with `reason`
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failure: Some(reason.into()),
        }
    }

    /// Snapshot of the accepted messages, oldest first
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MailTransport for MemoryTransport {
    async fn send(&self, email: OutgoingEmail) -> MailResult<String> {
        if let Some(reason) = &self.failure {
            return Err(MailError::Send(reason.clone()));
        }

        let message_id = format!("<{}@memory>", Uuid::new_v4());
        tracing::debug!(
            message_id = %message_id,
            subject = %email.subject,
            recipients = email.recipient_count(),
            "Email recorded in memory"
        );

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(SentEmail {
                message_id: message_id.clone(),
                email,
            });

        Ok(message_id)
    }

    async fn verify(&self) -> bool {
        self.failure.is_none()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
