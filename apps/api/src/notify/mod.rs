//! Notification sender: composes HTML+text emails and hands them to a
//! `MailTransport`.
//!
//! Email is a best-effort side channel: callers persist first and only use
//! the returned `Result` to pick a user-facing status.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::forms::{ContactMessage, Enrollment};

pub mod compose;
pub mod smtp;

pub use compose::QuizReport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub subject: String,
    pub text_body: String,
    pub html_body: Option<String>,
    pub from: String,
    pub to: Vec<String>,
    pub reply_to: Option<String>,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Invalid email address: {0}")]
    Address(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("SMTP error: {0}")]
    Transport(String),

    #[error("No mail transport configured")]
    NotConfigured,
}

/// Delivers a batch of messages. Either every message is handed off or the
/// call fails.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send_batch(&self, messages: &[OutgoingEmail]) -> Result<(), MailError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    Sent,
    /// Delivery is switched off; nothing was transmitted.
    Skipped,
}

#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn MailTransport>,
    delivery_enabled: bool,
    from_address: String,
}

impl Notifier {
    /// `from_address` doubles as the operator inbox.
    pub fn new(
        transport: Arc<dyn MailTransport>,
        delivery_enabled: bool,
        from_address: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            delivery_enabled,
            from_address: from_address.into(),
        }
    }

    pub fn delivery_enabled(&self) -> bool {
        self.delivery_enabled
    }

    /// Quiz results for the submitter plus a copy for the operator.
    pub async fn send_quiz_report(&self, report: &QuizReport<'_>) -> Result<Delivery, MailError> {
        let messages = compose::quiz_report_emails(report, &self.from_address);
        self.dispatch("quiz report", &messages).await
    }

    /// Enrollment confirmation for the user plus a copy for the operator.
    pub async fn send_enrollment(&self, enrollment: &Enrollment) -> Result<Delivery, MailError> {
        let messages = compose::enrollment_emails(enrollment, &self.from_address);
        self.dispatch("enrollment", &messages).await
    }

    pub async fn send_contact(&self, message: &ContactMessage) -> Result<Delivery, MailError> {
        let messages = [compose::contact_email(message, &self.from_address)];
        self.dispatch("contact", &messages).await
    }

    async fn dispatch(&self, kind: &str, messages: &[OutgoingEmail]) -> Result<Delivery, MailError> {
        if !self.delivery_enabled {
            info!("Email delivery disabled; skipping {kind} notification");
            return Ok(Delivery::Skipped);
        }

        match self.transport.send_batch(messages).await {
            Ok(()) => {
                info!("Sent {kind} notification ({} messages)", messages.len());
                Ok(Delivery::Sent)
            }
            Err(e) => {
                error!("Failed to send {kind} notification: {e}");
                Err(e)
            }
        }
    }
}
