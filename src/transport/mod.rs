//! Outbound mail transport.
//!
//! `MailTransport` is the seam between delivery logic and the wire:
//! `SmtpMailTransport` speaks SMTP through lettre, tests plug in stubs.
//! `Mailer` wraps any transport with a hard per-call time budget.

mod mailer;
mod message;
mod smtp;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use mailer::Mailer;
pub use message::build_message;
pub use smtp::SmtpMailTransport;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("SMTP credentials not configured")]
    MissingCredentials,

    #[error("No sender address configured")]
    MissingSender,

    #[error("Invalid address `{address}`: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    Message(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("delivery timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Delivery task aborted: {0}")]
    Aborted(String),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

/// A fully rendered email ready to hand to a transport.
///
/// At least one of `text` / `html` is expected; with both the message is
/// sent as `multipart/alternative`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text: Option<String>,
    pub html: Option<String>,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one email. Completes only once the server accepted or rejected it.
    async fn send(&self, email: &OutgoingEmail) -> Result<(), TransportError>;
}
