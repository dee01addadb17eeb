//! Email record types and lifecycle status.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default page size for record listings
pub const DEFAULT_LIST_LIMIT: i64 = 50;
/// Upper bound on a single listing page
pub const MAX_LIST_LIMIT: i64 = 500;

/// Lifecycle status of an email record.
///
/// Transitions only move forward: `draft -> queued -> sent | failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    Draft,
    Queued,
    Sent,
    Failed,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Draft => "draft",
            EmailStatus::Queued => "queued",
            EmailStatus::Sent => "sent",
            EmailStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown email status: {0}")]
pub struct ParseStatusError(String);

impl FromStr for EmailStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" => Ok(EmailStatus::Draft),
            "queued" => Ok(EmailStatus::Queued),
            "sent" => Ok(EmailStatus::Sent),
            "failed" => Ok(EmailStatus::Failed),
            _ => Err(ParseStatusError(s.to_string())),
        }
    }
}

impl TryFrom<String> for EmailStatus {
    type Error = ParseStatusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Durable record of one logical email.
#[derive(Debug, Clone, Serialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecord {
    pub id: i64,
    #[sqlx(rename = "to_addr")]
    pub to: String,
    pub subject: String,
    pub body: String,
    #[sqlx(try_from = "String")]
    pub status: EmailStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

/// Recipient and content of an email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// A record about to be inserted; only `draft` and `queued` are valid initial states.
#[derive(Debug, Clone)]
pub struct NewEmail {
    pub content: EmailContent,
    pub status: EmailStatus,
}

/// Unconditional status write following a delivery attempt.
///
/// Each variant carries exactly the fields its status requires, so a record
/// can never be `sent` without `sent_at` or `failed` without an error.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    Sent { sent_at: DateTime<Utc> },
    Failed { error: String },
}

impl StatusUpdate {
    pub fn status(&self) -> EmailStatus {
        match self {
            StatusUpdate::Sent { .. } => EmailStatus::Sent,
            StatusUpdate::Failed { .. } => EmailStatus::Failed,
        }
    }
}

/// Change applied only while a record is still in an expected status.
#[derive(Debug, Clone, Default)]
pub struct ConditionalChange {
    pub content: Option<EmailContent>,
    pub status: Option<EmailStatus>,
}

impl ConditionalChange {
    pub fn content(content: EmailContent) -> Self {
        Self {
            content: Some(content),
            status: None,
        }
    }

    pub fn status(status: EmailStatus) -> Self {
        Self {
            content: None,
            status: Some(status),
        }
    }
}

/// Listing filter; newest records first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailFilter {
    #[serde(default)]
    pub status: Option<EmailStatus>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl EmailFilter {
    pub fn limit(&self) -> i64 {
        match self.limit {
            Some(l) if l > 0 => l.min(MAX_LIST_LIMIT),
            _ => DEFAULT_LIST_LIMIT,
        }
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
