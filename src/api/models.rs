//! Request and response bodies for the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::delivery::{BodyFormat, DeliveryReceipt};
use crate::email::EmailStatus;
use crate::template::TemplateData;

/// Body of `POST /send` and `POST /drafts`
#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    /// `html` (default) or `text`
    #[serde(default)]
    pub format: BodyFormat,
}

/// Body of `POST /send-from-template`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSendRequest {
    #[serde(default)]
    pub template_key: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub data: TemplateData,
}

/// Body of `POST /templates`
#[derive(Debug, Clone, Deserialize)]
pub struct EnsureTemplateRequest {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `PUT /templates/activate`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateVersionRequest {
    #[serde(alias = "key")]
    pub template_key: String,
    pub version: i32,
    #[serde(default)]
    pub locale: Option<String>,
}

/// Query string of `GET /emails`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListEmailsQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

/// Success envelope shared by the mutating endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EmailStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
}

impl ActionResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            id: None,
            status: None,
            sent_at: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn delivered(message: impl Into<String>, receipt: DeliveryReceipt) -> Self {
        Self {
            success: true,
            message: message.into(),
            id: Some(receipt.id),
            status: Some(receipt.status),
            sent_at: receipt.sent_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(items: Vec<T>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}
