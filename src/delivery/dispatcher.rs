use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::email::{
    is_plausible_address, ConditionalChange, EmailContent, EmailFilter, EmailRecord, EmailStatus,
    EmailStore, NewEmail, StatusUpdate,
};
use crate::metrics::{DeliveryMetrics, TemplateMetrics};
use crate::template::{Renderer, TemplateData, TemplateError, TemplateStore};
use crate::transport::{Mailer, OutgoingEmail};

use super::DispatchError;

/// Outcome of a successful delivery
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReceipt {
    pub id: i64,
    pub status: EmailStatus,
    pub sent_at: Option<DateTime<Utc>>,
}

/// How a literal body is delivered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    #[default]
    Html,
    Text,
}

/// A send rendered from the active version of a template
#[derive(Debug, Clone, Default)]
pub struct TemplateSend {
    pub template_key: String,
    pub locale: Option<String>,
    pub to: String,
    pub data: TemplateData,
}

/// Statistics for the email dispatcher
#[derive(Debug, Default)]
pub struct DispatcherStats {
    /// Records created in `queued` status
    pub total_accepted: AtomicU64,
    pub total_sent: AtomicU64,
    pub total_failed: AtomicU64,
    pub drafts_created: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            total_accepted: self.total_accepted.load(Ordering::Relaxed),
            total_sent: self.total_sent.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
            drafts_created: self.drafts_created.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Serialize)]
pub struct DispatcherStatsSnapshot {
    pub total_accepted: u64,
    pub total_sent: u64,
    pub total_failed: u64,
    pub drafts_created: u64,
}

/// Coordinates the email lifecycle.
///
/// Every send resolves its content first, writes a `queued` record, calls
/// the transport under the mailer's timeout and then moves the record to
/// `sent` or `failed`. Nothing is retried.
pub struct EmailDispatcher {
    emails: Arc<dyn EmailStore>,
    templates: Arc<dyn TemplateStore>,
    renderer: Renderer,
    mailer: Mailer,
    stats: DispatcherStats,
}

impl EmailDispatcher {
    pub fn new(
        emails: Arc<dyn EmailStore>,
        templates: Arc<dyn TemplateStore>,
        renderer: Renderer,
        mailer: Mailer,
    ) -> Self {
        Self {
            emails,
            templates,
            renderer,
            mailer,
            stats: DispatcherStats::default(),
        }
    }

    pub fn stats(&self) -> DispatcherStatsSnapshot {
        self.stats.snapshot()
    }

    /// Send literal content.
    #[tracing::instrument(name = "dispatch.send_email", skip(self, subject, body))]
    pub async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        format: BodyFormat,
    ) -> Result<DeliveryReceipt, DispatchError> {
        let content = validate_content(to, subject, body)?;
        let outgoing = literal_outgoing(&content, format);

        let record = self.accept(content, EmailStatus::Queued, "direct").await?;
        self.deliver(record.id, outgoing).await
    }

    /// Render the active version of a template and send it.
    #[tracing::instrument(
        name = "dispatch.send_from_template",
        skip(self, request),
        fields(template_key = %request.template_key, locale = ?request.locale)
    )]
    pub async fn send_from_template(
        &self,
        request: TemplateSend,
    ) -> Result<DeliveryReceipt, DispatchError> {
        let template_key = request.template_key.trim();
        if template_key.is_empty() {
            return Err(DispatchError::Validation("templateKey is required".to_string()));
        }
        let to = validate_recipient(&request.to)?;

        let version = self
            .templates
            .get_active_version(template_key, request.locale.as_deref())
            .await
            .map_err(|e| match e {
                TemplateError::Storage(_) => DispatchError::Template(e),
                other => DispatchError::TemplateUnavailable(other),
            })?;

        let rendered = self
            .renderer
            .render_version(&version, &request.data)
            .map_err(|e| {
                TemplateMetrics::record_render_failure();
                tracing::warn!(
                    template_key = %template_key,
                    version = version.version,
                    locale = %version.locale,
                    error = %e,
                    "Template render failed"
                );
                DispatchError::TemplateUnavailable(e)
            })?;

        let body = rendered
            .persisted_body()
            .ok_or_else(|| DispatchError::Validation("rendered template has no body".to_string()))?
            .to_string();

        let outgoing = OutgoingEmail {
            to: to.clone(),
            subject: rendered.subject.clone(),
            text: rendered.body_text.filter(|b| !b.is_empty()),
            html: rendered.body_html.filter(|b| !b.is_empty()),
        };
        let content = EmailContent {
            to,
            subject: rendered.subject,
            body,
        };

        let record = self.accept(content, EmailStatus::Queued, "template").await?;
        tracing::debug!(
            email_id = record.id,
            template_key = %template_key,
            version = version.version,
            locale = %version.locale,
            "Rendered template for delivery"
        );
        self.deliver(record.id, outgoing).await
    }

    /// Save content as a draft; nothing is sent.
    pub async fn create_draft(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<i64, DispatchError> {
        let content = validate_content(to, subject, body)?;
        let record = self.accept(content, EmailStatus::Draft, "draft").await?;
        self.stats.drafts_created.fetch_add(1, Ordering::Relaxed);
        Ok(record.id)
    }

    /// Replace the content of a draft.
    ///
    /// Returns `false` without changing anything when the record does not
    /// exist or has already left `draft`.
    pub async fn update_draft(
        &self,
        id: i64,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<bool, DispatchError> {
        let content = validate_content(to, subject, body)?;
        let updated = self
            .emails
            .update_if_status(id, EmailStatus::Draft, ConditionalChange::content(content))
            .await?;

        tracing::debug!(email_id = id, applied = updated.is_some(), "Draft update");
        Ok(updated.is_some())
    }

    /// Promote a draft to `queued` and deliver its stored content as HTML.
    ///
    /// Only one caller can promote a given draft; the others get `NotDraft`.
    #[tracing::instrument(name = "dispatch.send_draft", skip(self))]
    pub async fn send_draft(&self, id: i64) -> Result<DeliveryReceipt, DispatchError> {
        let promoted = self
            .emails
            .update_if_status(id, EmailStatus::Draft, ConditionalChange::status(EmailStatus::Queued))
            .await?;

        let record = match promoted {
            Some(record) => record,
            None => {
                return Err(match self.emails.get(id).await? {
                    Some(_) => DispatchError::NotDraft(id),
                    None => DispatchError::NotFound(id),
                })
            }
        };

        self.stats.total_accepted.fetch_add(1, Ordering::Relaxed);
        tracing::info!(email_id = id, "Draft promoted to queued");

        let content = EmailContent {
            to: record.to,
            subject: record.subject,
            body: record.body,
        };
        self.deliver(id, literal_outgoing(&content, BodyFormat::Html)).await
    }

    pub async fn get_email(&self, id: i64) -> Result<EmailRecord, DispatchError> {
        self.emails
            .get(id)
            .await?
            .ok_or(DispatchError::NotFound(id))
    }

    pub async fn list_emails(&self, filter: &EmailFilter) -> Result<Vec<EmailRecord>, DispatchError> {
        Ok(self.emails.list(filter).await?)
    }

    /// Remove a record; returns `false` if it did not exist.
    pub async fn delete_email(&self, id: i64) -> Result<bool, DispatchError> {
        let deleted = self.emails.delete(id).await?;
        if deleted {
            tracing::info!(email_id = id, "Email record deleted");
        }
        Ok(deleted)
    }

    /// Write the initial record. Must complete before any transport call.
    async fn accept(
        &self,
        content: EmailContent,
        status: EmailStatus,
        source: &str,
    ) -> Result<EmailRecord, DispatchError> {
        let record = self.emails.insert(NewEmail { content, status }).await?;

        DeliveryMetrics::record_accepted(source);
        if status == EmailStatus::Queued {
            self.stats.total_accepted.fetch_add(1, Ordering::Relaxed);
        }
        tracing::info!(email_id = record.id, status = %status, source, "Email recorded");

        Ok(record)
    }

    /// Run the bounded transport call and reconcile the record with its outcome.
    async fn deliver(&self, id: i64, email: OutgoingEmail) -> Result<DeliveryReceipt, DispatchError> {
        let started = Instant::now();
        let outcome = self.mailer.send(email).await;
        let elapsed = started.elapsed().as_secs_f64();

        match outcome {
            Ok(()) => {
                let sent_at = Utc::now();
                self.write_status(id, StatusUpdate::Sent { sent_at }, None).await?;

                DeliveryMetrics::record_sent(elapsed);
                self.stats.total_sent.fetch_add(1, Ordering::Relaxed);
                tracing::info!(email_id = id, status = "sent", elapsed_secs = elapsed, "Email delivered");

                Ok(DeliveryReceipt {
                    id,
                    status: EmailStatus::Sent,
                    sent_at: Some(sent_at),
                })
            }
            Err(err) => {
                let reason = err.to_string();
                let label = if err.is_timeout() { "timeout" } else { "transport" };

                DeliveryMetrics::record_failed(label, elapsed);
                self.stats.total_failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    email_id = id,
                    status = "failed",
                    reason = label,
                    error = %reason,
                    "Email delivery failed"
                );

                self.write_status(id, StatusUpdate::Failed { error: reason.clone() }, Some(reason))
                    .await?;
                Err(DispatchError::Delivery { id, source: err })
            }
        }
    }

    /// Best-effort terminal status write; a failure is reported with the delivery outcome.
    async fn write_status(
        &self,
        id: i64,
        update: StatusUpdate,
        delivery_error: Option<String>,
    ) -> Result<(), DispatchError> {
        let status = update.status();
        match self.emails.update_status(id, update).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::warn!(email_id = id, status = %status, "Email record vanished before status update");
                Ok(())
            }
            Err(source) => {
                DeliveryMetrics::record_status_update_failure();
                tracing::error!(
                    email_id = id,
                    status = %status,
                    error = %source,
                    "Failed to record delivery outcome"
                );
                Err(DispatchError::StatusUpdateFailed {
                    id,
                    delivery_error,
                    source,
                })
            }
        }
    }
}

fn validate_recipient(to: &str) -> Result<String, DispatchError> {
    let to = to.trim();
    if to.is_empty() {
        return Err(DispatchError::Validation("to is required".to_string()));
    }
    if !is_plausible_address(to) {
        return Err(DispatchError::Validation(format!("invalid recipient address: {to}")));
    }
    Ok(to.to_string())
}

fn validate_content(to: &str, subject: &str, body: &str) -> Result<EmailContent, DispatchError> {
    let to = validate_recipient(to)?;
    if subject.trim().is_empty() {
        return Err(DispatchError::Validation("subject is required".to_string()));
    }
    if body.trim().is_empty() {
        return Err(DispatchError::Validation("body is required".to_string()));
    }

    Ok(EmailContent {
        to,
        subject: subject.to_string(),
        body: body.to_string(),
    })
}

fn literal_outgoing(content: &EmailContent, format: BodyFormat) -> OutgoingEmail {
    let (text, html) = match format {
        BodyFormat::Html => (None, Some(content.body.clone())),
        BodyFormat::Text => (Some(content.body.clone()), None),
    };
    OutgoingEmail {
        to: content.to.clone(),
        subject: content.subject.clone(),
        text,
        html,
    }
}
