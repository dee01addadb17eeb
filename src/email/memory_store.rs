//! In-memory email record store using DashMap.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::store::{EmailStore, StoreResult};
use super::types::{ConditionalChange, EmailFilter, EmailRecord, EmailStatus, NewEmail, StatusUpdate};

pub struct MemoryEmailStore {
    records: DashMap<i64, EmailRecord>,
    next_id: AtomicI64,
}

impl Default for MemoryEmailStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEmailStore {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl EmailStore for MemoryEmailStore {
    async fn insert(&self, email: NewEmail) -> StoreResult<EmailRecord> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = EmailRecord {
            id,
            to: email.content.to,
            subject: email.content.subject,
            body: email.content.body,
            status: email.status,
            error: None,
            created_at: Utc::now(),
            sent_at: None,
        };
        self.records.insert(id, record.clone());
        Ok(record)
    }

    async fn update_status(&self, id: i64, update: StatusUpdate) -> StoreResult<bool> {
        let Some(mut record) = self.records.get_mut(&id) else {
            return Ok(false);
        };

        match update {
            StatusUpdate::Sent { sent_at } => {
                record.status = EmailStatus::Sent;
                record.sent_at = Some(sent_at);
                record.error = None;
            }
            StatusUpdate::Failed { error } => {
                record.status = EmailStatus::Failed;
                record.error = Some(error);
                record.sent_at = None;
            }
        }
        Ok(true)
    }

    async fn update_if_status(
        &self,
        id: i64,
        expected: EmailStatus,
        change: ConditionalChange,
    ) -> StoreResult<Option<EmailRecord>> {
        let Some(mut record) = self.records.get_mut(&id) else {
            return Ok(None);
        };
        if record.status != expected {
            return Ok(None);
        }

        if let Some(content) = change.content {
            record.to = content.to;
            record.subject = content.subject;
            record.body = content.body;
        }
        if let Some(status) = change.status {
            record.status = status;
        }
        Ok(Some(record.clone()))
    }

    async fn get(&self, id: i64) -> StoreResult<Option<EmailRecord>> {
        Ok(self.records.get(&id).map(|r| r.clone()))
    }

    async fn list(&self, filter: &EmailFilter) -> StoreResult<Vec<EmailRecord>> {
        let mut records: Vec<EmailRecord> = self
            .records
            .iter()
            .filter(|r| filter.status.map_or(true, |s| r.status == s))
            .map(|r| r.clone())
            .collect();

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(records
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit() as usize)
            .collect())
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        Ok(self.records.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::email::EmailContent;

    fn new_email(status: EmailStatus) -> NewEmail {
        NewEmail {
            content: EmailContent {
                to: "ana@example.com".to_string(),
                subject: "Hi".to_string(),
                body: "<p>Hi</p>".to_string(),
            },
            status,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let store = MemoryEmailStore::new();
        let a = store.insert(new_email(EmailStatus::Queued)).await.unwrap();
        let b = store.insert(new_email(EmailStatus::Draft)).await.unwrap();

        assert!(b.id > a.id);
        assert_eq!(a.status, EmailStatus::Queued);
        assert!(a.sent_at.is_none() && a.error.is_none());
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_update_status_sets_matching_fields() {
        let store = MemoryEmailStore::new();
        let sent = store.insert(new_email(EmailStatus::Queued)).await.unwrap();
        let failed = store.insert(new_email(EmailStatus::Queued)).await.unwrap();

        assert!(store
            .update_status(sent.id, StatusUpdate::Sent { sent_at: Utc::now() })
            .await
            .unwrap());
        assert!(store
            .update_status(failed.id, StatusUpdate::Failed { error: "boom".into() })
            .await
            .unwrap());
        assert!(!store
            .update_status(999, StatusUpdate::Failed { error: "x".into() })
            .await
            .unwrap());

        let sent = store.get(sent.id).await.unwrap().unwrap();
        assert_eq!(sent.status, EmailStatus::Sent);
        assert!(sent.sent_at.is_some() && sent.error.is_none());

        let failed = store.get(failed.id).await.unwrap().unwrap();
        assert_eq!(failed.status, EmailStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some("boom"));
        assert!(failed.sent_at.is_none());
    }

    #[tokio::test]
    async fn test_conditional_update_only_applies_in_expected_status() {
        let store = MemoryEmailStore::new();
        let draft = store.insert(new_email(EmailStatus::Draft)).await.unwrap();

        let edited = EmailContent {
            to: "bob@example.com".to_string(),
            subject: "Edited".to_string(),
            body: "new".to_string(),
        };
        let updated = store
            .update_if_status(draft.id, EmailStatus::Draft, ConditionalChange::content(edited.clone()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.to, "bob@example.com");

        store
            .update_if_status(draft.id, EmailStatus::Draft, ConditionalChange::status(EmailStatus::Queued))
            .await
            .unwrap()
            .unwrap();

        let applied = store
            .update_if_status(draft.id, EmailStatus::Draft, ConditionalChange::content(edited))
            .await
            .unwrap();
        assert!(applied.is_none());
        assert!(store
            .update_if_status(999, EmailStatus::Draft, ConditionalChange::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_concurrent_promotion_has_one_winner() {
        let store = Arc::new(MemoryEmailStore::new());
        let id = store.insert(new_email(EmailStatus::Draft)).await.unwrap().id;

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .update_if_status(
                            id,
                            EmailStatus::Draft,
                            ConditionalChange::status(EmailStatus::Queued),
                        )
                        .await
                        .unwrap()
                        .is_some()
                })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_list_filters_and_paginates_newest_first() {
        let store = MemoryEmailStore::new();
        for _ in 0..5 {
            store.insert(new_email(EmailStatus::Queued)).await.unwrap();
        }
        store.insert(new_email(EmailStatus::Draft)).await.unwrap();

        let drafts = store
            .list(&EmailFilter {
                status: Some(EmailStatus::Draft),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);

        let page = store
            .list(&EmailFilter {
                status: Some(EmailStatus::Queued),
                limit: Some(2),
                offset: Some(1),
            })
            .await
            .unwrap();
        let ids: Vec<i64> = page.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![4, 3]);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryEmailStore::new();
        let record = store.insert(new_email(EmailStatus::Queued)).await.unwrap();

        assert!(store.delete(record.id).await.unwrap());
        assert!(!store.delete(record.id).await.unwrap());
        assert!(store.get(record.id).await.unwrap().is_none());
        assert!(store.is_empty());
    }
}
