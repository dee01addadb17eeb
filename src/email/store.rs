//! Backend trait for durable email records.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{ConditionalChange, EmailFilter, EmailRecord, EmailStatus, NewEmail, StatusUpdate};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage for email lifecycle records.
///
/// Ids are generated by the store and increase monotonically.
#[async_trait]
pub trait EmailStore: Send + Sync {
    /// Insert a new record and return it with its generated id.
    async fn insert(&self, email: NewEmail) -> StoreResult<EmailRecord>;

    /// Record the outcome of a delivery attempt. Returns `false` if the id is unknown.
    async fn update_status(&self, id: i64, update: StatusUpdate) -> StoreResult<bool>;

    /// Apply `change` only if the record is currently in `expected` status.
    ///
    /// Returns the updated record, or `None` when nothing was applied
    /// (unknown id or status mismatch). The check and the write are atomic.
    async fn update_if_status(
        &self,
        id: i64,
        expected: EmailStatus,
        change: ConditionalChange,
    ) -> StoreResult<Option<EmailRecord>>;

    async fn get(&self, id: i64) -> StoreResult<Option<EmailRecord>>;

    /// Records matching the filter, newest first.
    async fn list(&self, filter: &EmailFilter) -> StoreResult<Vec<EmailRecord>>;

    /// Returns `false` if the id is unknown.
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}
