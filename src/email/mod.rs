//! Durable email lifecycle records.
//!
//! Every delivery request produces one `EmailRecord`, written before any
//! transport call and reconciled with the outcome afterwards. Two backends
//! implement `EmailStore`:
//!
//! - `MemoryEmailStore`: DashMap storage (default, lost on restart)
//! - `PostgresEmailStore`: the `emails` table

mod address;
mod memory_store;
mod postgres_store;
mod store;
mod types;

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorageConfig;

pub use address::is_plausible_address;
pub use memory_store::MemoryEmailStore;
pub use postgres_store::PostgresEmailStore;
pub use store::{EmailStore, StoreError, StoreResult};
pub use types::{
    ConditionalChange, EmailContent, EmailFilter, EmailRecord, EmailStatus, NewEmail,
    ParseStatusError, StatusUpdate, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT,
};

/// Create an email store based on the configured storage backend.
pub fn create_email_store(storage: &StorageConfig, pool: Option<PgPool>) -> Arc<dyn EmailStore> {
    match (storage.backend.as_str(), pool) {
        ("postgres", Some(pool)) => {
            tracing::info!(backend = "postgres", "Creating PostgreSQL email store");
            Arc::new(PostgresEmailStore::new(pool))
        }
        ("postgres", None) => {
            tracing::warn!(
                "PostgreSQL backend requested but no pool provided, falling back to memory"
            );
            Arc::new(MemoryEmailStore::new())
        }
        (backend, _) => {
            tracing::info!(backend = %backend, "Creating in-memory email store");
            Arc::new(MemoryEmailStore::new())
        }
    }
}
