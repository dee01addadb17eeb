//! PostgreSQL persistence module.
//!
//! Provides connection pooling and schema bootstrap for the PostgreSQL backend.

pub mod pool;
mod schema;

pub use pool::{mask_database_url, PostgresPool, PostgresPoolError};
pub use schema::ensure_schema;
