//! PostgreSQL-based email record store.
//!
//! Records live in the `emails` table; conditional updates are single
//! `UPDATE ... WHERE status = $n` statements so check and write are atomic.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::store::{EmailStore, StoreResult};
use super::types::{ConditionalChange, EmailFilter, EmailRecord, EmailStatus, NewEmail, StatusUpdate};

const EMAIL_COLUMNS: &str = "id, to_addr, subject, body, status, error, created_at, sent_at";

pub struct PostgresEmailStore {
    pool: PgPool,
}

impl PostgresEmailStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmailStore for PostgresEmailStore {
    async fn insert(&self, email: NewEmail) -> StoreResult<EmailRecord> {
        let record = sqlx::query_as(&format!(
            "INSERT INTO emails (to_addr, subject, body, status, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) \
             RETURNING {EMAIL_COLUMNS}"
        ))
        .bind(&email.content.to)
        .bind(&email.content.subject)
        .bind(&email.content.body)
        .bind(email.status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn update_status(&self, id: i64, update: StatusUpdate) -> StoreResult<bool> {
        let result = match update {
            StatusUpdate::Sent { sent_at } => {
                sqlx::query(
                    "UPDATE emails SET status = 'sent', sent_at = $1, error = NULL WHERE id = $2",
                )
                .bind(sent_at)
                .bind(id)
                .execute(&self.pool)
                .await?
            }
            StatusUpdate::Failed { error } => {
                sqlx::query(
                    "UPDATE emails SET status = 'failed', error = $1, sent_at = NULL WHERE id = $2",
                )
                .bind(error)
                .bind(id)
                .execute(&self.pool)
                .await?
            }
        };

        Ok(result.rows_affected() == 1)
    }

    async fn update_if_status(
        &self,
        id: i64,
        expected: EmailStatus,
        change: ConditionalChange,
    ) -> StoreResult<Option<EmailRecord>> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE emails SET id = id");

        if let Some(content) = change.content {
            query
                .push(", to_addr = ")
                .push_bind(content.to)
                .push(", subject = ")
                .push_bind(content.subject)
                .push(", body = ")
                .push_bind(content.body);
        }
        if let Some(status) = change.status {
            query.push(", status = ").push_bind(status.as_str());
        }

        query
            .push(" WHERE id = ")
            .push_bind(id)
            .push(" AND status = ")
            .push_bind(expected.as_str())
            .push(" RETURNING ")
            .push(EMAIL_COLUMNS);

        let record = query
            .build_query_as::<EmailRecord>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn get(&self, id: i64) -> StoreResult<Option<EmailRecord>> {
        let record = sqlx::query_as(&format!("SELECT {EMAIL_COLUMNS} FROM emails WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn list(&self, filter: &EmailFilter) -> StoreResult<Vec<EmailRecord>> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {EMAIL_COLUMNS} FROM emails"));

        if let Some(status) = filter.status {
            query.push(" WHERE status = ").push_bind(status.as_str());
        }

        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(filter.limit())
            .push(" OFFSET ")
            .push_bind(filter.offset());

        let records = query
            .build_query_as::<EmailRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM emails WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
