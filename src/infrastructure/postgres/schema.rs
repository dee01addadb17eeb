//! Idempotent schema bootstrap.

use sqlx::PgPool;

use super::PostgresPoolError;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS emails (
        id         BIGSERIAL PRIMARY KEY,
        to_addr    TEXT NOT NULL,
        subject    TEXT NOT NULL,
        body       TEXT NOT NULL,
        status     TEXT NOT NULL,
        error      TEXT,
        created_at TIMESTAMPTZ NOT NULL,
        sent_at    TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_emails_status_created ON emails (status, created_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS templates (
        id          BIGSERIAL PRIMARY KEY,
        tpl_key     TEXT NOT NULL UNIQUE,
        name        TEXT NOT NULL,
        description TEXT,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS template_versions (
        id          BIGSERIAL PRIMARY KEY,
        template_id BIGINT NOT NULL REFERENCES templates(id),
        version     INT  NOT NULL,
        locale      TEXT NOT NULL DEFAULT 'es-GT',
        subject     TEXT NOT NULL,
        body_html   TEXT,
        body_text   TEXT,
        is_active   BOOLEAN NOT NULL DEFAULT FALSE,
        created_at  TIMESTAMPTZ NOT NULL,
        UNIQUE (template_id, version, locale)
    )
    "#,
    // At most one active version per (template, locale)
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS uq_template_versions_active
        ON template_versions (template_id, locale)
        WHERE is_active
    "#,
];

pub async fn ensure_schema(pool: &PgPool) -> Result<(), PostgresPoolError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| PostgresPoolError::Schema(e.to_string()))?;
    }

    tracing::debug!(statements = SCHEMA.len(), "PostgreSQL schema ensured");
    Ok(())
}
