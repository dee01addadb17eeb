//! PostgreSQL-based template store.
//!
//! Templates live in `templates` (unique `tpl_key`) and their revisions in
//! `template_versions`. Version allocation and activation lock the parent
//! template row, so concurrent writers for one key are serialized.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::store::{TemplateStore, TemplateStoreConfig};
use super::types::{NewTemplateVersion, Template, TemplateError, TemplateResult, TemplateVersion};

const VERSION_COLUMNS: &str = "v.template_id, v.version, v.locale, v.subject, v.body_html, \
                               v.body_text, v.is_active, v.created_at";

pub struct PostgresTemplateStore {
    pool: PgPool,
    config: TemplateStoreConfig,
}

impl PostgresTemplateStore {
    pub fn new(pool: PgPool, config: TemplateStoreConfig) -> Self {
        Self { pool, config }
    }

    /// Lock the template row for the rest of the transaction.
    async fn lock_template(
        tx: &mut Transaction<'_, Postgres>,
        key: &str,
    ) -> TemplateResult<Option<i64>> {
        let id: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM templates WHERE tpl_key = $1 FOR UPDATE")
                .bind(key)
                .fetch_optional(&mut **tx)
                .await?;
        Ok(id.map(|(id,)| id))
    }

    async fn set_active(
        tx: &mut Transaction<'_, Postgres>,
        template_id: i64,
        version: i32,
        locale: &str,
    ) -> TemplateResult<()> {
        sqlx::query(
            "UPDATE template_versions SET is_active = FALSE \
             WHERE template_id = $1 AND locale = $2 AND is_active",
        )
        .bind(template_id)
        .bind(locale)
        .execute(&mut **tx)
        .await?;

        sqlx::query(
            "UPDATE template_versions SET is_active = TRUE \
             WHERE template_id = $1 AND version = $2 AND locale = $3",
        )
        .bind(template_id)
        .bind(version)
        .bind(locale)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl TemplateStore for PostgresTemplateStore {
    async fn ensure_template(
        &self,
        key: &str,
        name: &str,
        description: Option<&str>,
    ) -> TemplateResult<i64> {
        let key = key.trim();
        if key.is_empty() {
            return Err(TemplateError::Invalid("template key is required".to_string()));
        }

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO templates (tpl_key, name, description, created_at, updated_at)
            VALUES ($1, $2, $3, NOW(), NOW())
            ON CONFLICT (tpl_key) DO UPDATE
               SET name = EXCLUDED.name,
                   description = EXCLUDED.description,
                   updated_at = EXCLUDED.updated_at
            RETURNING id
            "#,
        )
        .bind(key)
        .bind(name)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn add_version(&self, version: NewTemplateVersion) -> TemplateResult<TemplateVersion> {
        let version = version.normalize(&self.config.default_locale)?;
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO templates (tpl_key, name, created_at, updated_at)
            VALUES ($1, $1, NOW(), NOW())
            ON CONFLICT (tpl_key) DO NOTHING
            "#,
        )
        .bind(&version.key)
        .execute(&mut *tx)
        .await?;

        let template_id = Self::lock_template(&mut tx, &version.key)
            .await?
            .ok_or_else(|| TemplateError::NotFound(version.key.clone()))?;

        let (next,): (i32,) = sqlx::query_as(
            "SELECT COALESCE(MAX(version), 0) + 1 FROM template_versions \
             WHERE template_id = $1 AND locale = $2",
        )
        .bind(template_id)
        .bind(&version.locale)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO template_versions
                (template_id, version, locale, subject, body_html, body_text, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, NOW())
            "#,
        )
        .bind(template_id)
        .bind(next)
        .bind(&version.locale)
        .bind(&version.subject)
        .bind(&version.body_html)
        .bind(&version.body_text)
        .execute(&mut *tx)
        .await?;

        if version.activate {
            Self::set_active(&mut tx, template_id, next, &version.locale).await?;
        }

        let created: TemplateVersion = sqlx::query_as(&format!(
            "SELECT {VERSION_COLUMNS} FROM template_versions v \
             WHERE v.template_id = $1 AND v.version = $2 AND v.locale = $3"
        ))
        .bind(template_id)
        .bind(next)
        .bind(&version.locale)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            template_key = %version.key,
            locale = %version.locale,
            version = next,
            activated = version.activate,
            "Template version added"
        );

        Ok(created)
    }

    async fn activate_version(&self, key: &str, version: i32, locale: &str) -> TemplateResult<()> {
        let locale = self.config.locale_or_default(Some(locale)).to_string();
        let mut tx = self.pool.begin().await?;

        let template_id = Self::lock_template(&mut tx, key)
            .await?
            .ok_or_else(|| TemplateError::NotFound(key.to_string()))?;

        let exists: Option<(i32,)> = sqlx::query_as(
            "SELECT version FROM template_versions \
             WHERE template_id = $1 AND version = $2 AND locale = $3",
        )
        .bind(template_id)
        .bind(version)
        .bind(&locale)
        .fetch_optional(&mut *tx)
        .await?;

        if exists.is_none() {
            // Dropping the transaction rolls it back
            return Err(TemplateError::VersionNotFound {
                key: key.to_string(),
                version,
                locale,
            });
        }

        Self::set_active(&mut tx, template_id, version, &locale).await?;
        tx.commit().await?;

        tracing::info!(template_key = %key, locale = %locale, version, "Template version activated");
        Ok(())
    }

    async fn get_active_version(
        &self,
        key: &str,
        locale: Option<&str>,
    ) -> TemplateResult<TemplateVersion> {
        let locale = self.config.locale_or_default(locale);

        let exact: Option<TemplateVersion> = sqlx::query_as(&format!(
            "SELECT {VERSION_COLUMNS} FROM template_versions v \
             JOIN templates t ON t.id = v.template_id \
             WHERE t.tpl_key = $1 AND v.locale = $2 AND v.is_active \
             LIMIT 1"
        ))
        .bind(key)
        .bind(locale)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(version) = exact {
            return Ok(version);
        }
        if !self.config.locale_fallback {
            return Err(TemplateError::NoActiveVersion(key.to_string()));
        }

        let fallback: Option<TemplateVersion> = sqlx::query_as(&format!(
            "SELECT {VERSION_COLUMNS} FROM template_versions v \
             JOIN templates t ON t.id = v.template_id \
             WHERE t.tpl_key = $1 AND v.is_active \
             ORDER BY v.created_at DESC, v.id DESC \
             LIMIT 1"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        fallback.ok_or_else(|| TemplateError::NoActiveVersion(key.to_string()))
    }

    async fn list_versions(&self, key: &str) -> TemplateResult<Vec<TemplateVersion>> {
        let versions = sqlx::query_as(&format!(
            "SELECT {VERSION_COLUMNS} FROM template_versions v \
             JOIN templates t ON t.id = v.template_id \
             WHERE t.tpl_key = $1 \
             ORDER BY v.created_at DESC, v.version DESC"
        ))
        .bind(key)
        .fetch_all(&self.pool)
        .await?;

        Ok(versions)
    }

    async fn list_templates(&self) -> TemplateResult<Vec<Template>> {
        let templates = sqlx::query_as(
            "SELECT id, tpl_key AS key, name, description, created_at, updated_at \
             FROM templates ORDER BY tpl_key",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(templates)
    }
}
