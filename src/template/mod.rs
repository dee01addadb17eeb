//! Versioned email templates.
//!
//! This module provides:
//! - Templates with immutable, per-locale numbered versions
//! - A single active version per (template, locale)
//! - In-memory and PostgreSQL stores behind the `TemplateStore` trait
//! - A `{{ .field }}` substitution engine with HTML escaping
//!
//! # Example
//!
//! ```ignore
//! let store = MemoryTemplateStore::default();
//! seed_default_templates(&store).await?;
//!
//! let version = store.get_active_version("bienvenida", Some("es-GT")).await?;
//! let rendered = Renderer::default().render_version(&version, &data)?;
//! ```

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::{StorageConfig, TemplateConfig};

mod memory_store;
mod postgres_store;
mod render;
mod seed;
mod store;
mod types;
mod value;

pub use memory_store::MemoryTemplateStore;
pub use postgres_store::PostgresTemplateStore;
pub use render::{validate, Renderer};
pub use seed::{seed_default_templates, WELCOME_TEMPLATE_KEY, WELCOME_TEMPLATE_LOCALE};
pub use store::{TemplateStore, TemplateStoreConfig};
pub use types::{
    NewTemplateVersion, RenderedTemplate, Template, TemplateError, TemplateResult, TemplateVersion,
};
pub use value::{TemplateData, TemplateValue};

impl From<&TemplateConfig> for TemplateStoreConfig {
    fn from(config: &TemplateConfig) -> Self {
        Self {
            default_locale: config.default_locale.clone(),
            locale_fallback: config.locale_fallback,
        }
    }
}

/// Create a template store based on the configured storage backend.
///
/// - `"postgres"`: `PostgresTemplateStore` when a pool is provided
/// - `"memory"` (default): `MemoryTemplateStore`
pub fn create_template_store(
    storage: &StorageConfig,
    templates: &TemplateConfig,
    pool: Option<PgPool>,
) -> Arc<dyn TemplateStore> {
    let config = TemplateStoreConfig::from(templates);

    match storage.backend.as_str() {
        "postgres" => {
            if let Some(pool) = pool {
                tracing::info!(backend = "postgres", "Creating PostgreSQL template store");
                Arc::new(PostgresTemplateStore::new(pool, config))
            } else {
                tracing::warn!(
                    "PostgreSQL backend requested but no pool provided, falling back to memory"
                );
                Arc::new(MemoryTemplateStore::new(config))
            }
        }
        "memory" => {
            tracing::info!(backend = "memory", "Creating in-memory template store");
            Arc::new(MemoryTemplateStore::new(config))
        }
        other => {
            tracing::warn!(backend = %other, "Unknown storage backend, falling back to memory");
            Arc::new(MemoryTemplateStore::new(config))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_factory_falls_back_to_memory_without_pool() {
        let storage = StorageConfig {
            backend: "postgres".to_string(),
        };
        let store = create_template_store(&storage, &TemplateConfig::default(), None);

        store.ensure_template("welcome", "Welcome", None).await.unwrap();
        assert_eq!(store.list_templates().await.unwrap().len(), 1);
    }
}
