use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;

use crate::config::Settings;
use crate::delivery::EmailDispatcher;
use crate::email::create_email_store;
use crate::postgres::{PostgresPool, PostgresPoolError};
use crate::template::{
    create_template_store, seed_default_templates, Renderer, TemplateError, TemplateStore,
};
use crate::transport::{Mailer, MailTransport};

/// Errors raised while wiring the application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("PostgreSQL unavailable: {0}")]
    Postgres(#[from] PostgresPoolError),

    #[error("Failed to seed default templates: {0}")]
    Seed(#[from] TemplateError),
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub dispatcher: Arc<EmailDispatcher>,
    pub templates: Arc<dyn TemplateStore>,
    pub postgres_pool: Option<PostgresPool>,
    pub start_time: Instant,
}

impl AppState {
    /// Connect the configured storage backend, seed the default templates and
    /// assemble the dispatcher around `transport`.
    ///
    /// With `storage.backend = "postgres"` an unreachable database is an
    /// error; nothing falls back to memory silently at start-up.
    pub async fn build(
        settings: Settings,
        transport: Arc<dyn MailTransport>,
    ) -> Result<Self, StateError> {
        let postgres_pool = if settings.storage.backend == "postgres" {
            Some(PostgresPool::new(&settings.database).await?)
        } else {
            None
        };
        let pg = postgres_pool.as_ref().map(|p| p.pool().clone());

        let emails = create_email_store(&settings.storage, pg.clone());
        let templates = create_template_store(&settings.storage, &settings.templates, pg);

        seed_default_templates(templates.as_ref()).await?;

        let mailer = Mailer::new(transport, settings.delivery.timeout());
        let renderer = Renderer::new(settings.templates.strict_variables);
        let dispatcher = Arc::new(EmailDispatcher::new(
            emails,
            templates.clone(),
            renderer,
            mailer,
        ));

        tracing::info!(
            storage = %settings.storage.backend,
            timeout_secs = settings.delivery.timeout_seconds,
            default_locale = %settings.templates.default_locale,
            "Application state initialized"
        );

        Ok(Self {
            settings: Arc::new(settings),
            dispatcher,
            templates,
            postgres_pool,
            start_time: Instant::now(),
        })
    }
}
