//! API layer - HTTP endpoint handlers organized by domain.

mod drafts;
mod emails;
mod health;
mod metrics;
mod models;
mod routes;
mod templates;

// Re-export all handlers for use in server/app.rs
pub use drafts::{create_draft, send_draft, update_draft};
pub use emails::{delete_email, get_email, list_emails, send_email, send_from_template};
pub use health::{health, healthz, stats, HealthResponse, StatsResponse};
pub use metrics::prometheus_metrics;
pub use models::{
    ActionResponse, ActivateVersionRequest, EmailRequest, EnsureTemplateRequest, ListEmailsQuery,
    ListResponse, TemplateSendRequest,
};
pub use routes::api_routes;
pub use templates::{activate_version, add_version, ensure_template, list_templates, list_versions};
