use axum::{
    routing::{get, post, put},
    Router,
};

use crate::server::AppState;

use super::drafts::{create_draft, send_draft, update_draft};
use super::emails::{delete_email, get_email, list_emails, send_email, send_from_template};
use super::health::{health, healthz, stats};
use super::metrics::prometheus_metrics;
use super::templates::{
    activate_version, add_version, ensure_template, list_templates, list_versions,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Health, stats & metrics
        .route("/health", get(health))
        .route("/healthz", get(healthz))
        .route("/stats", get(stats))
        .route("/metrics", get(prometheus_metrics))
        // Sending
        .route("/send", post(send_email))
        .route("/send-email", post(send_email))
        .route("/send-from-template", post(send_from_template))
        // Drafts
        .route("/drafts", post(create_draft))
        .route("/drafts/{id}", put(update_draft))
        .route("/drafts/{id}/send", post(send_draft))
        // Records
        .route("/emails", get(list_emails))
        .route("/emails/{id}", get(get_email).delete(delete_email))
        // Templates
        .route("/templates", get(list_templates).post(ensure_template))
        .route("/templates/versions", post(add_version))
        .route("/templates/activate", put(activate_version))
        .route("/templates/{key}/versions", get(list_versions))
}
