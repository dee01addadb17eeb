//! Template and version management endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::{AppError, Result};
use crate::metrics::TemplateMetrics;
use crate::server::AppState;
use crate::template::{self, NewTemplateVersion, Template, TemplateVersion};

use super::models::{ActionResponse, ActivateVersionRequest, EnsureTemplateRequest, ListResponse};

/// GET /templates - List templates by key
#[tracing::instrument(name = "http.list_templates", skip(state))]
pub async fn list_templates(State(state): State<AppState>) -> Result<Json<ListResponse<Template>>> {
    Ok(Json(state.templates.list_templates().await?.into()))
}

/// POST /templates - Create a template or update its metadata
#[tracing::instrument(
    name = "http.ensure_template",
    skip(state, request),
    fields(template_key = %request.key)
)]
pub async fn ensure_template(
    State(state): State<AppState>,
    Json(request): Json<EnsureTemplateRequest>,
) -> Result<Json<ActionResponse>> {
    let key = request.key.trim();
    if key.is_empty() {
        return Err(AppError::Validation("template key is required".to_string()));
    }
    let name = request
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(key);

    let id = state
        .templates
        .ensure_template(key, name, request.description.as_deref())
        .await?;

    Ok(Json(ActionResponse::ok("Plantilla guardada").with_id(id)))
}

/// GET /templates/{key}/versions - All versions, newest first
#[tracing::instrument(name = "http.list_template_versions", skip(state))]
pub async fn list_versions(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ListResponse<TemplateVersion>>> {
    Ok(Json(state.templates.list_versions(&key).await?.into()))
}

/// POST /templates/versions - Append a version, optionally activating it
///
/// Subject and bodies are parsed up front so a broken version never reaches
/// the store.
#[tracing::instrument(
    name = "http.add_template_version",
    skip(state, request),
    fields(template_key = %request.key, locale = %request.locale)
)]
pub async fn add_version(
    State(state): State<AppState>,
    Json(request): Json<NewTemplateVersion>,
) -> Result<(StatusCode, Json<TemplateVersion>)> {
    template::validate(&request.subject)?;
    for body in [&request.body_html, &request.body_text].into_iter().flatten() {
        template::validate(body)?;
    }

    let activate = request.activate;
    let version = state.templates.add_version(request).await?;
    if activate {
        TemplateMetrics::record_activation();
    }

    tracing::info!(
        template_id = version.template_id,
        version = version.version,
        locale = %version.locale,
        active = version.is_active,
        "Template version created"
    );

    Ok((StatusCode::CREATED, Json(version)))
}

/// PUT /templates/activate - Make one version the active one for its locale
#[tracing::instrument(
    name = "http.activate_template_version",
    skip(state, request),
    fields(template_key = %request.template_key, version = request.version)
)]
pub async fn activate_version(
    State(state): State<AppState>,
    Json(request): Json<ActivateVersionRequest>,
) -> Result<Json<ActionResponse>> {
    let locale = request
        .locale
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(&state.settings.templates.default_locale);

    state
        .templates
        .activate_version(request.template_key.trim(), request.version, locale)
        .await?;
    TemplateMetrics::record_activation();

    tracing::info!(
        template_key = %request.template_key,
        version = request.version,
        locale = %locale,
        "Template version activated"
    );

    Ok(Json(ActionResponse::ok("Versión activada")))
}
