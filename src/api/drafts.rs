//! Draft editing and promotion.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::{AppError, Result};
use crate::server::AppState;

use super::models::{ActionResponse, EmailRequest};

/// POST /drafts - Save content without sending it
#[tracing::instrument(name = "http.create_draft", skip(state, request))]
pub async fn create_draft(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> Result<(StatusCode, Json<ActionResponse>)> {
    let id = state
        .dispatcher
        .create_draft(&request.to, &request.subject, &request.body)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ActionResponse::ok("Borrador guardado").with_id(id)),
    ))
}

/// PUT /drafts/{id} - Replace the content of a draft
///
/// Records that are missing or no longer in `draft` are left untouched and
/// reported as not found.
#[tracing::instrument(name = "http.update_draft", skip(state, request))]
pub async fn update_draft(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<ActionResponse>> {
    let updated = state
        .dispatcher
        .update_draft(id, &request.to, &request.subject, &request.body)
        .await?;

    if !updated {
        return Err(AppError::NotFound(format!("draft {}", id)));
    }

    Ok(Json(ActionResponse::ok("Borrador actualizado").with_id(id)))
}

/// POST /drafts/{id}/send - Promote a draft and deliver it
#[tracing::instrument(name = "http.send_draft", skip(state))]
pub async fn send_draft(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ActionResponse>> {
    let receipt = state.dispatcher.send_draft(id).await?;

    Ok(Json(ActionResponse::delivered(
        "Correo enviado exitosamente",
        receipt,
    )))
}
