//! Direct and templated sends, plus record queries.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::delivery::TemplateSend;
use crate::email::{EmailFilter, EmailRecord, EmailStatus};
use crate::error::{AppError, Result};
use crate::server::AppState;

use super::models::{
    ActionResponse, EmailRequest, ListEmailsQuery, ListResponse, TemplateSendRequest,
};

/// POST /send - Send literal content
#[tracing::instrument(name = "http.send_email", skip(state, request), fields(to = %request.to))]
pub async fn send_email(
    State(state): State<AppState>,
    Json(request): Json<EmailRequest>,
) -> Result<Json<ActionResponse>> {
    let receipt = state
        .dispatcher
        .send_email(&request.to, &request.subject, &request.body, request.format)
        .await?;

    Ok(Json(ActionResponse::delivered(
        "Correo enviado exitosamente",
        receipt,
    )))
}

/// POST /send-from-template - Render the active template version and send it
#[tracing::instrument(
    name = "http.send_from_template",
    skip(state, request),
    fields(template_key = %request.template_key, to = %request.to)
)]
pub async fn send_from_template(
    State(state): State<AppState>,
    Json(request): Json<TemplateSendRequest>,
) -> Result<Json<ActionResponse>> {
    let receipt = state
        .dispatcher
        .send_from_template(TemplateSend {
            template_key: request.template_key,
            locale: request.locale,
            to: request.to,
            data: request.data,
        })
        .await?;

    Ok(Json(ActionResponse::delivered(
        "Correo enviado (plantilla)",
        receipt,
    )))
}

/// GET /emails - List records, newest first
#[tracing::instrument(name = "http.list_emails", skip(state, query))]
pub async fn list_emails(
    State(state): State<AppState>,
    Query(query): Query<ListEmailsQuery>,
) -> Result<Json<ListResponse<EmailRecord>>> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<EmailStatus>()
                .map_err(|e| AppError::Validation(e.to_string()))?,
        ),
    };

    let filter = EmailFilter {
        status,
        limit: query.limit,
        offset: query.offset,
    };
    let records = state.dispatcher.list_emails(&filter).await?;

    Ok(Json(records.into()))
}

/// GET /emails/{id}
#[tracing::instrument(name = "http.get_email", skip(state))]
pub async fn get_email(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<EmailRecord>> {
    Ok(Json(state.dispatcher.get_email(id).await?))
}

/// DELETE /emails/{id}
#[tracing::instrument(name = "http.delete_email", skip(state))]
pub async fn delete_email(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ActionResponse>> {
    if !state.dispatcher.delete_email(id).await? {
        return Err(AppError::NotFound(format!("email {}", id)));
    }

    Ok(Json(ActionResponse::ok("Correo eliminado").with_id(id)))
}
