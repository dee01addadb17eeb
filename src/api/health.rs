//! Health check and statistics endpoints.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::delivery::DispatcherStatsSnapshot;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub storage: StorageHealthResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postgres: Option<PostgresHealthResponse>,
    pub smtp: SmtpHealthResponse,
}

#[derive(Debug, Serialize)]
pub struct StorageHealthResponse {
    pub backend: String,
}

#[derive(Debug, Serialize)]
pub struct PostgresHealthResponse {
    pub status: String,
    pub connected: bool,
    pub pool_size: u32,
    pub idle_connections: u32,
}

/// Static view of the SMTP settings; no connection is attempted
#[derive(Debug, Serialize)]
pub struct SmtpHealthResponse {
    pub host: String,
    pub port: u16,
    pub credentials_configured: bool,
    pub timeout_seconds: u64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub emails: DispatcherStatsSnapshot,
}

/// GET /health - Component-level health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let uptime_seconds = state.start_time.elapsed().as_secs();

    let postgres = match state.postgres_pool {
        Some(ref pool) => {
            let connected = pool.ping().await;
            let inner_pool = pool.pool();
            Some(PostgresHealthResponse {
                status: if connected { "connected" } else { "unreachable" }.to_string(),
                connected,
                pool_size: inner_pool.size(),
                idle_connections: inner_pool.num_idle() as u32,
            })
        }
        None => None,
    };

    let healthy = postgres.as_ref().map_or(true, |pg| pg.connected);
    let (code, status) = if healthy {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let smtp = &state.settings.smtp;
    let response = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        storage: StorageHealthResponse {
            backend: state.settings.storage.backend.clone(),
        },
        postgres,
        smtp: SmtpHealthResponse {
            host: smtp.host.clone(),
            port: smtp.port,
            credentials_configured: smtp.has_credentials(),
            timeout_seconds: state.settings.delivery.timeout_seconds,
        },
    };

    (code, Json(response))
}

/// GET /healthz - Liveness probe
pub async fn healthz() -> &'static str {
    "ok"
}

/// GET /stats - Dispatcher counters since start-up
pub async fn stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        emails: state.dispatcher.stats(),
    })
}
