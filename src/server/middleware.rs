use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::metrics::HttpMetrics;

/// Count requests per route pattern and response status.
///
/// Unmatched paths share a single `unmatched` label so that scanners cannot
/// blow up the label set.
pub async fn track_http_requests(req: Request<Body>, next: Next) -> Response {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;
    HttpMetrics::record_request(&endpoint, response.status().as_u16());

    response
}
