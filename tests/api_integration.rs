//! HTTP API integration tests
//!
//! Requests go through the full router (CORS, tracing, body limit, metrics
//! middleware) with memory storage and a recording transport.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use mailer_service::config::Settings;
use mailer_service::server::{create_app, AppState};
use mailer_service::transport::{MailTransport, OutgoingEmail, TransportError};

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<OutgoingEmail>>,
}

#[async_trait]
impl MailTransport for RecordingTransport {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), TransportError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

struct TestApp {
    router: Router,
    transport: Arc<RecordingTransport>,
}

impl TestApp {
    async fn new() -> Self {
        let transport = Arc::new(RecordingTransport::default());
        let state = AppState::build(Settings::default(), transport.clone())
            .await
            .unwrap();
        Self {
            router: create_app(state),
            transport,
        }
    }

    async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    fn sent_count(&self) -> usize {
        self.transport.sent.lock().unwrap().len()
    }
}

#[tokio::test]
async fn test_send_returns_sent_record() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/send",
            Some(json!({"to": "a@example.com", "subject": "Hi", "body": "<p>Hello</p>"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["status"], "sent");
    assert!(body["sentAt"].is_string());

    let id = body["id"].as_i64().unwrap();
    let (status, record) = app.request("GET", &format!("/emails/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["to"], "a@example.com");
    assert_eq!(record["status"], "sent");
}

#[tokio::test]
async fn test_send_email_alias_validates_input() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/send-email",
            Some(json!({"to": "bad address", "subject": "Hi", "body": "x"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(app.sent_count(), 0);
}

#[tokio::test]
async fn test_send_from_template() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/send-from-template",
            Some(json!({
                "templateKey": "bienvenida",
                "to": "ana@example.com",
                "data": {"userName": "<Ana>", "supportEmail": "soporte@example.com"}
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "sent");

    let sent = app.transport.sent.lock().unwrap().clone();
    assert!(sent[0].html.as_deref().unwrap().contains("&lt;Ana&gt;"));
}

#[tokio::test]
async fn test_missing_template_variable_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/send-from-template",
            Some(json!({"templateKey": "bienvenida", "to": "ana@example.com", "data": {}})),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "TEMPLATE_UNAVAILABLE");
    assert_eq!(app.sent_count(), 0);
}

#[tokio::test]
async fn test_draft_lifecycle_over_http() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/drafts",
            Some(json!({"to": "a@example.com", "subject": "Draft", "body": "v1"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();

    let (status, _) = app
        .request(
            "PUT",
            &format!("/drafts/{}", id),
            Some(json!({"to": "a@example.com", "subject": "Draft", "body": "v2"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .request("POST", &format!("/drafts/{}/send", id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "sent");

    let (status, _) = app
        .request(
            "PUT",
            &format!("/drafts/{}", id),
            Some(json!({"to": "a@example.com", "subject": "Draft", "body": "v3"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, record) = app.request("GET", &format!("/emails/{}", id), None).await;
    assert_eq!(record["body"], "v2");
}

#[tokio::test]
async fn test_list_emails_filters_by_status() {
    let app = TestApp::new().await;

    app.request(
        "POST",
        "/drafts",
        Some(json!({"to": "a@example.com", "subject": "Draft", "body": "x"})),
    )
    .await;
    app.request(
        "POST",
        "/send",
        Some(json!({"to": "b@example.com", "subject": "Now", "body": "y"})),
    )
    .await;

    let (status, body) = app.request("GET", "/emails?status=draft", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["status"], "draft");

    let (status, body) = app.request("GET", "/emails?status=bogus", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_delete_email() {
    let app = TestApp::new().await;

    let (_, body) = app
        .request(
            "POST",
            "/drafts",
            Some(json!({"to": "a@example.com", "subject": "Draft", "body": "x"})),
        )
        .await;
    let id = body["id"].as_i64().unwrap();

    let (status, _) = app.request("DELETE", &format!("/emails/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.request("GET", &format!("/emails/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_template_version_management() {
    let app = TestApp::new().await;

    let (status, _) = app
        .request(
            "POST",
            "/templates",
            Some(json!({"key": "reset", "name": "Password reset"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    for subject in ["Reset v1", "Reset v2"] {
        let (status, _) = app
            .request(
                "POST",
                "/templates/versions",
                Some(json!({"templateKey": "reset", "subject": subject, "bodyText": "Hi"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, _) = app
        .request(
            "PUT",
            "/templates/activate",
            Some(json!({"templateKey": "reset", "version": 2})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.request("GET", "/templates/reset/versions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    let active: Vec<_> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|v| v["isActive"] == true)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["version"], 2);

    let (status, body) = app
        .request(
            "PUT",
            "/templates/activate",
            Some(json!({"templateKey": "reset", "version": 9})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_template_version_with_bad_syntax_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            "POST",
            "/templates/versions",
            Some(json!({"templateKey": "broken", "subject": "Hi {{ .name", "bodyText": "x"})),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "TEMPLATE_SYNTAX_ERROR");

    let (_, body) = app.request("GET", "/templates", None).await;
    let keys: Vec<_> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["key"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(keys, vec!["bienvenida"]);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let app = TestApp::new().await;

    let (status, body) = app.request("GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"]["backend"], "memory");
    assert!(body.get("postgres").is_none());

    let (status, body) = app.request("GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));

    let (status, body) = app.request("GET", "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().contains("mailer_http_requests_total"));
}
