//! Local HTTP fixtures for tests: product pages and a fake email endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

/// Bind `router` on an ephemeral localhost port and return its base URL.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A single product page at `/product` with the given HTML body.
pub fn product_page(html: &'static str) -> Router {
    Router::new().route("/product", get(move || async move { Html(html) }))
}

/// A page that always answers with `status`.
pub fn failing_page(status: StatusCode) -> Router {
    Router::new().route("/product", get(move || async move { status }))
}

/// One captured email API call.
#[derive(Debug, Clone)]
pub struct CapturedEmail {
    pub api_key: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct MailState {
    status: StatusCode,
    captured: Arc<Mutex<Vec<CapturedEmail>>>,
}

/// Fake transactional-email API at `/v3/smtp/email` that records every request
/// and answers with `status`.
pub fn mail_api(status: StatusCode) -> (Router, Arc<Mutex<Vec<CapturedEmail>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = MailState {
        status,
        captured: Arc::clone(&captured),
    };
    let router = Router::new()
        .route("/v3/smtp/email", post(receive_email))
        .with_state(state);
    (router, captured)
}

async fn receive_email(
    State(state): State<MailState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let api_key = headers
        .get("api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state
        .captured
        .lock()
        .unwrap()
        .push(CapturedEmail { api_key, body });
    state.status
}

/// Notifier double that records drop events and answers with a fixed result.
pub struct RecordingNotifier {
    pub accept: bool,
    pub events: Mutex<Vec<crate::types::NotificationEvent>>,
}

impl RecordingNotifier {
    pub fn new(accept: bool) -> Self {
        Self {
            accept,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl crate::notify::Notifier for RecordingNotifier {
    async fn notify(
        &self,
        _email: &crate::types::EmailSettings,
        event: &crate::types::NotificationEvent,
    ) -> bool {
        self.events.lock().unwrap().push(event.clone());
        self.accept
    }
}

#[async_trait::async_trait]
impl<T: crate::notify::Notifier> crate::notify::Notifier for Arc<T> {
    async fn notify(
        &self,
        email: &crate::types::EmailSettings,
        event: &crate::types::NotificationEvent,
    ) -> bool {
        (**self).notify(email, event).await
    }
}
