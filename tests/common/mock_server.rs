//! Mock session server for exercising the client end to end.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, Response, StatusCode};
use axum::routing::any;
use axum::Router;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

/// A captured request for assertions.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: String,
    /// Endpoint name without the leading slash, e.g. "run".
    pub endpoint: String,
    /// Raw form-encoded body.
    pub body: String,
}

impl CapturedRequest {
    /// Decoded value of form field `name`.
    pub fn field(&self, name: &str) -> Option<String> {
        url::form_urlencoded::parse(self.body.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// A mock response to return.
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub delay_ms: u64,
}

impl Default for MockResponse {
    fn default() -> Self {
        Self::text("")
    }
}

impl MockResponse {
    pub fn text(body: &str) -> Self {
        Self {
            status: 200,
            body: body.to_string(),
            delay_ms: 0,
        }
    }

    pub fn error(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay_ms: 0,
        }
    }

    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }
}

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    queued: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    defaults: Arc<Mutex<HashMap<String, MockResponse>>>,
}

/// Mock server answering every endpoint.
///
/// Each endpoint replays its queued responses in order, then falls back to
/// its default. `check_termination` defaults to `running`, `stop` to `OK`;
/// everything else defaults to an empty 200.
pub struct MockServer {
    pub addr: SocketAddr,
    state: MockState,
    shutdown: tokio::sync::watch::Sender<bool>,
}

impl MockServer {
    /// Start a new mock server.
    pub async fn start() -> Self {
        let mut defaults = HashMap::new();
        defaults.insert(
            "check_termination".to_string(),
            MockResponse::text("running"),
        );
        defaults.insert("stop".to_string(), MockResponse::text("OK"));

        let state = MockState {
            requests: Arc::new(Mutex::new(Vec::new())),
            queued: Arc::new(Mutex::new(HashMap::new())),
            defaults: Arc::new(Mutex::new(defaults)),
        };

        let (shutdown_tx, mut shutdown_rx) = tokio::sync::watch::channel(false);

        let app = Router::new()
            .route("/{*path}", any(handle_request))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock server");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .ok();
        });

        // Wait for server to be ready
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr,
            state,
            shutdown: shutdown_tx,
        }
    }

    /// Enqueue a response for the next request to `endpoint`.
    pub async fn enqueue(&self, endpoint: &str, resp: MockResponse) {
        self.state
            .queued
            .lock()
            .await
            .entry(endpoint.to_string())
            .or_default()
            .push_back(resp);
    }

    /// Replace the fallback response for `endpoint`.
    pub async fn set_default(&self, endpoint: &str, resp: MockResponse) {
        self.state
            .defaults
            .lock()
            .await
            .insert(endpoint.to_string(), resp);
    }

    /// Get all captured requests.
    pub async fn captured_requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().await.clone()
    }

    /// Captured requests to one endpoint.
    pub async fn requests_to(&self, endpoint: &str) -> Vec<CapturedRequest> {
        self.captured_requests()
            .await
            .into_iter()
            .filter(|r| r.endpoint == endpoint)
            .collect()
    }

    /// Get the base URL for this mock server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}

async fn handle_request(State(state): State<MockState>, req: Request<Body>) -> Response<Body> {
    let method = req.method().to_string();
    let endpoint = req.uri().path().trim_start_matches('/').to_string();

    let body_bytes = axum::body::to_bytes(req.into_body(), 1024 * 1024)
        .await
        .unwrap_or_default();

    state.requests.lock().await.push(CapturedRequest {
        method,
        endpoint: endpoint.clone(),
        body: String::from_utf8_lossy(&body_bytes).into_owned(),
    });

    let queued = state
        .queued
        .lock()
        .await
        .get_mut(&endpoint)
        .and_then(|q| q.pop_front());
    let mock_resp = match queued {
        Some(resp) => resp,
        None => state
            .defaults
            .lock()
            .await
            .get(&endpoint)
            .cloned()
            .unwrap_or_default(),
    };

    // Apply delay if configured
    if mock_resp.delay_ms > 0 {
        tokio::time::sleep(tokio::time::Duration::from_millis(mock_resp.delay_ms)).await;
    }

    Response::builder()
        .status(StatusCode::from_u16(mock_resp.status).unwrap())
        .header("content-type", "text/plain")
        .body(Body::from(mock_resp.body))
        .unwrap()
}

