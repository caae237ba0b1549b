//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_server;

use runstep::config::{Config, LoggingConfig, ServerConfig, TimingConfig};
use runstep::session::SessionController;
use runstep::view::SourceView;
use std::sync::Arc;
use std::time::Duration;

pub use mock_server::{CapturedRequest, MockResponse, MockServer};

/// Ten-line program, so `line1` through `line10` exist.
pub const PROGRAM: &str = "\
in x;
aux y;
y := 0;
loop x do
  y := succ(y);
enddo
while y do
  y := pred(y);
enddo
out y;";

/// Config pointing at `base_url` with fast polling.
///
/// The terminal reload interval is long so tests that don't care about
/// program output see no `shell` traffic.
pub fn test_config(base_url: &str) -> Config {
    Config {
        server: ServerConfig {
            base_url: base_url.to_string(),
        },
        timing: TimingConfig {
            request_timeout_ms: 500,
            poll_interval_ms: 20,
            reload_interval_ms: 60_000,
            connect_timeout_ms: 500,
        },
        logging: LoggingConfig::default(),
    }
}

/// A mock server, a page for [`PROGRAM`] and a controller wired to both.
pub struct Harness {
    pub server: MockServer,
    pub view: Arc<SourceView>,
    pub session: SessionController,
}

impl Harness {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with(configure: impl FnOnce(&mut Config)) -> Self {
        let server = MockServer::start().await;
        let mut config = test_config(&server.base_url());
        configure(&mut config);

        let view = Arc::new(SourceView::new(PROGRAM));
        let session = SessionController::new(&config, view.clone()).expect("controller");
        Self {
            server,
            view,
            session,
        }
    }

    /// Starts a session the server numbers `handle`.
    pub async fn run_session(&self, handle: u64) {
        self.server
            .enqueue("run", MockResponse::text(&handle.to_string()))
            .await;
        self.session
            .start_session(PROGRAM)
            .await
            .expect("session should start");
    }
}

/// Polls `condition` until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Waits until `server` has seen at least `count` requests to `endpoint`.
pub async fn wait_for_requests(
    server: &MockServer,
    endpoint: &str,
    count: usize,
    timeout: Duration,
) -> bool {
    let start = std::time::Instant::now();
    loop {
        if server.requests_to(endpoint).await.len() >= count {
            return true;
        }
        if start.elapsed() >= timeout {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
