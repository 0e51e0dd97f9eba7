//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use opentelemetry_sdk::trace::TracerProvider;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use wabiz_mock::{MockConfig, MockServer, Shutdown};

pub const API_KEY: &str = "abcdefg";
pub const ADMIN_KEY: &str = "s3cret";
pub const PHONE_NUMBER_ID: &str = "106540352242922";

/// Config with known keys and fast simulation timings.
pub fn test_config() -> MockConfig {
    let mut config = MockConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.auth.api_key = API_KEY.to_string();
    config.auth.admin_key = ADMIN_KEY.to_string();
    config.rate_limit.requests_per_second = 1000;
    config.rate_limit.burst_size = 1000;
    config.simulation.status_delay_ms = 10;
    config.webhook.timeout_secs = 2;
    config.webhook.retries.base_delay_ms = 10;
    config.webhook.retries.max_delay_ms = 50;
    config
}

/// A running mock server. Dropping it stops the listener.
pub struct TestServer {
    pub addr: SocketAddr,
    _shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the mock on an ephemeral port.
pub async fn spawn_server(config: MockConfig) -> TestServer {
    let provider = TracerProvider::builder().build();
    let server = MockServer::new(&config, &provider).unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    TestServer {
        addr,
        _shutdown: shutdown,
    }
}

/// A webhook payload as received, with its content type.
#[derive(Debug)]
pub struct Delivery {
    pub content_type: Option<String>,
    pub body: Value,
}

/// Mock webhook receiver.
pub struct WebhookReceiver {
    pub url: String,
    pub hits: Arc<AtomicUsize>,
    deliveries: mpsc::UnboundedReceiver<Delivery>,
}

impl WebhookReceiver {
    /// Next accepted delivery, or `None` after `timeout`.
    pub async fn next(&mut self, timeout: Duration) -> Option<Delivery> {
        tokio::time::timeout(timeout, self.deliveries.recv())
            .await
            .ok()
            .flatten()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct ReceiverState {
    hits: Arc<AtomicUsize>,
    status_for: Arc<dyn Fn(usize) -> u16 + Send + Sync>,
    tx: mpsc::UnboundedSender<Delivery>,
}

async fn receive(
    State(state): State<ReceiverState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let attempt = state.hits.fetch_add(1, Ordering::SeqCst) + 1;
    let status =
        StatusCode::from_u16((state.status_for)(attempt)).unwrap_or(StatusCode::OK);

    if status.is_success() {
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let _ = state.tx.send(Delivery { content_type, body });
    }
    status
}

/// Start a receiver whose answer to the n-th request (1-based) is
/// `status_for(n)`. Only successful requests are reported as deliveries.
pub async fn start_programmable_receiver<F>(status_for: F) -> WebhookReceiver
where
    F: Fn(usize) -> u16 + Send + Sync + 'static,
{
    let (tx, deliveries) = mpsc::unbounded_channel();
    let hits = Arc::new(AtomicUsize::new(0));
    let state = ReceiverState {
        hits: hits.clone(),
        status_for: Arc::new(status_for),
        tx,
    };

    let app = Router::new().route("/hook", post(receive)).with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    WebhookReceiver {
        url: format!("http://{}/hook", addr),
        hits,
        deliveries,
    }
}

/// Start a receiver that accepts everything.
pub async fn start_webhook_receiver() -> WebhookReceiver {
    start_programmable_receiver(|_| 200).await
}
