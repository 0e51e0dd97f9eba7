//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize telemetry and metrics in dependency order
//! - Build the server and bind its listener
//! - Wire OS signals to graceful shutdown
//! - Flush spans on the way out
//!
//! Any startup error is fatal; listeners start last so traffic only arrives
//! once everything else is ready.

use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::MockConfig;
use crate::http::MockServer;
use crate::lifecycle::{signals, Shutdown};
use crate::net::load_tls_config;
use crate::observability::{self, TelemetryError};
use crate::webhook::DeliveryError;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("tracer initialization failed: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("webhook client setup failed: {0}")]
    Webhook(#[from] DeliveryError),

    #[error("rate limit and burst size must both be positive")]
    InvalidRateLimit,

    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("failed to load TLS certificates: {0}")]
    Tls(#[source] std::io::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

fn parse_addr(field: &'static str, value: &str) -> Result<SocketAddr, StartupError> {
    value.parse().map_err(|_| StartupError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

/// Run the mock until a shutdown signal arrives.
pub async fn run(config: MockConfig) -> Result<(), StartupError> {
    let provider = observability::init_tracer(&config.tracing)?;

    if config.observability.metrics_enabled {
        let addr = parse_addr("metrics", &config.observability.metrics_address)?;
        observability::metrics::init_metrics(addr);
    }

    let server = MockServer::new(&config, &provider)?;

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    let result = match &config.listener.tls {
        Some(tls) => {
            let addr = parse_addr("listener", &config.listener.bind_address)?;
            let tls = load_tls_config(tls).await.map_err(StartupError::Tls)?;
            server.run_tls(addr, tls, receiver).await
        }
        None => {
            let listener = TcpListener::bind(&config.listener.bind_address)
                .await
                .map_err(|source| StartupError::Bind {
                    address: config.listener.bind_address.clone(),
                    source,
                })?;
            server.run(listener, receiver).await
        }
    };

    if let Err(e) = provider.shutdown() {
        tracing::warn!(error = %e, "Failed to flush spans on shutdown");
    }

    result.map_err(StartupError::Serve)
}
