//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the webhook client, simulation and handler state from config
//! - Harden business routes (timeout, body limit, panic recovery)
//! - Compose the request pipeline around them
//! - Serve over plain TCP or TLS until shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use opentelemetry_sdk::trace::TracerProvider;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::config::MockConfig;
use crate::http::handlers::{routes, AppState};
use crate::http::pipeline::{Pipeline, RouteGroups};
use crate::http::request::CorrelationStage;
use crate::lifecycle::shutdown;
use crate::lifecycle::StartupError;
use crate::observability::TraceStage;
use crate::security::auth::{self, AuthStage};
use crate::security::RateLimitStage;
use crate::simulation::{EventEmitter, StatusTimeline};
use crate::webhook::WebhookClient;

/// How long in-flight TLS connections may drain after shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// The mock Business API server.
pub struct MockServer {
    router: Router,
}

impl MockServer {
    /// Build the full application from validated configuration.
    pub fn new(config: &MockConfig, provider: &TracerProvider) -> Result<Self, StartupError> {
        auth::warn_if_disabled(&config.auth);

        let webhook = Arc::new(WebhookClient::new(&config.webhook)?);
        let emitter = EventEmitter::new(
            webhook,
            config.business.clone(),
            StatusTimeline::from(&config.simulation),
        );

        let rate_limit =
            RateLimitStage::from_config(&config.rate_limit).ok_or(StartupError::InvalidRateLimit)?;
        let pipeline = Pipeline::new(
            TraceStage::new(provider),
            CorrelationStage::new(),
            rate_limit,
            AuthStage::bearer(&config.auth.api_key),
            AuthStage::admin_key(&config.auth.admin_key),
        );

        let groups = routes(AppState::new(&config.business.phone_number_id, emitter));
        let router = pipeline.compose(RouteGroups {
            public: harden(groups.public, config),
            caller: harden(groups.caller, config),
            admin: harden(groups.admin, config),
        });

        Ok(Self { router })
    }

    /// The composed router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Serve HTTPS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let handle = axum_server::Handle::new();
        tokio::spawn({
            let handle = handle.clone();
            async move {
                shutdown::wait(shutdown).await;
                handle.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
            }
        });

        tracing::info!(address = %addr, "HTTPS server starting");
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.router.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Limits applied to business handlers, inside authentication.
#[allow(deprecated)]
fn harden(router: Router, config: &MockConfig) -> Router {
    router
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
}
