//! Distributed tracing.
//!
//! # Responsibilities
//! - Build the tracer provider at startup (OTLP export when configured)
//! - Extract W3C trace context from incoming requests
//! - Open one server span per request and finish it on every exit path
//!
//! # Design Decisions
//! - The provider is an explicit value handed to [`TraceStage`], never
//!   registered globally, so tests can run isolated providers side by side
//! - Without an OTLP endpoint spans are still created, just not exported

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use opentelemetry::propagation::{Extractor, TextMapPropagator};
use opentelemetry::trace::{
    SpanKind, Status, TraceContextExt, TraceId, Tracer as _, TracerProvider as _,
};
use opentelemetry::{Context, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};

use crate::config::TracingConfig;
use crate::http::pipeline::Stage;
use crate::observability::metrics;

/// Value of the `component` attribute on every server span.
pub const COMPONENT: &str = "axum";

pub const ATTR_HTTP_METHOD: &str = "http.method";
pub const ATTR_HTTP_URL: &str = "http.url";
pub const ATTR_HTTP_STATUS_CODE: &str = "http.status_code";
pub const ATTR_COMPONENT: &str = "component";
pub const ATTR_ERROR: &str = "error";
pub const ATTR_HTTP_REQUEST_ID: &str = "http.request_id";

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Failed to build OTLP exporter for {endpoint}: {reason}")]
    Exporter { endpoint: String, reason: String },
}

/// Build the tracer provider described by `config`.
pub fn init_tracer(config: &TracingConfig) -> Result<TracerProvider, TelemetryError> {
    let resource = Resource::new(vec![KeyValue::new(
        opentelemetry_semantic_conventions::resource::SERVICE_NAME,
        config.service_name.clone(),
    )]);

    let builder = TracerProvider::builder()
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource);

    let Some(endpoint) = config.otlp_endpoint.as_deref() else {
        tracing::info!(
            service_name = %config.service_name,
            "No OTLP endpoint configured, spans will not be exported"
        );
        return Ok(builder.build());
    };

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| TelemetryError::Exporter {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

    tracing::info!(
        service_name = %config.service_name,
        endpoint = %endpoint,
        "Exporting spans over OTLP"
    );
    Ok(builder.with_batch_exporter(exporter, runtime::Tokio).build())
}

struct HeaderExtractor<'a>(&'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|value| value.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|key| key.as_str()).collect()
    }
}

/// The request's server span, stored as a request extension so later stages
/// and handlers can read its ids or add attributes.
#[derive(Clone)]
pub struct ActiveSpan(Context);

impl ActiveSpan {
    pub fn context(&self) -> &Context {
        &self.0
    }

    pub fn trace_id(&self) -> TraceId {
        self.0.span().span_context().trace_id()
    }

    pub fn set_attribute(&self, attribute: KeyValue) {
        self.0.span().set_attribute(attribute);
    }
}

/// Ends the span when dropped, so a panicking handler still finishes it.
struct SpanGuard(Context);

impl Drop for SpanGuard {
    fn drop(&mut self) {
        self.0.span().end();
    }
}

struct TraceInner {
    tracer: Tracer,
    propagator: TraceContextPropagator,
}

#[derive(Clone)]
pub struct TraceStage {
    inner: Arc<TraceInner>,
}

impl TraceStage {
    pub fn new(provider: &TracerProvider) -> Self {
        Self {
            inner: Arc::new(TraceInner {
                tracer: provider.tracer(env!("CARGO_PKG_NAME")),
                propagator: TraceContextPropagator::new(),
            }),
        }
    }

    /// Start the server span, as a child of the inbound trace context when
    /// one is present. An absent or malformed `traceparent` yields an empty
    /// parent and therefore a new root span.
    fn start(&self, request: &Request) -> Context {
        let parent = self
            .inner
            .propagator
            .extract(&HeaderExtractor(request.headers()));

        let method = request.method().as_str().to_string();
        let path = request.uri().path().to_string();
        let span = self
            .inner
            .tracer
            .span_builder(format!("HTTP {method} {path}"))
            .with_kind(SpanKind::Server)
            .with_attributes([
                KeyValue::new(ATTR_HTTP_METHOD, method),
                KeyValue::new(ATTR_HTTP_URL, path),
                KeyValue::new(ATTR_COMPONENT, COMPONENT),
            ])
            .start_with_context(&self.inner.tracer, &parent);

        parent.with_span(span)
    }
}

impl Stage for TraceStage {
    async fn intercept(&self, mut request: Request, next: Next) -> Response {
        let start = Instant::now();
        let method = request.method().clone();

        let cx = self.start(&request);
        let guard = SpanGuard(cx.clone());
        request.extensions_mut().insert(ActiveSpan(cx));

        let response = next.run(request).await;

        let status = response.status();
        let span = guard.0.span();
        span.set_attribute(KeyValue::new(
            ATTR_HTTP_STATUS_CODE,
            i64::from(status.as_u16()),
        ));
        if status.is_server_error() {
            span.set_attribute(KeyValue::new(ATTR_ERROR, true));
            span.set_status(Status::error(status.to_string()));
        }

        metrics::record_request(method.as_str(), status.as_u16(), start);
        response
    }
}
