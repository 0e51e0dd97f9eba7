//! Correlation id stage.
//!
//! A non-empty inbound `X-Request-ID` is reused verbatim so callers can tie
//! our records to theirs. Otherwise a UUID v4 is generated. The id is written
//! back into the request headers, stored as a [`RequestId`] extension, opened
//! as the `request` logging span for everything downstream, tagged on the
//! server span, and returned on the response.

use axum::extract::Request;
use axum::http::header::HeaderName;
use axum::middleware::Next;
use axum::response::Response;
use tower_http::request_id::{MakeRequestId, MakeRequestUuid, RequestId};
use opentelemetry::KeyValue;
use tracing::Instrument;

use crate::http::pipeline::Stage;
use crate::observability::tracing::{ActiveSpan, ATTR_HTTP_REQUEST_ID};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

#[derive(Clone, Copy, Default)]
pub struct CorrelationStage {
    make_id: MakeRequestUuid,
}

impl CorrelationStage {
    pub fn new() -> Self {
        Self::default()
    }

    fn resolve<B>(&self, request: &Request<B>) -> Option<RequestId> {
        match request.headers().get(&X_REQUEST_ID) {
            Some(value) if !value.is_empty() => Some(RequestId::new(value.clone())),
            _ => {
                let mut make_id = self.make_id;
                make_id.make_request_id(request)
            }
        }
    }
}

impl Stage for CorrelationStage {
    async fn intercept(&self, mut request: Request, next: Next) -> Response {
        let Some(request_id) = self.resolve(&request) else {
            return next.run(request).await;
        };
        let header = request_id.header_value().clone();

        let id = header.to_str().unwrap_or_default();
        let span = tracing::info_span!(
            "request",
            request_id = id,
            trace_id = tracing::field::Empty,
        );
        if let Some(active) = request.extensions().get::<ActiveSpan>() {
            span.record("trace_id", tracing::field::display(active.trace_id()));
            active.set_attribute(KeyValue::new(ATTR_HTTP_REQUEST_ID, id.to_string()));
        }

        request.headers_mut().insert(X_REQUEST_ID, header.clone());
        request.extensions_mut().insert(request_id);

        let mut response = next.run(request).instrument(span).await;
        response.headers_mut().insert(X_REQUEST_ID, header);
        response
    }
}

/// Access to the correlation id assigned by [`CorrelationStage`].
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl<B> RequestIdExt for axum::http::Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.extensions()
            .get::<RequestId>()
            .and_then(|id| id.header_value().to_str().ok())
    }
}
