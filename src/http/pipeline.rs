//! The request pipeline.
//!
//! Every inbound request crosses the same stages, outermost first:
//!
//! ```text
//! Tracing ⊃ Correlation-ID ⊃ Rate-Limiting ⊃ Authentication ⊃ handler
//! ```
//!
//! - Tracing is outermost so the span covers the latency of every other stage.
//! - The correlation id exists before any stage logs.
//! - The rate limiter rejects before authentication does any work.
//! - Authentication gates the handlers of its route group.
//!
//! The order is fixed. Stages are built once at startup and cloned into the
//! router; the only mutable state they share is the rate limiter's bucket.

use std::future::Future;

use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;

use crate::http::request::CorrelationStage;
use crate::observability::tracing::TraceStage;
use crate::security::auth::AuthStage;
use crate::security::rate_limit::RateLimitStage;

/// One step of the pipeline: inspect the request, then either answer it
/// directly or hand it to `next`.
pub trait Stage: Clone + Send + Sync + 'static {
    fn intercept(&self, request: Request, next: Next) -> impl Future<Output = Response> + Send;
}

async fn run_stage<S: Stage>(State(stage): State<S>, request: Request, next: Next) -> Response {
    stage.intercept(request, next).await
}

/// Wrap every route of `router`, and its fallback, in `stage`.
pub fn wrap<S: Stage>(router: Router, stage: S) -> Router {
    router.layer(middleware::from_fn_with_state(stage, run_stage::<S>))
}

/// Wrap only the matched routes of `router` in `stage`. Unknown paths stay 404.
pub fn wrap_routes<S: Stage>(router: Router, stage: S) -> Router {
    router.route_layer(middleware::from_fn_with_state(stage, run_stage::<S>))
}

/// Business routes split by the credential they require. The caller and
/// admin groups must each hold at least one route.
pub struct RouteGroups {
    /// No credential.
    pub public: Router,
    /// `Authorization: Bearer <api key>`.
    pub caller: Router,
    /// `Authorization: Apikey <admin key>`.
    pub admin: Router,
}

/// The configured stages, ready to be composed around route groups.
#[derive(Clone)]
pub struct Pipeline {
    tracing: TraceStage,
    correlation: CorrelationStage,
    rate_limit: RateLimitStage,
    caller_auth: AuthStage,
    admin_auth: AuthStage,
}

impl Pipeline {
    pub fn new(
        tracing: TraceStage,
        correlation: CorrelationStage,
        rate_limit: RateLimitStage,
        caller_auth: AuthStage,
        admin_auth: AuthStage,
    ) -> Self {
        Self {
            tracing,
            correlation,
            rate_limit,
            caller_auth,
            admin_auth,
        }
    }

    /// Build the final router. Layers are applied innermost first.
    pub fn compose(&self, groups: RouteGroups) -> Router {
        let caller = wrap_routes(groups.caller, self.caller_auth.clone());
        let admin = wrap_routes(groups.admin, self.admin_auth.clone());
        let app = groups.public.merge(caller).merge(admin);

        let app = wrap(app, self.rate_limit.clone());
        let app = wrap(app, self.correlation.clone());
        wrap(app, self.tracing.clone())
    }
}
