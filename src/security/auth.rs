//! Credential checks for the caller and admin route groups.
//!
//! Both validators compare the token following a fixed, case-sensitive scheme
//! prefix in `Authorization` against a deployment secret. An empty secret
//! turns the check off: every request passes. That is meant for local runs
//! only, so [`warn_if_disabled`] reports it loudly at startup.

use std::sync::Arc;

use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::config::AuthConfig;
use crate::http::error::ApiError;
use crate::http::pipeline::Stage;
use crate::observability::metrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// Per-caller API key.
    Bearer,
    /// Static admin key.
    Apikey,
}

impl AuthScheme {
    pub fn prefix(self) -> &'static str {
        match self {
            AuthScheme::Bearer => "Bearer",
            AuthScheme::Apikey => "Apikey",
        }
    }
}

/// Set on requests that passed authentication. `verified` is false when the
/// check was disabled by an empty secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub scheme: AuthScheme,
    pub verified: bool,
}

/// Everything after `<scheme> ` in the `Authorization` header, verbatim.
pub fn extract_token(headers: &HeaderMap, scheme: AuthScheme) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix(scheme.prefix())?.strip_prefix(' ')?;
    (!token.is_empty()).then_some(token)
}

#[derive(Clone)]
pub struct AuthStage {
    scheme: AuthScheme,
    secret: Arc<str>,
}

impl AuthStage {
    pub fn new(scheme: AuthScheme, secret: &str) -> Self {
        Self {
            scheme,
            secret: Arc::from(secret),
        }
    }

    /// Validator for `Authorization: Bearer <api key>`.
    pub fn bearer(api_key: &str) -> Self {
        Self::new(AuthScheme::Bearer, api_key)
    }

    /// Validator for `Authorization: Apikey <admin key>`.
    pub fn admin_key(admin_key: &str) -> Self {
        Self::new(AuthScheme::Apikey, admin_key)
    }

    pub fn is_disabled(&self) -> bool {
        self.secret.is_empty()
    }

    /// Check `headers`, returning the principal to attach on success.
    pub fn authorize(&self, headers: &HeaderMap) -> Option<Principal> {
        if self.is_disabled() {
            return Some(Principal {
                scheme: self.scheme,
                verified: false,
            });
        }

        match extract_token(headers, self.scheme) {
            Some(token) if token == &*self.secret => Some(Principal {
                scheme: self.scheme,
                verified: true,
            }),
            _ => None,
        }
    }
}

impl Stage for AuthStage {
    async fn intercept(&self, mut request: Request, next: Next) -> Response {
        match self.authorize(request.headers()) {
            Some(principal) => {
                if principal.verified {
                    tracing::debug!(scheme = self.scheme.prefix(), "Request authorized");
                }
                request.extensions_mut().insert(principal);
                next.run(request).await
            }
            None => {
                tracing::warn!(
                    scheme = self.scheme.prefix(),
                    path = %request.uri().path(),
                    reason = "invalid or missing credential",
                    "Failed to authorize request"
                );
                metrics::record_rejection(metrics::REJECTED_UNAUTHORIZED);
                ApiError::Unauthorized.into_response()
            }
        }
    }
}

/// Log a warning for every validator switched off by an empty secret.
pub fn warn_if_disabled(config: &AuthConfig) {
    if config.api_key.is_empty() {
        tracing::warn!(
            scheme = AuthScheme::Bearer.prefix(),
            "SECURITY: auth.api_key is empty, caller authentication is DISABLED and every request is accepted"
        );
    }
    if config.admin_key.is_empty() {
        tracing::warn!(
            scheme = AuthScheme::Apikey.prefix(),
            "SECURITY: auth.admin_key is empty, admin authentication is DISABLED and every request is accepted"
        );
    }
}
