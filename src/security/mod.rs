//! Admission control.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (one shared token bucket, 429 when empty)
//!     → auth.rs (Bearer for callers, Apikey for admin routes, 401 on mismatch)
//!     → Pass to handler
//! ```
//!
//! # Design Decisions
//! - Fail closed: a missing or malformed credential is rejected
//! - Rejections are logged and counted, never forwarded

pub mod auth;
pub mod rate_limit;

pub use auth::{AuthScheme, AuthStage, Principal};
pub use rate_limit::{RateLimitStage, RateLimiter};
