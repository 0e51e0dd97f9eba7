//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, serving, shutdown)
//!     → pipeline.rs (tracing ⊃ correlation ⊃ rate limit ⊃ auth)
//!     → request.rs (correlation id stage)
//!     → handlers.rs (business routes)
//!     → error.rs (provider error envelope)
//!     → Send to client
//! ```

pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod request;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use pipeline::{Pipeline, RouteGroups, Stage};
pub use request::{CorrelationStage, RequestIdExt, X_REQUEST_ID};
pub use server::MockServer;
