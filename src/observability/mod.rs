//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Every request:
//!     → tracing.rs (OpenTelemetry server span, W3C context extraction)
//!     → logging.rs (structured events inside the `request{request_id, trace_id}` span)
//!     → metrics.rs (request counters and latency, rejections, webhook outcomes)
//!
//! Consumers:
//!     → stdout (JSON or pretty)
//!     → Metrics endpoint (Prometheus scrape)
//!     → OTLP collector (optional)
//! ```

pub mod logging;
pub mod metrics;
pub mod tracing;

pub use self::logging::init_logging;
pub use self::tracing::{init_tracer, ActiveSpan, TelemetryError, TraceStage};
