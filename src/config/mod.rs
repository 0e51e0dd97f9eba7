//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, environment overrides)
//!     → validation.rs (semantic checks)
//!     → MockConfig (validated, immutable)
//!     → handed to the server and telemetry at startup
//! ```
//!
//! The webhook URL is the only setting that changes at runtime; it lives in
//! the delivery client, not here.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AuthConfig, BusinessConfig, ListenerConfig, LogFormat, MockConfig, ObservabilityConfig,
    RateLimitConfig, RetryConfig, SimulationConfig, TlsConfig, TracingConfig, WebhookConfig,
};
