//! Mock WhatsApp Business API server library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod security;
pub mod simulation;
pub mod webhook;

pub use config::MockConfig;
pub use http::MockServer;
pub use lifecycle::Shutdown;
