//! Webhook subsystem.
//!
//! # Data Flow
//! ```text
//! WebhookRequest (domain events)
//!     → transcode.rs (pure mapping into the provider's document)
//!     → WebhookPayload
//!     → client.rs (JSON POST with retries)
//! ```

pub mod client;
pub mod payload;
pub mod transcode;

pub use client::{DeliveryError, DeliveryReceipt, WebhookClient};
pub use payload::WebhookPayload;
pub use transcode::to_webhook_payload;
