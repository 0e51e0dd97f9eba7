//! Resilience for outbound calls.
//!
//! Only webhook deliveries leave the process, so this holds the retry policy
//! they use. Inbound requests are never retried.

pub mod retry;

pub use retry::{is_retryable_status, RetryPolicy};
