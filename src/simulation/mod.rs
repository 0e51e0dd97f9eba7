//! Simulated provider-side processing.
//!
//! # Data Flow
//! ```text
//! accepted send request
//!     → generators.rs (message id, contact lookup)
//!     → timeline.rs (sent → delivered → read statuses)
//!     → emitter.rs (transcode + deliver, one background task per message)
//! ```

pub mod emitter;
pub mod generators;
pub mod timeline;

pub use emitter::EventEmitter;
pub use generators::{ContactStore, MessageIdGenerator};
pub use timeline::StatusTimeline;
