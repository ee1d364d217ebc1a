#![forbid(unsafe_code)]

//! Core: geometry primitives, viewport sanitization, and typed host events.
//!
//! Everything else in the workspace trusts the output of
//! [`viewport::sanitize`]: dimensions leaving this crate are finite,
//! positive, and inside [`viewport::MIN_DIMENSION`]..=[`viewport::MAX_DIMENSION`].

pub mod event;
pub mod geometry;
pub mod logging;
pub mod viewport;

pub use web_time::Instant;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, error, info, trace, warn};
