//! Core types shared across the liftlog crates
//!
//! - **Correlation types**: RequestId, TraceId, RequestContext
//! - **Cancellation**: request-scoped cancellation signal
//! - **Sensitive data**: Sensitive<T> marker for automatic redaction
//! - **Schema constants**: Canonical field keys and event names

pub mod cancellation;
pub mod correlation;
pub mod schema;
pub mod sensitive;

pub use cancellation::Cancellation;
pub use correlation::{RequestContext, RequestId, TraceId};
pub use sensitive::Sensitive;
