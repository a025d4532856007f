//! Canonical schema constants for structured logging
//!
//! Field keys and event names shared by the logging macros, the access
//! control service and the batch loader.

// Canonical field keys
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Access control
pub const FIELD_PRINCIPAL_ID: &str = "principal_id";
pub const FIELD_SHAPE: &str = "shape";
pub const FIELD_DECISION: &str = "decision";

// Batch loading
pub const FIELD_KEY_COUNT: &str = "key_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Access decisions
pub const DECISION_GRANTED: &str = "granted";
pub const DECISION_DENIED: &str = "denied";
