use liftlog_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using LiftError
pub type Result<T> = std::result::Result<T, LiftError>;

/// What callers see for any storage failure; the detail goes to logs only
pub const STORAGE_FAILURE: &str = "storage operation failed";

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable code used by tests, logs and the outer API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// Malformed identifier or input shape
    InvalidArgument,
    /// Ownership chain did not resolve (also covers "not found")
    AccessDenied,
    /// Storage failure surfaced through the access or loader path
    Backend,
    /// Owning request was cancelled before the work ran
    Cancelled,
    /// Bearer credential missing or rejected
    Unauthenticated,

    // Store internals
    Persistence,
    Io,

    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidArgument => "ERR_INVALID_ARGUMENT",
            ExErrorKind::AccessDenied => "ERR_ACCESS_DENIED",
            ExErrorKind::Backend => "ERR_BACKEND",
            ExErrorKind::Cancelled => "ERR_CANCELLED",
            ExErrorKind::Unauthenticated => "ERR_UNAUTHENTICATED",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification plus optional context for server-side logs.
/// What reaches an end user is decided by the outer layer from `kind()`.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
}

impl ExError {
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context. Never used for `AccessDenied`.
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Failure below the domain layer, whose message may name tables or paths
    pub fn is_storage(&self) -> bool {
        matches!(
            self.kind,
            ExErrorKind::Backend
                | ExErrorKind::Persistence
                | ExErrorKind::Io
                | ExErrorKind::Internal
        )
    }

    /// Swap a storage failure's message for the fixed public one
    pub fn redacted(self) -> Self {
        if self.is_storage() {
            self.with_message(STORAGE_FAILURE)
        } else {
            self
        }
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Domain error taxonomy for access checks and batch loading
///
/// Deliberately flat. `AccessDenied` is returned whether the resource is
/// missing, soft-deleted or owned by someone else, and carries no detail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LiftError {
    /// Malformed identifier or input; reported before any storage call
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Ownership chain did not resolve
    #[error("access denied")]
    AccessDenied,

    /// Storage read failed for a reason other than "no rows"
    ///
    /// `message` holds the driver detail for `Debug` output only.
    #[error("storage operation failed")]
    Backend { message: String },

    /// Owning request was cancelled before the batch dispatched
    #[error("request cancelled")]
    Cancelled,

    /// No principal could be resolved from the presented credential
    #[error("unauthenticated")]
    Unauthenticated,
}

impl LiftError {
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        LiftError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Wrap a storage failure. Callers log the detail themselves.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        LiftError::Backend {
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ExErrorKind {
        match self {
            LiftError::InvalidArgument { .. } => ExErrorKind::InvalidArgument,
            LiftError::AccessDenied => ExErrorKind::AccessDenied,
            LiftError::Backend { .. } => ExErrorKind::Backend,
            LiftError::Cancelled => ExErrorKind::Cancelled,
            LiftError::Unauthenticated => ExErrorKind::Unauthenticated,
        }
    }
}

impl From<LiftError> for ExError {
    fn from(err: LiftError) -> Self {
        let kind = err.kind();
        match err {
            LiftError::InvalidArgument { reason } => ExError::new(kind).with_message(reason),
            LiftError::AccessDenied => ExError::new(kind).with_message("access denied"),
            LiftError::Backend { .. } => ExError::new(kind).with_message(STORAGE_FAILURE),
            LiftError::Cancelled => ExError::new(kind).with_message("request cancelled"),
            LiftError::Unauthenticated => ExError::new(kind).with_message("unauthenticated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_unique() {
        let kinds = [
            ExErrorKind::InvalidArgument,
            ExErrorKind::AccessDenied,
            ExErrorKind::Backend,
            ExErrorKind::Cancelled,
            ExErrorKind::Unauthenticated,
            ExErrorKind::Persistence,
            ExErrorKind::Io,
            ExErrorKind::Internal,
        ];
        let mut codes: Vec<_> = kinds.iter().map(|k| k.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
    }

    #[test]
    fn test_access_denied_conversion_carries_no_detail() {
        let ex: ExError = LiftError::AccessDenied.into();
        assert_eq!(ex.kind(), ExErrorKind::AccessDenied);
        assert_eq!(ex.code(), "ERR_ACCESS_DENIED");
        assert_eq!(ex.entity_id(), None);
        assert_eq!(ex.message(), "access denied");
    }

    #[test]
    fn test_backend_conversion_hides_driver_detail() {
        let err = LiftError::backend("disk I/O error at /var/lib/liftlog/store.db");
        assert!(!err.to_string().contains("disk I/O error"));

        let ex: ExError = err.into();
        assert_eq!(ex.kind(), ExErrorKind::Backend);
        assert_eq!(ex.message(), STORAGE_FAILURE);
        assert!(!ex.to_string().contains("/var/lib"));
    }

    #[test]
    fn test_redacted_only_touches_storage_kinds() {
        let ex = ExError::new(ExErrorKind::Persistence)
            .with_op("sqlite")
            .with_message("no such table: exercises")
            .redacted();
        assert_eq!(ex.message(), STORAGE_FAILURE);
        assert_eq!(ex.op(), Some("sqlite"));

        let invalid = ExError::new(ExErrorKind::InvalidArgument)
            .with_message("name too short")
            .redacted();
        assert_eq!(invalid.message(), "name too short");
    }

    #[test]
    fn test_display_includes_code_op_and_entity() {
        let ex = ExError::new(ExErrorKind::Persistence)
            .with_op("sqlite")
            .with_entity_id("exercise:4")
            .with_message("locked");
        let s = ex.to_string();
        assert!(s.starts_with("[ERR_PERSISTENCE]"));
        assert!(s.contains("'sqlite'"));
        assert!(s.contains("exercise:4"));
    }
}
