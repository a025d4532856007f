//! Redaction wrapper for credentials
//!
//! Bearer tokens travel from the transport to the principal resolver wrapped
//! in `Sensitive<T>` so that no `Debug` or `Display` of a request ever prints
//! them.

use std::fmt;

/// Wrapper that redacts itself in Debug and Display
///
/// # Example
///
/// ```
/// use liftlog_core_types::Sensitive;
///
/// let token = Sensitive::new("eyJhbGciOi...");
/// assert_eq!(format!("{:?}", token), "***REDACTED***");
/// assert_eq!(token.expose(), &"eyJhbGciOi...");
/// ```
#[derive(Clone)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Access the wrapped value. Only the principal resolver should need this.
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***REDACTED***")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***REDACTED***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_redact() {
        let token = Sensitive::new("token-abc");
        assert_eq!(format!("{:?}", token), "***REDACTED***");
        assert_eq!(format!("{}", token), "***REDACTED***");
    }

    #[test]
    fn test_redacts_inside_struct_debug() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Headers {
            request_id: String,
            authorization: Sensitive<String>,
        }

        let headers = Headers {
            request_id: "req-1".to_string(),
            authorization: Sensitive::new("Bearer secret".to_string()),
        };

        let debug_str = format!("{:?}", headers);
        assert!(debug_str.contains("req-1"));
        assert!(!debug_str.contains("secret"));
    }

    #[test]
    fn test_expose_and_into_inner() {
        let token = Sensitive::new(String::from("t"));
        assert_eq!(token.expose(), "t");
        assert_eq!(token.clone().into_inner(), "t");
    }
}
