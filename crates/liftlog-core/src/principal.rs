//! Principal boundary
//!
//! Turning a bearer credential into a `Principal` is an external concern.
//! This module only defines the seam and the header parsing in front of it.

use liftlog_core_types::Sensitive;

use crate::errors::{LiftError, Result};
use crate::model::Principal;

/// Resolves a bearer credential into the caller's identity
pub trait PrincipalResolver: Send + Sync {
    /// # Errors
    ///
    /// `Unauthenticated` when the credential is unknown, expired or malformed.
    fn resolve(&self, bearer: &Sensitive<String>) -> Result<Principal>;
}

impl<T: PrincipalResolver + ?Sized> PrincipalResolver for std::sync::Arc<T> {
    fn resolve(&self, bearer: &Sensitive<String>) -> Result<Principal> {
        (**self).resolve(bearer)
    }
}

/// Extract the token from an `Authorization` header value
///
/// The scheme is matched case-insensitively.
///
/// # Errors
///
/// `Unauthenticated` if the scheme is not `Bearer` or the token is empty.
pub fn bearer_token(header: &str) -> Result<Sensitive<String>> {
    let header = header.trim();
    let (scheme, token) = header.split_once(' ').ok_or(LiftError::Unauthenticated)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(LiftError::Unauthenticated);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(LiftError::Unauthenticated);
    }
    Ok(Sensitive::new(token.to_string()))
}
