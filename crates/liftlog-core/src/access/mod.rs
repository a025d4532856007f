//! Access Control Service
//!
//! Answers one question: does a principal own a resource, directly or through
//! a chain of parents? Each check is a single storage read parameterized by a
//! [`ChainShape`]. Missing, soft-deleted and foreign-owned resources all yield
//! the same `AccessDenied`.

mod service;
mod shape;

pub use service::AccessControlService;
pub use shape::{ChainShape, Hop, OwnershipPath};

use std::sync::Arc;

use crate::errors::ExError;
use crate::model::{RowId, UserId};

/// Storage read path used by the access check
///
/// Implementations must answer with exactly one read that matches the
/// terminal id and the owner column together, and must skip soft-deleted rows
/// at every hop. `Ok(false)` means no row matched; `Err` is reserved for
/// failures other than "no rows".
pub trait OwnershipReader: Send + Sync {
    fn owns(
        &self,
        path: &OwnershipPath,
        principal: UserId,
        resource: RowId,
    ) -> Result<bool, ExError>;
}

impl<T: OwnershipReader + ?Sized> OwnershipReader for &T {
    fn owns(
        &self,
        path: &OwnershipPath,
        principal: UserId,
        resource: RowId,
    ) -> Result<bool, ExError> {
        (**self).owns(path, principal, resource)
    }
}

impl<T: OwnershipReader + ?Sized> OwnershipReader for Arc<T> {
    fn owns(
        &self,
        path: &OwnershipPath,
        principal: UserId,
        resource: RowId,
    ) -> Result<bool, ExError> {
        (**self).owns(path, principal, resource)
    }
}
