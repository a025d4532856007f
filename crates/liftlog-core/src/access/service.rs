use crate::errors::{LiftError, Result};
use crate::model::{RowId, UserId};

use super::{ChainShape, OwnershipReader};

/// Stateless ownership checker over an injected storage reader
///
/// Holds no cache. Two calls against unchanged storage give the same answer.
#[derive(Debug, Clone)]
pub struct AccessControlService<R> {
    reader: R,
}

impl<R: OwnershipReader> AccessControlService<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Verify that `principal` owns the resource `resource_id` through `shape`
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the principal is zero or `resource_id` is not a
    ///   base-10 integer. No storage read is issued in that case.
    /// - `AccessDenied` if no live row resolves to the principal.
    /// - `Backend` if the read itself failed.
    pub fn can_access(
        &self,
        shape: ChainShape,
        principal: UserId,
        resource_id: &str,
    ) -> Result<()> {
        let resource = RowId::parse(resource_id)?;
        self.check(shape, principal, resource)
    }

    /// Same as [`can_access`](Self::can_access) for an already parsed id
    ///
    /// # Errors
    ///
    /// See [`can_access`](Self::can_access).
    pub fn check(&self, shape: ChainShape, principal: UserId, resource: RowId) -> Result<()> {
        if !principal.is_valid() {
            return Err(LiftError::invalid_argument("principal id must be nonzero"));
        }

        match self.reader.owns(shape.path(), principal, resource) {
            Ok(true) => {
                tracing::debug!(
                    shape = shape.as_str(),
                    principal_id = principal.get(),
                    resource_id = resource.get(),
                    decision = crate::schema::DECISION_GRANTED,
                    "ownership check"
                );
                Ok(())
            }
            Ok(false) => {
                tracing::debug!(
                    shape = shape.as_str(),
                    principal_id = principal.get(),
                    resource_id = resource.get(),
                    decision = crate::schema::DECISION_DENIED,
                    "ownership check"
                );
                Err(LiftError::AccessDenied)
            }
            Err(e) => {
                tracing::error!(
                    shape = shape.as_str(),
                    principal_id = principal.get(),
                    resource_id = resource.get(),
                    err.kind = ?e.kind(),
                    err.code = e.code(),
                    error = %e,
                    "ownership read failed"
                );
                Err(LiftError::backend(e))
            }
        }
    }
}
