//! Resolver and per-request scope

use std::future::Future;
use std::time::Instant;

use liftlog_core::errors::{ExError, ExErrorKind};
use liftlog_core::{
    bearer_token, log_op_end, log_op_error, log_op_start, AccessControlService, ChainShape,
    LiftError, LoaderConfig, Principal, PrincipalResolver, RowId, UserId,
};
use liftlog_core_types::RequestContext;
use liftlog_store::errors::Result;
use liftlog_store::SqliteBackend;

use crate::loaders::Loaders;

/// Entry point for every authenticated operation
///
/// Holds only injected handles; build one per process and clone freely.
#[derive(Debug, Clone)]
pub struct Resolver {
    backend: SqliteBackend,
    acs: AccessControlService<SqliteBackend>,
    loader_config: LoaderConfig,
}

/// Everything one request carries: who is asking, its correlation and
/// cancellation, and its private loaders
#[derive(Debug)]
pub struct RequestScope {
    principal: Principal,
    ctx: RequestContext,
    loaders: Loaders,
}

impl RequestScope {
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn user_id(&self) -> UserId {
        self.principal.id
    }

    pub fn ctx(&self) -> &RequestContext {
        &self.ctx
    }

    pub fn loaders(&self) -> &Loaders {
        &self.loaders
    }

    /// Abandon all deferred work of this request
    pub fn cancel(&self) {
        self.ctx.cancel();
    }
}

impl Resolver {
    pub fn new(backend: SqliteBackend, loader_config: LoaderConfig) -> Self {
        Self {
            acs: AccessControlService::new(backend.clone()),
            backend,
            loader_config,
        }
    }

    pub fn backend(&self) -> &SqliteBackend {
        &self.backend
    }

    pub fn acs(&self) -> &AccessControlService<SqliteBackend> {
        &self.acs
    }

    /// Open a scope for an already resolved principal
    pub fn scope(&self, principal: Principal, ctx: RequestContext) -> RequestScope {
        let loaders = Loaders::new(&self.backend, ctx.cancellation(), self.loader_config);
        RequestScope {
            principal,
            ctx,
            loaders,
        }
    }

    /// Resolve the `Authorization` header and open a scope
    ///
    /// # Errors
    ///
    /// `Unauthenticated` if the header is malformed or the credential is rejected.
    pub fn authenticate<P>(
        &self,
        principals: &P,
        header: &str,
        ctx: RequestContext,
    ) -> Result<RequestScope>
    where
        P: PrincipalResolver + ?Sized,
    {
        let principal = bearer_token(header)
            .and_then(|token| principals.resolve(&token))
            .and_then(|principal| {
                if principal.id.is_valid() {
                    Ok(principal)
                } else {
                    Err(LiftError::Unauthenticated)
                }
            })
            .map_err(|e| {
                tracing::debug!(
                    request_id = ctx.request_id.as_str(),
                    error = %e,
                    "authentication failed"
                );
                ExError::from(e).with_request_id(ctx.request_id.clone())
            })?;

        Ok(self.scope(principal, ctx))
    }

    /// Run the ownership check off the async runtime and return the parsed id
    pub(crate) async fn authorize(
        &self,
        scope: &RequestScope,
        shape: ChainShape,
        resource_id: &str,
    ) -> Result<RowId> {
        let acs = self.acs.clone();
        let principal = scope.user_id();
        let id = resource_id.to_string();

        tokio::task::spawn_blocking(move || {
            acs.can_access(shape, principal, &id)?;
            RowId::parse(&id)
        })
        .await
        .map_err(join_error)?
        .map_err(ExError::from)
    }

    /// Bracket an operation with lifecycle logs and attach request context to
    /// any error it returns
    ///
    /// Storage failures are logged in full and returned with a fixed message.
    pub(crate) async fn instrumented<T, Fut>(
        &self,
        op: &'static str,
        scope: &RequestScope,
        fut: Fut,
    ) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        let request_id = scope.ctx().request_id.as_str();
        log_op_start!(op, principal_id = scope.user_id().get(), request_id = request_id);
        let start = Instant::now();

        match fut.await {
            Ok(value) => {
                log_op_end!(
                    op,
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = request_id
                );
                Ok(value)
            }
            Err(err) => {
                let err = err
                    .with_op(op)
                    .with_request_id(scope.ctx().request_id.clone());
                log_op_error!(
                    op,
                    err.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = request_id,
                    error = %err
                );
                Err(err.redacted())
            }
        }
    }
}

/// The row passed the check but was gone by the time it was read
pub(crate) fn vanished() -> ExError {
    LiftError::AccessDenied.into()
}

pub(crate) fn invalid(reason: impl Into<String>) -> ExError {
    LiftError::invalid_argument(reason).into()
}

pub(crate) fn join_error(err: tokio::task::JoinError) -> ExError {
    ExError::new(ExErrorKind::Internal)
        .with_op("spawn_blocking")
        .with_message(err.to_string())
}
