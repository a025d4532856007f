//! liftlog core - ownership model and authorization primitives
//!
//! This crate has no I/O of its own. It provides:
//! - The ownership-hierarchy domain model (routines, sessions, exercises, sets)
//! - The Access Control Service, which proves or disproves transitive
//!   ownership of a resource with a single storage read per check
//! - A request-scoped, single-flight `BatchLoader` for hydrating child
//!   collections without one query per parent
//! - The error and logging facilities shared by the store and engine crates

pub mod access;
pub mod errors;
pub mod loader;
pub mod logging_facility;
pub mod model;
pub mod principal;

// Re-export commonly used types
pub use access::{AccessControlService, ChainShape, OwnershipPath, OwnershipReader};
pub use errors::{ExError, ExErrorKind, LiftError, Result};
pub use loader::{BatchFn, BatchLoader, LoaderConfig};
pub use model::{Principal, RowId, UserId};
pub use principal::{bearer_token, PrincipalResolver};
pub use liftlog_core_types::schema;
