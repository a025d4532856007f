//! Authenticated operations over the ownership hierarchy
//!
//! ## Logging Ownership
//!
//! Each public operation is wrapped in `Resolver::instrumented`, which emits
//! `log_op_start!` at entry and `log_op_end!` or `log_op_error!` at exit.
//!
//! ## Access
//!
//! An operation that names an existing resource runs the ownership check for
//! that resource before any read or write of it. A failed check, a missing
//! row and a foreign row all surface as `ERR_ACCESS_DENIED`.

pub mod exercises;
pub mod routines;
pub mod sessions;
pub mod sets;
