//! liftlog engine - resolver layer
//!
//! Every operation takes an explicit `RequestScope` (principal, request
//! context, per-request loaders), runs the ownership check before touching
//! its target, and owns the start/end lifecycle logging for the operation.
//! Lower layers (store, core) use only `tracing::debug!` and `tracing::error!`.

pub mod commands;
pub mod loaders;
pub mod resolver;

pub use commands::routines::RoutineWithExerciseRoutines;
pub use commands::sessions::SessionWithExercises;
pub use loaders::Loaders;
pub use resolver::{RequestScope, Resolver};
