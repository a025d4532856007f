//! liftlog store - SQLite persistence for the ownership hierarchy
//!
//! Provides:
//! - Connection handling and embedded, checksummed migrations
//! - Rendering of ownership paths into single-statement SQL checks
//! - `SqliteBackend`, the shared handle the access check and loaders read through
//! - Repository functions with cascading soft deletes and batched child reads

pub mod backend;
pub mod db;
pub mod errors;
pub mod migrations;
pub mod ownership;
pub mod repo;

// Re-export key types
pub use backend::SqliteBackend;
pub use errors::Result;
pub use repo::{ExerciseRoutinesByRoutine, ExercisesBySession, SetsByExercise, SqliteRepo};
