//! Repository layer: row-level persistence and the per-parent batch fetchers

pub mod batch;
pub mod sqlite_repo;

pub use batch::{ExerciseRoutinesByRoutine, ExercisesBySession, SetsByExercise};
pub use sqlite_repo::SqliteRepo;
