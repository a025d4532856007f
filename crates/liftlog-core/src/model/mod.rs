//! Ownership-hierarchy domain model
//!
//! ```text
//! User ──< WorkoutRoutine ──< ExerciseRoutine
//! User ──< WorkoutSession ──< Exercise ──< SetEntry
//! WorkoutSession ──> WorkoutRoutine (reference, not ownership)
//! ```

mod entities;
mod ids;
mod principal;

pub use entities::{
    Exercise, ExerciseRoutine, NewExerciseRoutine, SetEntry, User, WorkoutRoutine, WorkoutSession,
};
pub use ids::{RowId, UserId};
pub use principal::Principal;
