use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{RowId, UserId};

/// Account at the root of every ownership chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A named plan owned directly by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutRoutine {
    pub id: RowId,
    pub user_id: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A planned exercise inside a workout routine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRoutine {
    pub id: RowId,
    pub workout_routine_id: RowId,
    pub name: String,
    pub sets: u32,
    pub reps: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// An exercise routine to create together with its parent routine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExerciseRoutine {
    pub name: String,
    pub sets: u32,
    pub reps: u32,
}

/// One performed workout. `workout_routine_id` is a reference, not an
/// ownership link: deleting the routine leaves the session reachable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSession {
    pub id: RowId,
    pub user_id: UserId,
    pub workout_routine_id: RowId,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// An exercise performed during a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: RowId,
    pub workout_session_id: RowId,
    pub exercise_routine_id: RowId,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A single set of an exercise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetEntry {
    pub id: RowId,
    pub exercise_id: RowId,
    pub weight: f32,
    pub reps: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

macro_rules! soft_deletable {
    ($($ty:ty),+) => {
        $(
            impl $ty {
                /// Soft-deleted rows are excluded from ownership resolution
                pub fn is_deleted(&self) -> bool {
                    self.deleted_at.is_some()
                }
            }
        )+
    };
}

soft_deletable!(WorkoutRoutine, ExerciseRoutine, WorkoutSession, Exercise, SetEntry);
