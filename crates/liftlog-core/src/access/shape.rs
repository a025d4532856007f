//! Chain shapes: the closed catalog of ownership relations
//!
//! Each shape carries its join path as static data. The storage backend
//! renders the path into one query; nothing here knows SQL.

use std::fmt;
use std::str::FromStr;

use crate::errors::LiftError;

/// One table in an ownership path
///
/// `parent_column` is the foreign key pointing at the next hop's `id`, or,
/// on the last hop, the column holding the owning user's id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub table: &'static str,
    pub parent_column: &'static str,
}

/// Ordered hops from the terminal resource up to the owning user
///
/// `hops[0]` is the table the resource id refers to. Every table in the path
/// has `id` and `deleted_at` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OwnershipPath {
    hops: &'static [Hop],
}

impl OwnershipPath {
    /// # Panics
    ///
    /// Panics at compile time (const context) if `hops` is empty.
    pub const fn new(hops: &'static [Hop]) -> Self {
        assert!(!hops.is_empty(), "an ownership path needs at least one hop");
        Self { hops }
    }

    pub fn hops(&self) -> &'static [Hop] {
        self.hops
    }

    /// Table holding the resource being checked
    pub fn terminal(&self) -> &'static Hop {
        &self.hops[0]
    }

    /// Table holding the owner column
    pub fn root(&self) -> &'static Hop {
        &self.hops[self.hops.len() - 1]
    }

    /// Number of intermediate joins
    pub fn joins(&self) -> usize {
        self.hops.len() - 1
    }
}

static WORKOUT_ROUTINE: OwnershipPath = OwnershipPath::new(&[Hop {
    table: "workout_routines",
    parent_column: "user_id",
}]);

static EXERCISE_ROUTINE: OwnershipPath = OwnershipPath::new(&[
    Hop {
        table: "exercise_routines",
        parent_column: "workout_routine_id",
    },
    Hop {
        table: "workout_routines",
        parent_column: "user_id",
    },
]);

static WORKOUT_SESSION: OwnershipPath = OwnershipPath::new(&[Hop {
    table: "workout_sessions",
    parent_column: "user_id",
}]);

static EXERCISE: OwnershipPath = OwnershipPath::new(&[
    Hop {
        table: "exercises",
        parent_column: "workout_session_id",
    },
    Hop {
        table: "workout_sessions",
        parent_column: "user_id",
    },
]);

static SET_ENTRY: OwnershipPath = OwnershipPath::new(&[
    Hop {
        table: "set_entries",
        parent_column: "exercise_id",
    },
    Hop {
        table: "exercises",
        parent_column: "workout_session_id",
    },
    Hop {
        table: "workout_sessions",
        parent_column: "user_id",
    },
]);

/// Closed set of ownership chains. Add a variant only when a new ownership
/// relation is introduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainShape {
    WorkoutRoutine,
    ExerciseRoutine,
    WorkoutSession,
    Exercise,
    SetEntry,
}

impl ChainShape {
    pub const ALL: [ChainShape; 5] = [
        ChainShape::WorkoutRoutine,
        ChainShape::ExerciseRoutine,
        ChainShape::WorkoutSession,
        ChainShape::Exercise,
        ChainShape::SetEntry,
    ];

    pub fn path(self) -> &'static OwnershipPath {
        match self {
            ChainShape::WorkoutRoutine => &WORKOUT_ROUTINE,
            ChainShape::ExerciseRoutine => &EXERCISE_ROUTINE,
            ChainShape::WorkoutSession => &WORKOUT_SESSION,
            ChainShape::Exercise => &EXERCISE,
            ChainShape::SetEntry => &SET_ENTRY,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChainShape::WorkoutRoutine => "workout-routine",
            ChainShape::ExerciseRoutine => "exercise-routine",
            ChainShape::WorkoutSession => "workout-session",
            ChainShape::Exercise => "exercise",
            ChainShape::SetEntry => "set-entry",
        }
    }

    /// Hops between the resource and the owner column (0 for direct ownership)
    pub fn depth(self) -> usize {
        self.path().joins()
    }
}

impl fmt::Display for ChainShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainShape {
    type Err = LiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChainShape::ALL
            .into_iter()
            .find(|shape| shape.as_str() == s)
            .ok_or_else(|| LiftError::invalid_argument(format!("unknown chain shape '{}'", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depths() {
        assert_eq!(ChainShape::WorkoutRoutine.depth(), 0);
        assert_eq!(ChainShape::WorkoutSession.depth(), 0);
        assert_eq!(ChainShape::ExerciseRoutine.depth(), 1);
        assert_eq!(ChainShape::Exercise.depth(), 1);
        assert_eq!(ChainShape::SetEntry.depth(), 2);
    }

    #[test]
    fn test_every_path_ends_at_user_id() {
        for shape in ChainShape::ALL {
            assert_eq!(shape.path().root().parent_column, "user_id", "{}", shape);
        }
    }

    #[test]
    fn test_consecutive_hops_link_up() {
        // A hop's parent column names the next table in singular form plus `_id`.
        for shape in ChainShape::ALL {
            for pair in shape.path().hops().windows(2) {
                let expected = format!("{}_id", pair[1].table.trim_end_matches('s'));
                assert_eq!(pair[0].parent_column, expected, "{}", shape);
            }
        }
    }

    #[test]
    fn test_names_round_trip() {
        for shape in ChainShape::ALL {
            assert_eq!(shape.as_str().parse::<ChainShape>(), Ok(shape));
        }
        assert!("routine".parse::<ChainShape>().is_err());
    }
}
