//! Workout routines and their exercise routines

use liftlog_core::model::{ExerciseRoutine, NewExerciseRoutine, WorkoutRoutine};
use liftlog_core::ChainShape;
use liftlog_store::errors::Result;
use liftlog_store::SqliteRepo;
use serde::Serialize;

use crate::resolver::{invalid, vanished, RequestScope, Resolver};

/// A routine together with its live exercise routines
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutineWithExerciseRoutines {
    #[serde(flatten)]
    pub routine: WorkoutRoutine,
    pub exercise_routines: Vec<ExerciseRoutine>,
}

/// Routine names must be longer than two characters
fn validate_routine_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.chars().count() <= 2 {
        return Err(invalid("routine name must be longer than 2 characters"));
    }
    Ok(name.to_string())
}

fn validate_exercise_routine(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid("exercise routine name must not be empty"));
    }
    Ok(name.to_string())
}

impl Resolver {
    /// Create a routine owned by the caller
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the name is two characters or shorter.
    pub async fn create_workout_routine(
        &self,
        scope: &RequestScope,
        name: &str,
    ) -> Result<WorkoutRoutine> {
        self.instrumented("create_workout_routine", scope, async {
            let name = validate_routine_name(name)?;
            let user = scope.user_id();
            self.backend()
                .run_blocking(move |conn| SqliteRepo::insert_workout_routine(conn, user, &name))
                .await
        })
        .await
    }

    /// Create a routine and its exercise routines in one write
    ///
    /// Every input is validated before anything is stored; either the whole
    /// tree is created or nothing is.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the routine name is two characters or shorter or
    /// any exercise routine name is blank.
    pub async fn create_workout_routine_with_exercises(
        &self,
        scope: &RequestScope,
        name: &str,
        exercise_routines: &[NewExerciseRoutine],
    ) -> Result<RoutineWithExerciseRoutines> {
        self.instrumented("create_workout_routine_with_exercises", scope, async {
            let name = validate_routine_name(name)?;
            let children = exercise_routines
                .iter()
                .map(|er| {
                    Ok(NewExerciseRoutine {
                        name: validate_exercise_routine(&er.name)?,
                        sets: er.sets,
                        reps: er.reps,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let user = scope.user_id();
            let (routine, exercise_routines) = self
                .backend()
                .run_blocking(move |conn| {
                    SqliteRepo::insert_workout_routine_with_exercises(conn, user, &name, &children)
                })
                .await?;
            Ok(RoutineWithExerciseRoutines {
                routine,
                exercise_routines,
            })
        })
        .await
    }

    /// The caller's live routines
    ///
    /// # Errors
    ///
    /// `Persistence` on storage failure.
    pub async fn workout_routines(&self, scope: &RequestScope) -> Result<Vec<WorkoutRoutine>> {
        self.instrumented("workout_routines", scope, async {
            let user = scope.user_id();
            self.backend()
                .run_blocking(move |conn| SqliteRepo::list_workout_routines(conn, user))
                .await
        })
        .await
    }

    /// # Errors
    ///
    /// `AccessDenied` unless the caller owns the routine; `InvalidArgument`
    /// for a malformed id or name.
    pub async fn update_workout_routine(
        &self,
        scope: &RequestScope,
        routine_id: &str,
        name: &str,
    ) -> Result<WorkoutRoutine> {
        self.instrumented("update_workout_routine", scope, async {
            let id = self.authorize(scope, ChainShape::WorkoutRoutine, routine_id).await?;
            let name = validate_routine_name(name)?;
            self.backend()
                .run_blocking(move |conn| {
                    if !SqliteRepo::rename_workout_routine(conn, id, &name)? {
                        return Err(vanished());
                    }
                    SqliteRepo::get_workout_routine(conn, id)?.ok_or_else(vanished)
                })
                .await
        })
        .await
    }

    /// Soft-delete a routine and its exercise routines
    ///
    /// # Errors
    ///
    /// `AccessDenied` unless the caller owns the routine.
    pub async fn delete_workout_routine(
        &self,
        scope: &RequestScope,
        routine_id: &str,
    ) -> Result<()> {
        self.instrumented("delete_workout_routine", scope, async {
            let id = self.authorize(scope, ChainShape::WorkoutRoutine, routine_id).await?;
            self.backend()
                .run_blocking(move |conn| {
                    if SqliteRepo::soft_delete_workout_routine(conn, id)? {
                        Ok(())
                    } else {
                        Err(vanished())
                    }
                })
                .await
        })
        .await
    }

    /// # Errors
    ///
    /// `AccessDenied` unless the caller owns the parent routine.
    pub async fn add_exercise_routine(
        &self,
        scope: &RequestScope,
        routine_id: &str,
        name: &str,
        sets: u32,
        reps: u32,
    ) -> Result<ExerciseRoutine> {
        self.instrumented("add_exercise_routine", scope, async {
            let routine = self.authorize(scope, ChainShape::WorkoutRoutine, routine_id).await?;
            let name = validate_exercise_routine(name)?;
            self.backend()
                .run_blocking(move |conn| {
                    SqliteRepo::insert_exercise_routine(conn, routine, &name, sets, reps)
                })
                .await
        })
        .await
    }

    /// Exercise routines of one routine
    ///
    /// # Errors
    ///
    /// `AccessDenied` unless the caller owns the routine.
    pub async fn exercise_routines(
        &self,
        scope: &RequestScope,
        routine_id: &str,
    ) -> Result<Vec<ExerciseRoutine>> {
        self.instrumented("exercise_routines", scope, async {
            let routine = self.authorize(scope, ChainShape::WorkoutRoutine, routine_id).await?;
            self.backend()
                .run_blocking(move |conn| SqliteRepo::list_exercise_routines(conn, routine))
                .await
        })
        .await
    }

    /// # Errors
    ///
    /// `AccessDenied` unless the caller owns the exercise routine's parent.
    pub async fn update_exercise_routine(
        &self,
        scope: &RequestScope,
        exercise_routine_id: &str,
        name: &str,
        sets: u32,
        reps: u32,
    ) -> Result<ExerciseRoutine> {
        self.instrumented("update_exercise_routine", scope, async {
            let id = self
                .authorize(scope, ChainShape::ExerciseRoutine, exercise_routine_id)
                .await?;
            let name = validate_exercise_routine(name)?;
            self.backend()
                .run_blocking(move |conn| {
                    if !SqliteRepo::update_exercise_routine(conn, id, &name, sets, reps)? {
                        return Err(vanished());
                    }
                    SqliteRepo::get_exercise_routine(conn, id)?.ok_or_else(vanished)
                })
                .await
        })
        .await
    }

    /// # Errors
    ///
    /// `AccessDenied` unless the caller owns the exercise routine's parent.
    pub async fn delete_exercise_routine(
        &self,
        scope: &RequestScope,
        exercise_routine_id: &str,
    ) -> Result<()> {
        self.instrumented("delete_exercise_routine", scope, async {
            let id = self
                .authorize(scope, ChainShape::ExerciseRoutine, exercise_routine_id)
                .await?;
            self.backend()
                .run_blocking(move |conn| {
                    if SqliteRepo::soft_delete_exercise_routine(conn, id)? {
                        Ok(())
                    } else {
                        Err(vanished())
                    }
                })
                .await
        })
        .await
    }

    /// Field resolver: exercise routines of a routine returned by an earlier
    /// operation in this request, served by the request's loader
    ///
    /// # Errors
    ///
    /// `AccessDenied` if the routine belongs to someone else; `Backend` or
    /// `Cancelled` from the loader.
    pub async fn routine_exercise_routines(
        &self,
        scope: &RequestScope,
        routine: &WorkoutRoutine,
    ) -> Result<Vec<ExerciseRoutine>> {
        self.instrumented("routine_exercise_routines", scope, async {
            if routine.user_id != scope.user_id() {
                return Err(vanished());
            }
            let loaded = scope.loaders().exercise_routines.load_and_dispatch(routine.id).await?;
            Ok(loaded.as_ref().clone())
        })
        .await
    }
}
