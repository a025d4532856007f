//! Batch fetchers backing the request-scoped loaders
//!
//! Each fetcher answers one `BatchFn` call with a single `IN (...)` query and
//! groups the rows by parent id.

use std::collections::HashMap;

use async_trait::async_trait;
use liftlog_core::model::{Exercise, ExerciseRoutine, SetEntry};
use liftlog_core::{BatchFn, LiftError, RowId};
use rusqlite::Connection;

use crate::backend::SqliteBackend;
use crate::errors::Result;
use crate::repo::SqliteRepo;

/// Fetch rows for `keys` on the blocking pool and group them by parent
async fn fetch_grouped<T, Q, P>(
    backend: &SqliteBackend,
    what: &'static str,
    keys: &[RowId],
    query: Q,
    parent_of: P,
) -> liftlog_core::Result<HashMap<RowId, Vec<T>>>
where
    T: Send + 'static,
    Q: FnOnce(&Connection, &[RowId]) -> Result<Vec<T>> + Send + 'static,
    P: Fn(&T) -> RowId,
{
    let keys = keys.to_vec();
    let rows = backend
        .run_blocking(move |conn| query(conn, &keys))
        .await
        .map_err(|e| {
            tracing::error!(
                fetch = what,
                err.kind = ?e.kind(),
                err.code = e.code(),
                error = %e,
                "batched read failed"
            );
            LiftError::backend(e)
        })?;

    let mut grouped: HashMap<RowId, Vec<T>> = HashMap::new();
    for row in rows {
        grouped.entry(parent_of(&row)).or_default().push(row);
    }
    Ok(grouped)
}

/// Exercises keyed by workout session
#[derive(Debug, Clone)]
pub struct ExercisesBySession {
    backend: SqliteBackend,
}

impl ExercisesBySession {
    pub fn new(backend: SqliteBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl BatchFn for ExercisesBySession {
    type Key = RowId;
    type Value = Exercise;

    async fn load(&self, keys: &[RowId]) -> liftlog_core::Result<HashMap<RowId, Vec<Exercise>>> {
        fetch_grouped(
            &self.backend,
            "exercises_by_session",
            keys,
            |conn, keys| SqliteRepo::exercises_for_sessions(conn, keys),
            |e: &Exercise| e.workout_session_id,
        )
        .await
    }
}

/// Sets keyed by exercise
#[derive(Debug, Clone)]
pub struct SetsByExercise {
    backend: SqliteBackend,
}

impl SetsByExercise {
    pub fn new(backend: SqliteBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl BatchFn for SetsByExercise {
    type Key = RowId;
    type Value = SetEntry;

    async fn load(&self, keys: &[RowId]) -> liftlog_core::Result<HashMap<RowId, Vec<SetEntry>>> {
        fetch_grouped(
            &self.backend,
            "sets_by_exercise",
            keys,
            |conn, keys| SqliteRepo::sets_for_exercises(conn, keys),
            |s: &SetEntry| s.exercise_id,
        )
        .await
    }
}

/// Exercise routines keyed by workout routine
#[derive(Debug, Clone)]
pub struct ExerciseRoutinesByRoutine {
    backend: SqliteBackend,
}

impl ExerciseRoutinesByRoutine {
    pub fn new(backend: SqliteBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl BatchFn for ExerciseRoutinesByRoutine {
    type Key = RowId;
    type Value = ExerciseRoutine;

    async fn load(
        &self,
        keys: &[RowId],
    ) -> liftlog_core::Result<HashMap<RowId, Vec<ExerciseRoutine>>> {
        fetch_grouped(
            &self.backend,
            "exercise_routines_by_routine",
            keys,
            |conn, keys| SqliteRepo::exercise_routines_for_routines(conn, keys),
            |r: &ExerciseRoutine| r.workout_routine_id,
        )
        .await
    }
}
