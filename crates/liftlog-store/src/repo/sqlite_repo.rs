//! SQLite repository implementation
//!
//! Plain functions over a borrowed connection. Reads return live rows only.
//! Parent references are written once at insert and never updated.

use chrono::{DateTime, Duration, Utc};
use liftlog_core::model::{
    Exercise, ExerciseRoutine, NewExerciseRoutine, SetEntry, User, WorkoutRoutine, WorkoutSession,
};
use liftlog_core::{RowId, UserId};
use rusqlite::types::Type;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

use crate::errors::{from_rusqlite, Result};

const ROUTINE_COLUMNS: &str = "id, user_id, name, created_at, updated_at, deleted_at";
const EXERCISE_ROUTINE_COLUMNS: &str =
    "id, workout_routine_id, name, sets, reps, created_at, updated_at, deleted_at";
const SESSION_COLUMNS: &str =
    "id, user_id, workout_routine_id, start, \"end\", created_at, updated_at, deleted_at";
const EXERCISE_COLUMNS: &str =
    "id, workout_session_id, exercise_routine_id, notes, created_at, updated_at, deleted_at";
const SET_COLUMNS: &str = "id, exercise_id, weight, reps, created_at, updated_at, deleted_at";

fn millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Drop sub-millisecond precision so returned values match what a read gives back
fn truncate_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    at - Duration::nanoseconds(i64::from(at.timestamp_subsec_nanos() % 1_000_000))
}

fn now_millis() -> (i64, DateTime<Utc>) {
    let at = truncate_millis(Utc::now());
    (millis(at), at)
}

fn parse_millis(idx: usize, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Integer,
            format!("timestamp {ms} out of range").into(),
        )
    })
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    parse_millis(idx, row.get(idx)?)
}

fn opt_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<i64>>(idx)?
        .map(|ms| parse_millis(idx, ms))
        .transpose()
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId::new(row.get(0)?),
        email: row.get(1)?,
        name: row.get(2)?,
        created_at: timestamp(row, 3)?,
    })
}

fn routine_from_row(row: &Row<'_>) -> rusqlite::Result<WorkoutRoutine> {
    Ok(WorkoutRoutine {
        id: RowId::new(row.get(0)?),
        user_id: UserId::new(row.get(1)?),
        name: row.get(2)?,
        created_at: timestamp(row, 3)?,
        updated_at: timestamp(row, 4)?,
        deleted_at: opt_timestamp(row, 5)?,
    })
}

fn exercise_routine_from_row(row: &Row<'_>) -> rusqlite::Result<ExerciseRoutine> {
    Ok(ExerciseRoutine {
        id: RowId::new(row.get(0)?),
        workout_routine_id: RowId::new(row.get(1)?),
        name: row.get(2)?,
        sets: row.get(3)?,
        reps: row.get(4)?,
        created_at: timestamp(row, 5)?,
        updated_at: timestamp(row, 6)?,
        deleted_at: opt_timestamp(row, 7)?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<WorkoutSession> {
    Ok(WorkoutSession {
        id: RowId::new(row.get(0)?),
        user_id: UserId::new(row.get(1)?),
        workout_routine_id: RowId::new(row.get(2)?),
        start: timestamp(row, 3)?,
        end: opt_timestamp(row, 4)?,
        created_at: timestamp(row, 5)?,
        updated_at: timestamp(row, 6)?,
        deleted_at: opt_timestamp(row, 7)?,
    })
}

fn exercise_from_row(row: &Row<'_>) -> rusqlite::Result<Exercise> {
    Ok(Exercise {
        id: RowId::new(row.get(0)?),
        workout_session_id: RowId::new(row.get(1)?),
        exercise_routine_id: RowId::new(row.get(2)?),
        notes: row.get(3)?,
        created_at: timestamp(row, 4)?,
        updated_at: timestamp(row, 5)?,
        deleted_at: opt_timestamp(row, 6)?,
    })
}

fn set_from_row(row: &Row<'_>) -> rusqlite::Result<SetEntry> {
    Ok(SetEntry {
        id: RowId::new(row.get(0)?),
        exercise_id: RowId::new(row.get(1)?),
        weight: row.get(2)?,
        reps: row.get(3)?,
        created_at: timestamp(row, 4)?,
        updated_at: timestamp(row, 5)?,
        deleted_at: opt_timestamp(row, 6)?,
    })
}

/// Run a query and collect every mapped row
fn query_all<T, P, F>(conn: &Connection, sql: &str, params: P, map: F) -> Result<Vec<T>>
where
    P: rusqlite::Params,
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare_cached(sql).map_err(from_rusqlite)?;
    let rows = stmt
        .query_map(params, map)
        .map_err(from_rusqlite)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(from_rusqlite)?;
    Ok(rows)
}

/// Run a query expected to match at most one row
fn query_one<T, P, F>(conn: &Connection, sql: &str, params: P, map: F) -> Result<Option<T>>
where
    P: rusqlite::Params,
    F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare_cached(sql).map_err(from_rusqlite)?;
    let row = stmt
        .query_row(params, map)
        .optional()
        .map_err(from_rusqlite)?;
    Ok(row)
}

/// Live children of many parents in one `IN (...)` query
fn children_of<T, F>(
    conn: &Connection,
    table: &str,
    columns: &str,
    parent_column: &str,
    parents: &[RowId],
    map: F,
) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    if parents.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT {columns} FROM {table} WHERE deleted_at IS NULL AND {parent_column} IN ({}) ORDER BY {parent_column}, id",
        placeholders(parents.len()),
    );
    query_all(conn, &sql, params_from_iter(parents.iter().map(|id| id.get())), map)
}

/// SQLite repository for the ownership hierarchy
pub struct SqliteRepo;

impl SqliteRepo {
    // ---------- users ----------

    pub fn insert_user(conn: &Connection, email: &str, name: &str) -> Result<User> {
        let now = truncate_millis(Utc::now());
        conn.execute(
            "INSERT INTO users (email, name, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![email, name, millis(now)],
        )
        .map_err(from_rusqlite)?;

        Ok(User {
            id: UserId::new(conn.last_insert_rowid()),
            email: email.to_string(),
            name: name.to_string(),
            created_at: now,
        })
    }

    pub fn get_user(conn: &Connection, id: UserId) -> Result<Option<User>> {
        query_one(
            conn,
            "SELECT id, email, name, created_at FROM users WHERE id = ?1",
            [id.get()],
            user_from_row,
        )
    }

    pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
        query_one(
            conn,
            "SELECT id, email, name, created_at FROM users WHERE email = ?1",
            [email],
            user_from_row,
        )
    }

    // ---------- workout routines ----------

    pub fn insert_workout_routine(
        conn: &Connection,
        user_id: UserId,
        name: &str,
    ) -> Result<WorkoutRoutine> {
        let (now, at) = now_millis();
        conn.execute(
            "INSERT INTO workout_routines (user_id, name, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            rusqlite::params![user_id.get(), name, now],
        )
        .map_err(from_rusqlite)?;

        Ok(WorkoutRoutine {
            id: RowId::new(conn.last_insert_rowid()),
            user_id,
            name: name.to_string(),
            created_at: at,
            updated_at: at,
            deleted_at: None,
        })
    }

    /// Insert a routine and its exercise routines in one transaction
    pub fn insert_workout_routine_with_exercises(
        conn: &mut Connection,
        user_id: UserId,
        name: &str,
        exercise_routines: &[NewExerciseRoutine],
    ) -> Result<(WorkoutRoutine, Vec<ExerciseRoutine>)> {
        let tx = conn.transaction().map_err(from_rusqlite)?;

        let routine = Self::insert_workout_routine(&tx, user_id, name)?;
        let children = exercise_routines
            .iter()
            .map(|er| Self::insert_exercise_routine(&tx, routine.id, &er.name, er.sets, er.reps))
            .collect::<Result<Vec<_>>>()?;

        tx.commit().map_err(from_rusqlite)?;
        Ok((routine, children))
    }

    pub fn get_workout_routine(conn: &Connection, id: RowId) -> Result<Option<WorkoutRoutine>> {
        let sql = format!(
            "SELECT {ROUTINE_COLUMNS} FROM workout_routines WHERE id = ?1 AND deleted_at IS NULL"
        );
        query_one(conn, &sql, [id.get()], routine_from_row)
    }

    pub fn list_workout_routines(conn: &Connection, user_id: UserId) -> Result<Vec<WorkoutRoutine>> {
        let sql = format!(
            "SELECT {ROUTINE_COLUMNS} FROM workout_routines WHERE user_id = ?1 AND deleted_at IS NULL ORDER BY id"
        );
        query_all(conn, &sql, [user_id.get()], routine_from_row)
    }

    /// Returns `false` when no live routine has this id
    pub fn rename_workout_routine(conn: &Connection, id: RowId, name: &str) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE workout_routines SET name = ?1, updated_at = ?2 WHERE id = ?3 AND deleted_at IS NULL",
                rusqlite::params![name, millis(Utc::now()), id.get()],
            )
            .map_err(from_rusqlite)?;
        Ok(changed > 0)
    }

    /// Soft-delete a routine and its exercise routines in one transaction
    pub fn soft_delete_workout_routine(conn: &mut Connection, id: RowId) -> Result<bool> {
        let now = millis(Utc::now());
        let tx = conn.transaction().map_err(from_rusqlite)?;

        let changed = tx
            .execute(
                "UPDATE workout_routines SET deleted_at = ?1, updated_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
                rusqlite::params![now, id.get()],
            )
            .map_err(from_rusqlite)?;
        if changed == 0 {
            return Ok(false);
        }

        tx.execute(
            "UPDATE exercise_routines SET deleted_at = ?1, updated_at = ?1 WHERE workout_routine_id = ?2 AND deleted_at IS NULL",
            rusqlite::params![now, id.get()],
        )
        .map_err(from_rusqlite)?;

        tx.commit().map_err(from_rusqlite)?;
        Ok(true)
    }

    // ---------- exercise routines ----------

    pub fn insert_exercise_routine(
        conn: &Connection,
        workout_routine_id: RowId,
        name: &str,
        sets: u32,
        reps: u32,
    ) -> Result<ExerciseRoutine> {
        let (now, at) = now_millis();
        conn.execute(
            "INSERT INTO exercise_routines (workout_routine_id, name, sets, reps, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            rusqlite::params![workout_routine_id.get(), name, sets, reps, now],
        )
        .map_err(from_rusqlite)?;

        Ok(ExerciseRoutine {
            id: RowId::new(conn.last_insert_rowid()),
            workout_routine_id,
            name: name.to_string(),
            sets,
            reps,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        })
    }

    pub fn get_exercise_routine(conn: &Connection, id: RowId) -> Result<Option<ExerciseRoutine>> {
        let sql = format!(
            "SELECT {EXERCISE_ROUTINE_COLUMNS} FROM exercise_routines WHERE id = ?1 AND deleted_at IS NULL"
        );
        query_one(conn, &sql, [id.get()], exercise_routine_from_row)
    }

    pub fn list_exercise_routines(
        conn: &Connection,
        workout_routine_id: RowId,
    ) -> Result<Vec<ExerciseRoutine>> {
        Self::exercise_routines_for_routines(conn, &[workout_routine_id])
    }

    pub fn update_exercise_routine(
        conn: &Connection,
        id: RowId,
        name: &str,
        sets: u32,
        reps: u32,
    ) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE exercise_routines SET name = ?1, sets = ?2, reps = ?3, updated_at = ?4
                 WHERE id = ?5 AND deleted_at IS NULL",
                rusqlite::params![name, sets, reps, millis(Utc::now()), id.get()],
            )
            .map_err(from_rusqlite)?;
        Ok(changed > 0)
    }

    /// Exercises that referenced this routine keep their reference
    pub fn soft_delete_exercise_routine(conn: &Connection, id: RowId) -> Result<bool> {
        let now = millis(Utc::now());
        let changed = conn
            .execute(
                "UPDATE exercise_routines SET deleted_at = ?1, updated_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
                rusqlite::params![now, id.get()],
            )
            .map_err(from_rusqlite)?;
        Ok(changed > 0)
    }

    // ---------- workout sessions ----------

    pub fn insert_workout_session(
        conn: &Connection,
        user_id: UserId,
        workout_routine_id: RowId,
        start: DateTime<Utc>,
    ) -> Result<WorkoutSession> {
        let (now, at) = now_millis();
        conn.execute(
            "INSERT INTO workout_sessions (user_id, workout_routine_id, start, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            rusqlite::params![user_id.get(), workout_routine_id.get(), millis(start), now],
        )
        .map_err(from_rusqlite)?;

        Ok(WorkoutSession {
            id: RowId::new(conn.last_insert_rowid()),
            user_id,
            workout_routine_id,
            start: truncate_millis(start),
            end: None,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        })
    }

    pub fn get_workout_session(conn: &Connection, id: RowId) -> Result<Option<WorkoutSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM workout_sessions WHERE id = ?1 AND deleted_at IS NULL"
        );
        query_one(conn, &sql, [id.get()], session_from_row)
    }

    pub fn list_workout_sessions(conn: &Connection, user_id: UserId) -> Result<Vec<WorkoutSession>> {
        let sql = format!(
            "SELECT {SESSION_COLUMNS} FROM workout_sessions WHERE user_id = ?1 AND deleted_at IS NULL ORDER BY start, id"
        );
        query_all(conn, &sql, [user_id.get()], session_from_row)
    }

    pub fn update_workout_session(
        conn: &Connection,
        id: RowId,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE workout_sessions SET start = ?1, \"end\" = ?2, updated_at = ?3
                 WHERE id = ?4 AND deleted_at IS NULL",
                rusqlite::params![millis(start), end.map(millis), millis(Utc::now()), id.get()],
            )
            .map_err(from_rusqlite)?;
        Ok(changed > 0)
    }

    /// Soft-delete a session, its exercises and their sets in one transaction
    pub fn soft_delete_workout_session(conn: &mut Connection, id: RowId) -> Result<bool> {
        let now = millis(Utc::now());
        let tx = conn.transaction().map_err(from_rusqlite)?;

        let changed = tx
            .execute(
                "UPDATE workout_sessions SET deleted_at = ?1, updated_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
                rusqlite::params![now, id.get()],
            )
            .map_err(from_rusqlite)?;
        if changed == 0 {
            return Ok(false);
        }

        tx.execute(
            "UPDATE set_entries SET deleted_at = ?1, updated_at = ?1
             WHERE deleted_at IS NULL
               AND exercise_id IN (SELECT id FROM exercises WHERE workout_session_id = ?2 AND deleted_at IS NULL)",
            rusqlite::params![now, id.get()],
        )
        .map_err(from_rusqlite)?;
        tx.execute(
            "UPDATE exercises SET deleted_at = ?1, updated_at = ?1 WHERE workout_session_id = ?2 AND deleted_at IS NULL",
            rusqlite::params![now, id.get()],
        )
        .map_err(from_rusqlite)?;

        tx.commit().map_err(from_rusqlite)?;
        Ok(true)
    }

    // ---------- exercises ----------

    pub fn insert_exercise(
        conn: &Connection,
        workout_session_id: RowId,
        exercise_routine_id: RowId,
        notes: &str,
    ) -> Result<Exercise> {
        let (now, at) = now_millis();
        conn.execute(
            "INSERT INTO exercises (workout_session_id, exercise_routine_id, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            rusqlite::params![workout_session_id.get(), exercise_routine_id.get(), notes, now],
        )
        .map_err(from_rusqlite)?;

        Ok(Exercise {
            id: RowId::new(conn.last_insert_rowid()),
            workout_session_id,
            exercise_routine_id,
            notes: notes.to_string(),
            created_at: at,
            updated_at: at,
            deleted_at: None,
        })
    }

    pub fn get_exercise(conn: &Connection, id: RowId) -> Result<Option<Exercise>> {
        let sql = format!(
            "SELECT {EXERCISE_COLUMNS} FROM exercises WHERE id = ?1 AND deleted_at IS NULL"
        );
        query_one(conn, &sql, [id.get()], exercise_from_row)
    }

    pub fn list_exercises(conn: &Connection, workout_session_id: RowId) -> Result<Vec<Exercise>> {
        Self::exercises_for_sessions(conn, &[workout_session_id])
    }

    /// Live exercises of the user's latest session of `workout_routine_id`
    /// that precedes the session at `(start, session_id)`
    ///
    /// Sessions are ordered by start time, then id. Empty when there is no
    /// earlier session.
    pub fn previous_exercises(
        conn: &Connection,
        user_id: UserId,
        workout_routine_id: RowId,
        session_id: RowId,
        start: DateTime<Utc>,
    ) -> Result<Vec<Exercise>> {
        let sql = format!(
            "SELECT {EXERCISE_COLUMNS} FROM exercises
             WHERE deleted_at IS NULL AND workout_session_id = (
                 SELECT id FROM workout_sessions
                 WHERE user_id = ?1 AND workout_routine_id = ?2 AND deleted_at IS NULL
                   AND (start < ?3 OR (start = ?3 AND id < ?4))
                 ORDER BY start DESC, id DESC
                 LIMIT 1
             )
             ORDER BY id"
        );
        query_all(
            conn,
            &sql,
            rusqlite::params![
                user_id.get(),
                workout_routine_id.get(),
                millis(start),
                session_id.get()
            ],
            exercise_from_row,
        )
    }

    pub fn update_exercise(conn: &Connection, id: RowId, notes: &str) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE exercises SET notes = ?1, updated_at = ?2 WHERE id = ?3 AND deleted_at IS NULL",
                rusqlite::params![notes, millis(Utc::now()), id.get()],
            )
            .map_err(from_rusqlite)?;
        Ok(changed > 0)
    }

    /// Soft-delete an exercise and its sets in one transaction
    pub fn soft_delete_exercise(conn: &mut Connection, id: RowId) -> Result<bool> {
        let now = millis(Utc::now());
        let tx = conn.transaction().map_err(from_rusqlite)?;

        let changed = tx
            .execute(
                "UPDATE exercises SET deleted_at = ?1, updated_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
                rusqlite::params![now, id.get()],
            )
            .map_err(from_rusqlite)?;
        if changed == 0 {
            return Ok(false);
        }

        tx.execute(
            "UPDATE set_entries SET deleted_at = ?1, updated_at = ?1 WHERE exercise_id = ?2 AND deleted_at IS NULL",
            rusqlite::params![now, id.get()],
        )
        .map_err(from_rusqlite)?;

        tx.commit().map_err(from_rusqlite)?;
        Ok(true)
    }

    // ---------- sets ----------

    pub fn insert_set(
        conn: &Connection,
        exercise_id: RowId,
        weight: f32,
        reps: u32,
    ) -> Result<SetEntry> {
        let (now, at) = now_millis();
        conn.execute(
            "INSERT INTO set_entries (exercise_id, weight, reps, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            rusqlite::params![exercise_id.get(), weight, reps, now],
        )
        .map_err(from_rusqlite)?;

        Ok(SetEntry {
            id: RowId::new(conn.last_insert_rowid()),
            exercise_id,
            weight,
            reps,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        })
    }

    pub fn get_set(conn: &Connection, id: RowId) -> Result<Option<SetEntry>> {
        let sql = format!("SELECT {SET_COLUMNS} FROM set_entries WHERE id = ?1 AND deleted_at IS NULL");
        query_one(conn, &sql, [id.get()], set_from_row)
    }

    pub fn list_sets(conn: &Connection, exercise_id: RowId) -> Result<Vec<SetEntry>> {
        Self::sets_for_exercises(conn, &[exercise_id])
    }

    pub fn update_set(conn: &Connection, id: RowId, weight: f32, reps: u32) -> Result<bool> {
        let changed = conn
            .execute(
                "UPDATE set_entries SET weight = ?1, reps = ?2, updated_at = ?3 WHERE id = ?4 AND deleted_at IS NULL",
                rusqlite::params![weight, reps, millis(Utc::now()), id.get()],
            )
            .map_err(from_rusqlite)?;
        Ok(changed > 0)
    }

    pub fn soft_delete_set(conn: &Connection, id: RowId) -> Result<bool> {
        let now = millis(Utc::now());
        let changed = conn
            .execute(
                "UPDATE set_entries SET deleted_at = ?1, updated_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
                rusqlite::params![now, id.get()],
            )
            .map_err(from_rusqlite)?;
        Ok(changed > 0)
    }

    // ---------- batched child reads ----------

    /// Live exercises of every given session, ordered by session then id
    pub fn exercises_for_sessions(conn: &Connection, sessions: &[RowId]) -> Result<Vec<Exercise>> {
        children_of(
            conn,
            "exercises",
            EXERCISE_COLUMNS,
            "workout_session_id",
            sessions,
            exercise_from_row,
        )
    }

    pub fn sets_for_exercises(conn: &Connection, exercises: &[RowId]) -> Result<Vec<SetEntry>> {
        children_of(conn, "set_entries", SET_COLUMNS, "exercise_id", exercises, set_from_row)
    }

    pub fn exercise_routines_for_routines(
        conn: &Connection,
        routines: &[RowId],
    ) -> Result<Vec<ExerciseRoutine>> {
        children_of(
            conn,
            "exercise_routines",
            EXERCISE_ROUTINE_COLUMNS,
            "workout_routine_id",
            routines,
            exercise_routine_from_row,
        )
    }
}
