//! Ownership paths rendered as SQL
//!
//! One statement per check: the terminal id and the owner column are matched
//! in the same `WHERE`, and every joined row must be live.

use std::fmt::Write;

use liftlog_core::{OwnershipPath, RowId, UserId};
use rusqlite::{Connection, OptionalExtension};

use crate::errors::{from_rusqlite, Result};

/// Render `path` as a `SELECT 1 ... LIMIT 1` taking `?1` = resource id and
/// `?2` = principal id
///
/// Table and column names come from the static path catalog, never from input.
pub fn ownership_sql(path: &OwnershipPath) -> String {
    let hops = path.hops();
    let mut sql = format!("SELECT 1 FROM {} AS t0", hops[0].table);

    for (i, pair) in hops.windows(2).enumerate() {
        let (child, parent) = (&pair[0], &pair[1]);
        let _ = write!(
            sql,
            " JOIN {table} AS t{p} ON t{p}.id = t{c}.{fk} AND t{p}.deleted_at IS NULL",
            table = parent.table,
            p = i + 1,
            c = i,
            fk = child.parent_column,
        );
    }

    let root = hops.len() - 1;
    let _ = write!(
        sql,
        " WHERE t0.id = ?1 AND t0.deleted_at IS NULL AND t{root}.{owner} = ?2 LIMIT 1",
        root = root,
        owner = path.root().parent_column,
    );
    sql
}

/// Run the ownership check for one resource
pub fn owns(
    conn: &Connection,
    path: &OwnershipPath,
    principal: UserId,
    resource: RowId,
) -> Result<bool> {
    let mut stmt = conn
        .prepare_cached(&ownership_sql(path))
        .map_err(from_rusqlite)?;

    let hit = stmt
        .query_row(rusqlite::params![resource.get(), principal.get()], |_| Ok(()))
        .optional()
        .map_err(from_rusqlite)?;

    Ok(hit.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use liftlog_core::ChainShape;

    #[test]
    fn test_direct_ownership_sql() {
        let sql = ownership_sql(ChainShape::WorkoutRoutine.path());
        assert_eq!(
            sql,
            "SELECT 1 FROM workout_routines AS t0 \
             WHERE t0.id = ?1 AND t0.deleted_at IS NULL AND t0.user_id = ?2 LIMIT 1"
        );
    }

    #[test]
    fn test_two_hop_sql_joins_through_exercises() {
        let sql = ownership_sql(ChainShape::SetEntry.path());
        assert_eq!(
            sql,
            "SELECT 1 FROM set_entries AS t0 \
             JOIN exercises AS t1 ON t1.id = t0.exercise_id AND t1.deleted_at IS NULL \
             JOIN workout_sessions AS t2 ON t2.id = t1.workout_session_id AND t2.deleted_at IS NULL \
             WHERE t0.id = ?1 AND t0.deleted_at IS NULL AND t2.user_id = ?2 LIMIT 1"
        );
    }

    #[test]
    fn test_every_shape_prepares_against_schema() {
        let mut conn = Connection::open_in_memory().unwrap();
        crate::migrations::apply_migrations(&mut conn).unwrap();
        for shape in ChainShape::ALL {
            let owned = owns(&conn, shape.path(), UserId::new(1), RowId::new(1)).unwrap();
            assert!(!owned, "{} on an empty database", shape);
        }
    }
}
