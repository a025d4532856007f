//! Property-based tests for the access check over a generated ownership graph.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use liftlog_core::errors::ExError;
use liftlog_core::{AccessControlService, ChainShape, LiftError, OwnershipPath, OwnershipReader, RowId, UserId};
use proptest::prelude::*;

/// Rows per table: id -> (value of the hop's parent column, soft-deleted)
#[derive(Debug, Clone, Default)]
struct Graph {
    tables: HashMap<&'static str, HashMap<i64, (i64, bool)>>,
    reads: std::sync::Arc<AtomicUsize>,
}

impl Graph {
    fn insert(&mut self, table: &'static str, id: i64, parent: i64, deleted: bool) {
        self.tables.entry(table).or_default().insert(id, (parent, deleted));
    }

    /// Owner reached by following live rows only
    fn live_owner(&self, path: &OwnershipPath, resource: i64) -> Option<i64> {
        let mut id = resource;
        for hop in path.hops() {
            let (parent, deleted) = *self.tables.get(hop.table)?.get(&id)?;
            if deleted {
                return None;
            }
            id = parent;
        }
        Some(id)
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl OwnershipReader for Graph {
    fn owns(&self, path: &OwnershipPath, principal: UserId, resource: RowId) -> Result<bool, ExError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.live_owner(path, resource.get()) == Some(principal.get()))
    }
}

/// A routine/session tree for users 1..=3 with random soft deletes
fn graph_strategy() -> impl Strategy<Value = Graph> {
    let row = (1i64..=3, any::<bool>());
    (
        prop::collection::vec(row.clone(), 1..4),
        prop::collection::vec((0usize..4, any::<bool>()), 0..6),
        prop::collection::vec(row, 1..4),
        prop::collection::vec((0usize..4, any::<bool>()), 0..6),
        prop::collection::vec((0usize..6, any::<bool>()), 0..6),
    )
        .prop_map(|(routines, ex_routines, sessions, exercises, sets)| {
            let mut g = Graph::default();
            for (i, (owner, deleted)) in routines.iter().enumerate() {
                g.insert("workout_routines", i as i64 + 1, *owner, *deleted);
            }
            for (i, (parent, deleted)) in ex_routines.iter().enumerate() {
                let parent = (*parent % routines.len()) as i64 + 1;
                g.insert("exercise_routines", i as i64 + 1, parent, *deleted);
            }
            for (i, (owner, deleted)) in sessions.iter().enumerate() {
                g.insert("workout_sessions", i as i64 + 1, *owner, *deleted);
            }
            for (i, (parent, deleted)) in exercises.iter().enumerate() {
                let parent = (*parent % sessions.len()) as i64 + 1;
                g.insert("exercises", i as i64 + 1, parent, *deleted);
            }
            if !exercises.is_empty() {
                for (i, (parent, deleted)) in sets.iter().enumerate() {
                    let parent = (*parent % exercises.len()) as i64 + 1;
                    g.insert("set_entries", i as i64 + 1, parent, *deleted);
                }
            }
            g
        })
}

fn shape_strategy() -> impl Strategy<Value = ChainShape> {
    prop::sample::select(ChainShape::ALL.to_vec())
}

proptest! {
    #[test]
    fn test_grant_iff_live_chain_reaches_principal(
        graph in graph_strategy(),
        shape in shape_strategy(),
        principal in 1i64..=3,
        resource in 1i64..8,
    ) {
        let acs = AccessControlService::new(&graph);
        let expected = graph.live_owner(shape.path(), resource) == Some(principal);
        let outcome = acs.can_access(shape, UserId::new(principal), &resource.to_string());

        if expected {
            prop_assert_eq!(outcome, Ok(()));
        } else {
            prop_assert_eq!(outcome, Err(LiftError::AccessDenied));
        }
        prop_assert_eq!(graph.reads(), 1);
    }

    #[test]
    fn test_other_principal_always_denied(
        graph in graph_strategy(),
        shape in shape_strategy(),
        resource in 1i64..8,
        other in 1i64..=3,
    ) {
        let acs = AccessControlService::new(&graph);
        if let Some(owner) = graph.live_owner(shape.path(), resource) {
            prop_assume!(owner != other);
            prop_assert_eq!(
                acs.can_access(shape, UserId::new(other), &resource.to_string()),
                Err(LiftError::AccessDenied)
            );
        }
    }

    #[test]
    fn test_repeated_checks_agree(
        graph in graph_strategy(),
        shape in shape_strategy(),
        principal in 1i64..=3,
        resource in 1i64..8,
    ) {
        let acs = AccessControlService::new(&graph);
        let id = resource.to_string();
        let first = acs.can_access(shape, UserId::new(principal), &id);
        let second = acs.can_access(shape, UserId::new(principal), &id);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_non_numeric_ids_never_reach_storage(
        shape in shape_strategy(),
        id in "[a-z\\-\\. ]{1,12}",
    ) {
        let graph = Graph::default();
        let acs = AccessControlService::new(&graph);
        let outcome = acs.can_access(shape, UserId::new(1), &id);
        let is_invalid_argument = matches!(outcome, Err(LiftError::InvalidArgument { .. }));
        prop_assert!(is_invalid_argument);
        prop_assert_eq!(graph.reads(), 0);
    }
}

#[test]
fn test_soft_deleted_and_foreign_are_indistinguishable() {
    let mut graph = Graph::default();
    graph.insert("workout_routines", 5, 1, false);
    graph.insert("exercise_routines", 9, 5, false);
    graph.insert("workout_routines", 6, 1, true);
    graph.insert("exercise_routines", 10, 6, false);
    let acs = AccessControlService::new(&graph);

    let foreign = acs.can_access(ChainShape::ExerciseRoutine, UserId::new(2), "9");
    let deleted_parent = acs.can_access(ChainShape::ExerciseRoutine, UserId::new(1), "10");
    let missing = acs.can_access(ChainShape::ExerciseRoutine, UserId::new(1), "11");

    assert_eq!(foreign, Err(LiftError::AccessDenied));
    assert_eq!(foreign, deleted_parent);
    assert_eq!(foreign, missing);
    assert_eq!(
        format!("{:?}", foreign.unwrap_err()),
        format!("{:?}", deleted_parent.unwrap_err())
    );
}
