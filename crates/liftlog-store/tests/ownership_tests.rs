// Ownership checks against a real schema: single-statement joins,
// soft-delete exclusion at every hop, and cascading deletes.

use chrono::Utc;
use liftlog_core::model::{Exercise, ExerciseRoutine, SetEntry, WorkoutRoutine, WorkoutSession};
use liftlog_core::{AccessControlService, ChainShape, LiftError, UserId};
use liftlog_store::{SqliteBackend, SqliteRepo};

struct World {
    backend: SqliteBackend,
    owner: UserId,
    stranger: UserId,
    routine: WorkoutRoutine,
    exercise_routine: ExerciseRoutine,
    session: WorkoutSession,
    exercise: Exercise,
    set: SetEntry,
}

fn setup_world() -> World {
    let backend = SqliteBackend::open_in_memory().unwrap();
    backend
        .with_conn(|conn| {
            let owner = SqliteRepo::insert_user(conn, "u1@example.com", "Owner")?.id;
            let stranger = SqliteRepo::insert_user(conn, "u2@example.com", "Stranger")?.id;
            let routine = SqliteRepo::insert_workout_routine(conn, owner, "Push day")?;
            let exercise_routine =
                SqliteRepo::insert_exercise_routine(conn, routine.id, "Bench press", 5, 5)?;
            let session = SqliteRepo::insert_workout_session(conn, owner, routine.id, Utc::now())?;
            let exercise =
                SqliteRepo::insert_exercise(conn, session.id, exercise_routine.id, "felt strong")?;
            let set = SqliteRepo::insert_set(conn, exercise.id, 100.0, 5)?;
            Ok(World {
                backend: backend.clone(),
                owner,
                stranger,
                routine,
                exercise_routine,
                session,
                exercise,
                set,
            })
        })
        .unwrap()
}

impl World {
    fn acs(&self) -> AccessControlService<SqliteBackend> {
        AccessControlService::new(self.backend.clone())
    }

    fn id_for(&self, shape: ChainShape) -> String {
        match shape {
            ChainShape::WorkoutRoutine => self.routine.id,
            ChainShape::ExerciseRoutine => self.exercise_routine.id,
            ChainShape::WorkoutSession => self.session.id,
            ChainShape::Exercise => self.exercise.id,
            ChainShape::SetEntry => self.set.id,
        }
        .to_string()
    }
}

#[test]
fn test_owner_granted_on_every_shape() {
    let world = setup_world();
    let acs = world.acs();
    for shape in ChainShape::ALL {
        assert_eq!(
            acs.can_access(shape, world.owner, &world.id_for(shape)),
            Ok(()),
            "{}",
            shape
        );
    }
}

#[test]
fn test_stranger_denied_on_every_shape() {
    let world = setup_world();
    let acs = world.acs();
    for shape in ChainShape::ALL {
        assert_eq!(
            acs.can_access(shape, world.stranger, &world.id_for(shape)),
            Err(LiftError::AccessDenied),
            "{}",
            shape
        );
    }
}

#[test]
fn test_direct_routine_grant_and_denial() {
    let world = setup_world();
    let acs = world.acs();
    let id = world.routine.id.to_string();

    assert_eq!(acs.can_access(ChainShape::WorkoutRoutine, world.owner, &id), Ok(()));
    assert_eq!(
        acs.can_access(ChainShape::WorkoutRoutine, world.stranger, &id),
        Err(LiftError::AccessDenied)
    );
}

#[test]
fn test_deleted_parent_hides_live_child() {
    let world = setup_world();
    let acs = world.acs();

    // Soft-delete only the parent row, leaving the exercise routine live
    world
        .backend
        .with_conn(|conn| {
            conn.execute(
                "UPDATE workout_routines SET deleted_at = 1 WHERE id = ?1",
                [world.routine.id.get()],
            )
            .map_err(liftlog_store::errors::from_rusqlite)
        })
        .unwrap();

    let live = world
        .backend
        .with_conn(|conn| SqliteRepo::get_exercise_routine(conn, world.exercise_routine.id))
        .unwrap();
    assert!(live.is_some(), "child row itself is still live");

    assert_eq!(
        acs.can_access(
            ChainShape::ExerciseRoutine,
            world.owner,
            &world.exercise_routine.id.to_string()
        ),
        Err(LiftError::AccessDenied)
    );
}

#[test]
fn test_missing_deleted_and_foreign_look_the_same() {
    let world = setup_world();
    let acs = world.acs();

    world
        .backend
        .with_conn(|conn| SqliteRepo::soft_delete_set(conn, world.set.id))
        .unwrap();

    let deleted = acs.can_access(ChainShape::SetEntry, world.owner, &world.set.id.to_string());
    let missing = acs.can_access(ChainShape::SetEntry, world.owner, "9999");
    let foreign = acs.can_access(
        ChainShape::Exercise,
        world.stranger,
        &world.exercise.id.to_string(),
    );

    assert_eq!(deleted, Err(LiftError::AccessDenied));
    assert_eq!(deleted, missing);
    assert_eq!(deleted, foreign);
}

#[test]
fn test_session_delete_cascades_to_exercises_and_sets() {
    let world = setup_world();
    let acs = world.acs();

    let deleted = world
        .backend
        .with_conn(|conn| SqliteRepo::soft_delete_workout_session(conn, world.session.id))
        .unwrap();
    assert!(deleted);

    let (exercise, set) = world
        .backend
        .with_conn(|conn| {
            Ok((
                SqliteRepo::get_exercise(conn, world.exercise.id)?,
                SqliteRepo::get_set(conn, world.set.id)?,
            ))
        })
        .unwrap();
    assert!(exercise.is_none());
    assert!(set.is_none());

    assert_eq!(
        acs.can_access(ChainShape::Exercise, world.owner, &world.exercise.id.to_string()),
        Err(LiftError::AccessDenied)
    );

    // Deleting twice reports nothing to delete
    let again = world
        .backend
        .with_conn(|conn| SqliteRepo::soft_delete_workout_session(conn, world.session.id))
        .unwrap();
    assert!(!again);
}

#[test]
fn test_routine_delete_cascades_but_keeps_sessions() {
    let world = setup_world();

    world
        .backend
        .with_conn(|conn| SqliteRepo::soft_delete_workout_routine(conn, world.routine.id))
        .unwrap();

    let (exercise_routine, session) = world
        .backend
        .with_conn(|conn| {
            Ok((
                SqliteRepo::get_exercise_routine(conn, world.exercise_routine.id)?,
                SqliteRepo::get_workout_session(conn, world.session.id)?,
            ))
        })
        .unwrap();
    assert!(exercise_routine.is_none());
    // A session only references its routine; it is not owned by it
    assert!(session.is_some());
}

#[test]
fn test_malformed_id_rejected_before_storage() {
    let world = setup_world();
    let acs = world.acs();
    let res = acs.can_access(ChainShape::WorkoutSession, world.owner, "not-a-number");
    assert!(matches!(res, Err(LiftError::InvalidArgument { .. })));
}

#[test]
fn test_backend_failure_is_not_access_denied() {
    let world = setup_world();
    world
        .backend
        .with_conn(|conn| {
            conn.execute_batch("ALTER TABLE exercises RENAME TO exercises_old")
                .map_err(liftlog_store::errors::from_rusqlite)
        })
        .unwrap();

    let res = world
        .acs()
        .can_access(ChainShape::Exercise, world.owner, &world.exercise.id.to_string());
    assert!(matches!(res, Err(LiftError::Backend { .. })), "{:?}", res);
}
