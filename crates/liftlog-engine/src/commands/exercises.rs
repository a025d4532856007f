//! Exercises performed during a session

use liftlog_core::model::{Exercise, WorkoutSession};
use liftlog_core::ChainShape;
use liftlog_store::errors::Result;
use liftlog_store::SqliteRepo;

use crate::resolver::{vanished, RequestScope, Resolver};

impl Resolver {
    /// Record an exercise in one of the caller's sessions
    ///
    /// Both the session and the exercise routine it follows must belong to
    /// the caller.
    ///
    /// # Errors
    ///
    /// `AccessDenied` if either check fails.
    pub async fn add_exercise(
        &self,
        scope: &RequestScope,
        session_id: &str,
        exercise_routine_id: &str,
        notes: &str,
    ) -> Result<Exercise> {
        self.instrumented("add_exercise", scope, async {
            let session = self.authorize(scope, ChainShape::WorkoutSession, session_id).await?;
            let routine = self
                .authorize(scope, ChainShape::ExerciseRoutine, exercise_routine_id)
                .await?;
            let notes = notes.to_string();
            self.backend()
                .run_blocking(move |conn| {
                    SqliteRepo::insert_exercise(conn, session, routine, &notes)
                })
                .await
        })
        .await
    }

    /// # Errors
    ///
    /// `AccessDenied` unless the exercise's session belongs to the caller.
    pub async fn exercise(&self, scope: &RequestScope, exercise_id: &str) -> Result<Exercise> {
        self.instrumented("exercise", scope, async {
            let id = self.authorize(scope, ChainShape::Exercise, exercise_id).await?;
            self.backend()
                .run_blocking(move |conn| {
                    SqliteRepo::get_exercise(conn, id)?.ok_or_else(vanished)
                })
                .await
        })
        .await
    }

    /// Live exercises of one session
    ///
    /// # Errors
    ///
    /// `AccessDenied` unless the caller owns the session.
    pub async fn exercises(
        &self,
        scope: &RequestScope,
        session_id: &str,
    ) -> Result<Vec<Exercise>> {
        self.instrumented("exercises", scope, async {
            let session = self.authorize(scope, ChainShape::WorkoutSession, session_id).await?;
            self.backend()
                .run_blocking(move |conn| SqliteRepo::list_exercises(conn, session))
                .await
        })
        .await
    }

    /// # Errors
    ///
    /// `AccessDenied` unless the exercise's session belongs to the caller.
    pub async fn update_exercise(
        &self,
        scope: &RequestScope,
        exercise_id: &str,
        notes: &str,
    ) -> Result<Exercise> {
        self.instrumented("update_exercise", scope, async {
            let id = self.authorize(scope, ChainShape::Exercise, exercise_id).await?;
            let notes = notes.to_string();
            self.backend()
                .run_blocking(move |conn| {
                    if !SqliteRepo::update_exercise(conn, id, &notes)? {
                        return Err(vanished());
                    }
                    SqliteRepo::get_exercise(conn, id)?.ok_or_else(vanished)
                })
                .await
        })
        .await
    }

    /// Soft-delete an exercise and its sets
    ///
    /// # Errors
    ///
    /// `AccessDenied` unless the exercise's session belongs to the caller.
    pub async fn delete_exercise(&self, scope: &RequestScope, exercise_id: &str) -> Result<()> {
        self.instrumented("delete_exercise", scope, async {
            let id = self.authorize(scope, ChainShape::Exercise, exercise_id).await?;
            self.backend()
                .run_blocking(move |conn| {
                    if SqliteRepo::soft_delete_exercise(conn, id)? {
                        Ok(())
                    } else {
                        Err(vanished())
                    }
                })
                .await
        })
        .await
    }

    /// Field resolver: exercises of a session returned earlier in this request
    ///
    /// # Errors
    ///
    /// `AccessDenied` if the session belongs to someone else; `Backend` or
    /// `Cancelled` from the loader.
    pub async fn session_exercises(
        &self,
        scope: &RequestScope,
        session: &WorkoutSession,
    ) -> Result<Vec<Exercise>> {
        self.instrumented("session_exercises", scope, async {
            if session.user_id != scope.user_id() {
                return Err(vanished());
            }
            let loaded = scope.loaders().exercises.load_and_dispatch(session.id).await?;
            Ok(loaded.as_ref().clone())
        })
        .await
    }

    /// Field resolver: what was logged last time this routine was trained
    ///
    /// For a finished session, the live exercises of the caller's latest
    /// earlier session of the same routine. An unfinished session, or one with
    /// no predecessor, yields an empty list.
    ///
    /// # Errors
    ///
    /// `AccessDenied` if the session belongs to someone else.
    pub async fn previous_exercises(
        &self,
        scope: &RequestScope,
        session: &WorkoutSession,
    ) -> Result<Vec<Exercise>> {
        self.instrumented("previous_exercises", scope, async {
            if session.user_id != scope.user_id() {
                return Err(vanished());
            }
            if session.end.is_none() {
                return Ok(Vec::new());
            }

            let user = scope.user_id();
            let (routine, id, start) = (session.workout_routine_id, session.id, session.start);
            self.backend()
                .run_blocking(move |conn| {
                    SqliteRepo::previous_exercises(conn, user, routine, id, start)
                })
                .await
        })
        .await
    }
}
