//! Workout sessions

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use liftlog_core::model::{Exercise, WorkoutSession};
use liftlog_core::ChainShape;
use liftlog_store::errors::Result;
use liftlog_store::SqliteRepo;
use serde::Serialize;

use crate::resolver::{invalid, vanished, RequestScope, Resolver};

/// A session together with its live exercises
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionWithExercises {
    #[serde(flatten)]
    pub session: WorkoutSession,
    pub exercises: Vec<Exercise>,
}

fn validate_window(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Result<()> {
    match end {
        Some(end) if end < start => Err(invalid("session cannot end before it starts")),
        _ => Ok(()),
    }
}

impl Resolver {
    /// Start a session following one of the caller's routines
    ///
    /// # Errors
    ///
    /// `AccessDenied` unless the caller owns the referenced routine.
    pub async fn add_workout_session(
        &self,
        scope: &RequestScope,
        routine_id: &str,
        start: DateTime<Utc>,
    ) -> Result<WorkoutSession> {
        self.instrumented("add_workout_session", scope, async {
            let routine = self.authorize(scope, ChainShape::WorkoutRoutine, routine_id).await?;
            let user = scope.user_id();
            self.backend()
                .run_blocking(move |conn| {
                    SqliteRepo::insert_workout_session(conn, user, routine, start)
                })
                .await
        })
        .await
    }

    /// The caller's live sessions, oldest first
    ///
    /// # Errors
    ///
    /// `Persistence` on storage failure.
    pub async fn workout_sessions(&self, scope: &RequestScope) -> Result<Vec<WorkoutSession>> {
        self.instrumented("workout_sessions", scope, async {
            let user = scope.user_id();
            self.backend()
                .run_blocking(move |conn| SqliteRepo::list_workout_sessions(conn, user))
                .await
        })
        .await
    }

    /// # Errors
    ///
    /// `AccessDenied` unless the caller owns the session.
    pub async fn workout_session(
        &self,
        scope: &RequestScope,
        session_id: &str,
    ) -> Result<WorkoutSession> {
        self.instrumented("workout_session", scope, async {
            let id = self.authorize(scope, ChainShape::WorkoutSession, session_id).await?;
            self.backend()
                .run_blocking(move |conn| {
                    SqliteRepo::get_workout_session(conn, id)?.ok_or_else(vanished)
                })
                .await
        })
        .await
    }

    /// Move a session's start or close it
    ///
    /// # Errors
    ///
    /// `AccessDenied` unless the caller owns the session; `InvalidArgument`
    /// if `end` precedes `start`.
    pub async fn update_workout_session(
        &self,
        scope: &RequestScope,
        session_id: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<WorkoutSession> {
        self.instrumented("update_workout_session", scope, async {
            let id = self.authorize(scope, ChainShape::WorkoutSession, session_id).await?;
            validate_window(start, end)?;
            self.backend()
                .run_blocking(move |conn| {
                    if !SqliteRepo::update_workout_session(conn, id, start, end)? {
                        return Err(vanished());
                    }
                    SqliteRepo::get_workout_session(conn, id)?.ok_or_else(vanished)
                })
                .await
        })
        .await
    }

    /// Soft-delete a session with its exercises and sets
    ///
    /// # Errors
    ///
    /// `AccessDenied` unless the caller owns the session.
    pub async fn delete_workout_session(
        &self,
        scope: &RequestScope,
        session_id: &str,
    ) -> Result<()> {
        self.instrumented("delete_workout_session", scope, async {
            let id = self.authorize(scope, ChainShape::WorkoutSession, session_id).await?;
            self.backend()
                .run_blocking(move |conn| {
                    if SqliteRepo::soft_delete_workout_session(conn, id)? {
                        Ok(())
                    } else {
                        Err(vanished())
                    }
                })
                .await
        })
        .await
    }

    /// Every session of the caller with its exercises
    ///
    /// The exercise lists are resolved in parallel through the request's
    /// loader, so all sessions cost one exercise query.
    ///
    /// # Errors
    ///
    /// `Backend` if the batched read fails, `Cancelled` if the request was
    /// cancelled first.
    pub async fn workout_sessions_with_exercises(
        &self,
        scope: &RequestScope,
    ) -> Result<Vec<SessionWithExercises>> {
        self.instrumented("workout_sessions_with_exercises", scope, async {
            let user = scope.user_id();
            let sessions = self
                .backend()
                .run_blocking(move |conn| SqliteRepo::list_workout_sessions(conn, user))
                .await?;

            let loader = &scope.loaders().exercises;
            let pending: Vec<_> = sessions.iter().map(|s| loader.load(s.id)).collect();
            loader.dispatch().await;
            let exercises = try_join_all(pending).await?;

            Ok(sessions
                .into_iter()
                .zip(exercises)
                .map(|(session, exercises)| SessionWithExercises {
                    session,
                    exercises: exercises.as_ref().clone(),
                })
                .collect())
        })
        .await
    }
}
