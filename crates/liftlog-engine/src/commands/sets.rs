//! Sets logged against an exercise

use liftlog_core::model::{Exercise, SetEntry};
use liftlog_core::ChainShape;
use liftlog_store::errors::Result;
use liftlog_store::SqliteRepo;

use crate::resolver::{invalid, vanished, RequestScope, Resolver};

fn validate_weight(weight: f32) -> Result<f32> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(invalid("weight must be a non-negative number"));
    }
    Ok(weight)
}

impl Resolver {
    /// Log a set for an exercise in one of the caller's sessions
    ///
    /// # Errors
    ///
    /// `AccessDenied` unless the exercise's session belongs to the caller;
    /// `InvalidArgument` for a negative or non-finite weight.
    pub async fn add_set(
        &self,
        scope: &RequestScope,
        exercise_id: &str,
        weight: f32,
        reps: u32,
    ) -> Result<SetEntry> {
        self.instrumented("add_set", scope, async {
            let exercise = self.authorize(scope, ChainShape::Exercise, exercise_id).await?;
            let weight = validate_weight(weight)?;
            self.backend()
                .run_blocking(move |conn| SqliteRepo::insert_set(conn, exercise, weight, reps))
                .await
        })
        .await
    }

    /// # Errors
    ///
    /// `AccessDenied` unless the exercise's session belongs to the caller.
    pub async fn sets(&self, scope: &RequestScope, exercise_id: &str) -> Result<Vec<SetEntry>> {
        self.instrumented("sets", scope, async {
            let exercise = self.authorize(scope, ChainShape::Exercise, exercise_id).await?;
            self.backend()
                .run_blocking(move |conn| SqliteRepo::list_sets(conn, exercise))
                .await
        })
        .await
    }

    /// # Errors
    ///
    /// `AccessDenied` unless the set's chain ends at the caller.
    pub async fn update_set(
        &self,
        scope: &RequestScope,
        set_id: &str,
        weight: f32,
        reps: u32,
    ) -> Result<SetEntry> {
        self.instrumented("update_set", scope, async {
            let id = self.authorize(scope, ChainShape::SetEntry, set_id).await?;
            let weight = validate_weight(weight)?;
            self.backend()
                .run_blocking(move |conn| {
                    if !SqliteRepo::update_set(conn, id, weight, reps)? {
                        return Err(vanished());
                    }
                    SqliteRepo::get_set(conn, id)?.ok_or_else(vanished)
                })
                .await
        })
        .await
    }

    /// # Errors
    ///
    /// `AccessDenied` unless the set's chain ends at the caller.
    pub async fn delete_set(&self, scope: &RequestScope, set_id: &str) -> Result<()> {
        self.instrumented("delete_set", scope, async {
            let id = self.authorize(scope, ChainShape::SetEntry, set_id).await?;
            self.backend()
                .run_blocking(move |conn| {
                    if SqliteRepo::soft_delete_set(conn, id)? {
                        Ok(())
                    } else {
                        Err(vanished())
                    }
                })
                .await
        })
        .await
    }

    /// Field resolver: sets of an exercise returned earlier in this request
    ///
    /// Exercises carry no owner column, so the parent is re-checked through
    /// the access service before the loader is consulted.
    ///
    /// # Errors
    ///
    /// `AccessDenied` if the exercise is not the caller's; `Backend` or
    /// `Cancelled` from the loader.
    pub async fn exercise_sets(
        &self,
        scope: &RequestScope,
        exercise: &Exercise,
    ) -> Result<Vec<SetEntry>> {
        self.instrumented("exercise_sets", scope, async {
            let id = self
                .authorize(scope, ChainShape::Exercise, &exercise.id.to_string())
                .await?;
            let loaded = scope.loaders().sets.load_and_dispatch(id).await?;
            Ok(loaded.as_ref().clone())
        })
        .await
    }
}
