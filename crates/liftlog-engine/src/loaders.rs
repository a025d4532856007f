//! The loaders one request owns

use liftlog_core::{BatchLoader, LoaderConfig};
use liftlog_core_types::Cancellation;
use liftlog_store::{ExerciseRoutinesByRoutine, ExercisesBySession, SetsByExercise, SqliteBackend};

/// Fresh, empty loaders bound to one request's cancellation
///
/// Never shared between requests: the caches live exactly as long as the
/// `RequestScope` that owns them.
#[derive(Debug, Clone)]
pub struct Loaders {
    pub exercises: BatchLoader<ExercisesBySession>,
    pub sets: BatchLoader<SetsByExercise>,
    pub exercise_routines: BatchLoader<ExerciseRoutinesByRoutine>,
}

impl Loaders {
    pub fn new(
        backend: &SqliteBackend,
        cancellation: &Cancellation,
        config: LoaderConfig,
    ) -> Self {
        Self {
            exercises: BatchLoader::new(
                ExercisesBySession::new(backend.clone()),
                cancellation.clone(),
                config,
            ),
            sets: BatchLoader::new(
                SetsByExercise::new(backend.clone()),
                cancellation.clone(),
                config,
            ),
            exercise_routines: BatchLoader::new(
                ExerciseRoutinesByRoutine::new(backend.clone()),
                cancellation.clone(),
                config,
            ),
        }
    }
}
