use std::sync::Arc;

use quiz_core::model::{LevelSchedule, PassRatio};
use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::question_service::QuestionService;
use crate::quiz_service::QuizService;

/// Quiz tuning shared by every front end.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuizSettings {
    pub schedule: LevelSchedule,
    pub pass_ratio: PassRatio,
}

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    quiz: Arc<QuizService>,
    questions: Arc<QuestionService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: QuizSettings,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, settings))
    }

    /// Build services over volatile in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock, settings: QuizSettings) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, settings)
    }

    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock, settings: QuizSettings) -> Self {
        let quiz = Arc::new(
            QuizService::new(
                clock,
                Arc::clone(&storage.questions),
                Arc::clone(&storage.progress),
            )
            .with_schedule(settings.schedule)
            .with_pass_ratio(settings.pass_ratio),
        );
        let questions = Arc::new(QuestionService::new(Arc::clone(&storage.questions)));
        Self { quiz, questions }
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizService> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn questions(&self) -> Arc<QuestionService> {
        Arc::clone(&self.questions)
    }
}
