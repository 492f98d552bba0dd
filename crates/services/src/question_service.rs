use std::sync::Arc;

use quiz_core::model::{Question, QuestionDraft, QuestionId};
use storage::repository::QuestionRepository;
use tracing::{debug, info};

use crate::error::QuestionServiceError;

/// Manages the question pool the quiz draws from.
#[derive(Clone)]
pub struct QuestionService {
    repo: Arc<dyn QuestionRepository>,
}

impl QuestionService {
    #[must_use]
    pub fn new(repo: Arc<dyn QuestionRepository>) -> Self {
        Self { repo }
    }

    /// Validate and append a question to the pool.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Question` for invalid drafts, or storage errors.
    pub async fn add_question(
        &self,
        draft: QuestionDraft,
    ) -> Result<Question, QuestionServiceError> {
        draft.check()?;
        let question = self.repo.insert_question(draft).await?;
        debug!(question = %question.id(), "question added");
        Ok(question)
    }

    /// Append many questions, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first `QuestionServiceError` encountered; earlier drafts stay stored.
    pub async fn add_questions(
        &self,
        drafts: impl IntoIterator<Item = QuestionDraft>,
    ) -> Result<Vec<Question>, QuestionServiceError> {
        let mut added = Vec::new();
        for draft in drafts {
            added.push(self.add_question(draft).await?);
        }
        info!(count = added.len(), "questions added to pool");
        Ok(added)
    }

    /// Size of the pool.
    ///
    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if the store cannot be read.
    pub async fn question_count(&self) -> Result<u64, QuestionServiceError> {
        Ok(self.repo.count_questions().await?)
    }

    /// # Errors
    ///
    /// Returns `QuestionServiceError::Storage` if any id is missing.
    pub async fn get_questions(
        &self,
        ids: &[QuestionId],
    ) -> Result<Vec<Question>, QuestionServiceError> {
        Ok(self.repo.get_questions(ids).await?)
    }
}
