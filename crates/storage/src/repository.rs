use async_trait::async_trait;
use quiz_core::model::{PlayerId, Question, QuestionDraft, QuestionId, QuizProgress};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for the question store.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Number of questions in the pool. Ids run from 1 to this count.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn count_questions(&self) -> Result<u64, StorageError>;

    /// Validate and append a question, assigning the next id (`count + 1`).
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the draft is invalid, or other
    /// storage errors.
    async fn insert_question(&self, draft: QuestionDraft) -> Result<Question, StorageError>;

    /// Fetch questions by id, in the order requested.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if any id is missing, or other storage errors.
    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError>;
}

/// Repository contract for per-player quiz progress.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load a player's progress, or `None` if they never drew a level.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if stored progress cannot be read or decoded.
    async fn get_progress(&self, player: PlayerId) -> Result<Option<QuizProgress>, StorageError>;

    /// Replace a player's stored progress as a whole.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the progress cannot be stored.
    async fn save_progress(&self, progress: &QuizProgress) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<BTreeMap<QuestionId, Question>>>,
    progress: Arc<Mutex<HashMap<PlayerId, QuizProgress>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn count_questions(&self) -> Result<u64, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len() as u64)
    }

    async fn insert_question(&self, draft: QuestionDraft) -> Result<Question, StorageError> {
        let mut guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let id = QuestionId::new(guard.len() as u64 + 1);
        let question = draft
            .validate(id)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        guard.insert(id, question.clone());
        Ok(question)
    }

    async fn get_questions(&self, ids: &[QuestionId]) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            match guard.get(id) {
                Some(question) => found.push(question.clone()),
                None => return Err(StorageError::NotFound),
            }
        }
        Ok(found)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(&self, player: PlayerId) -> Result<Option<QuizProgress>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&player).cloned())
    }

    async fn save_progress(&self, progress: &QuizProgress) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(progress.player_id(), progress.clone());
        Ok(())
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self {
            questions,
            progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::time::fixed_now;
    use quiz_core::model::UsedSet;
    use quiz_core::{PoolSize, QuestionSelector, Selection};

    fn draft(prompt: &str) -> QuestionDraft {
        QuestionDraft {
            prompt: prompt.into(),
            choices: vec!["yes".into(), "no".into()],
            correct_choice: 0,
            reference: None,
        }
    }

    /// Deterministic selection of the first `n` ids.
    fn first_n(n: u64) -> Selection {
        let selected: Vec<QuestionId> = (1..=n).map(QuestionId::new).collect();
        let used: UsedSet = selected.iter().copied().collect();
        Selection {
            available: usize::try_from(n).unwrap(),
            requested: u32::try_from(n).unwrap(),
            selected,
            used,
        }
    }

    #[tokio::test]
    async fn assigns_dense_question_ids() {
        let repo = InMemoryRepository::new();
        let first = repo.insert_question(draft("One?")).await.unwrap();
        let second = repo.insert_question(draft("Two?")).await.unwrap();

        assert_eq!(first.id(), QuestionId::new(1));
        assert_eq!(second.id(), QuestionId::new(2));
        assert_eq!(repo.count_questions().await.unwrap(), 2);

        let fetched = repo
            .get_questions(&[QuestionId::new(2), QuestionId::new(1)])
            .await
            .unwrap();
        assert_eq!(fetched[0].prompt(), "Two?");
        assert_eq!(fetched[1].prompt(), "One?");
    }

    #[tokio::test]
    async fn invalid_draft_is_not_stored() {
        let repo = InMemoryRepository::new();
        let err = repo.insert_question(draft("   ")).await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
        assert_eq!(repo.count_questions().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_question_is_not_found() {
        let repo = InMemoryRepository::new();
        repo.insert_question(draft("Only?")).await.unwrap();
        let err = repo
            .get_questions(&[QuestionId::new(1), QuestionId::new(9)])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn round_trips_progress() {
        let repo = InMemoryRepository::new();
        let player = PlayerId::new(7);
        assert!(repo.get_progress(player).await.unwrap().is_none());

        let mut progress = QuizProgress::start(player, fixed_now());
        progress
            .apply_selection(&first_n(3), fixed_now())
            .unwrap();
        repo.save_progress(&progress).await.unwrap();

        let fetched = repo.get_progress(player).await.unwrap().expect("stored");
        assert_eq!(fetched, progress);

        // the stored used set feeds straight back into the selector
        let selector = QuestionSelector::new(PoolSize::new(3).unwrap());
        assert_eq!(selector.available(fetched.used()).unwrap(), 0);
    }
}
