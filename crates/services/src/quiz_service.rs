use std::sync::{Arc, Mutex, PoisonError};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use quiz_core::model::{
    Level, LevelSchedule, LevelScore, PassRatio, PlayerId, ProgressError, Question, QuestionId,
    QuizProgress,
};
use quiz_core::{Clock, PoolSize, QuestionSelector, Selection};
use storage::repository::{ProgressRepository, QuestionRepository};

use crate::error::QuizServiceError;

//
// ─── ROUND ─────────────────────────────────────────────────────────────────────
//

/// Questions presented for one level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelRound {
    pub level: Level,
    /// Question content in draw order. Empty when the pool is exhausted.
    pub questions: Vec<Question>,
    /// How many questions the schedule asked for.
    pub requested: u32,
    /// Unseen questions left in the pool after this round.
    pub remaining: usize,
    /// True when nothing was left to draw; the player has seen every question.
    pub exhausted: bool,
}

impl LevelRound {
    /// Returns true when the pool could not fill the whole level.
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.questions.len() < usize::try_from(self.requested).unwrap_or(usize::MAX)
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Drives a player through quiz levels without ever repeating a question.
///
/// Progress (including the used set) is loaded before every operation and
/// persisted before returning, so a session can stop at any point.
pub struct QuizService {
    clock: Clock,
    questions: Arc<dyn QuestionRepository>,
    progress: Arc<dyn ProgressRepository>,
    schedule: LevelSchedule,
    pass_ratio: PassRatio,
    rng: Mutex<StdRng>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            questions,
            progress,
            schedule: LevelSchedule::default(),
            pass_ratio: PassRatio::default(),
            rng: Mutex::new(StdRng::from_rng(&mut rand::rng())),
        }
    }

    /// Replace the level-to-count mapping.
    #[must_use]
    pub fn with_schedule(mut self, schedule: LevelSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Replace the share of correct answers needed to pass a level.
    #[must_use]
    pub fn with_pass_ratio(mut self, pass_ratio: PassRatio) -> Self {
        self.pass_ratio = pass_ratio;
        self
    }

    /// Use a deterministic random source.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Load a player's progress, or fresh progress at level 1.
    ///
    /// Fresh progress is not persisted until the first level is drawn.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if progress cannot be loaded.
    pub async fn progress(&self, player: PlayerId) -> Result<QuizProgress, QuizServiceError> {
        let stored = self.progress.get_progress(player).await?;
        Ok(stored.unwrap_or_else(|| QuizProgress::start(player, self.clock.now())))
    }

    /// Draw the questions for the player's current level.
    ///
    /// When every question has been seen the round comes back flagged
    /// `exhausted` with no questions and nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NoQuestions` for an empty store,
    /// `QuizServiceError::Progress` while the previous level awaits answers,
    /// or selection and storage errors.
    pub async fn next_level(&self, player: PlayerId) -> Result<LevelRound, QuizServiceError> {
        let mut progress = self.progress(player).await?;
        progress.ensure_ready_to_draw()?;

        let pool = self.pool_size().await?;
        let request = self.schedule.request_for(progress.current_level());
        let selection = self.draw(pool, &progress, request.desired_count)?;

        debug!(
            player = %player,
            level = %request.level,
            requested = request.desired_count,
            available = selection.available,
            drawn = selection.selected.len(),
            "selected questions"
        );

        if selection.is_exhausted() {
            info!(player = %player, level = %request.level, "question pool exhausted");
            return Ok(LevelRound {
                level: request.level,
                questions: Vec::new(),
                requested: request.desired_count,
                remaining: 0,
                exhausted: true,
            });
        }

        let questions = self.questions.get_questions(&selection.selected).await?;
        progress.apply_selection(&selection, self.clock.now())?;
        self.progress.save_progress(&progress).await?;

        info!(
            player = %player,
            level = %request.level,
            drawn = questions.len(),
            remaining = selection.remaining(),
            "level drawn"
        );

        Ok(LevelRound {
            level: request.level,
            questions,
            requested: request.desired_count,
            remaining: selection.remaining(),
            exhausted: false,
        })
    }

    /// The level waiting for answers, if any, with its question content.
    ///
    /// # Errors
    ///
    /// Returns storage or selection errors.
    pub async fn pending_round(
        &self,
        player: PlayerId,
    ) -> Result<Option<LevelRound>, QuizServiceError> {
        let progress = self.progress(player).await?;
        let Some(pending) = progress.pending_level() else {
            return Ok(None);
        };

        let pool = self.pool_size().await?;
        let remaining = QuestionSelector::new(pool).available(progress.used())?;
        let questions = self.questions.get_questions(pending.questions()).await?;

        Ok(Some(LevelRound {
            level: pending.level(),
            requested: pending.requested(),
            questions,
            remaining,
            exhausted: false,
        }))
    }

    /// Grade the pending level and advance the player.
    ///
    /// Each answer is `(question, choice index)`; unanswered questions count as wrong.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Progress` if nothing is pending or an answer is
    /// invalid, or storage errors.
    pub async fn submit_answers(
        &self,
        player: PlayerId,
        answers: &[(QuestionId, usize)],
    ) -> Result<LevelScore, QuizServiceError> {
        let mut progress = self.progress(player).await?;
        let pending_ids = progress
            .pending_level()
            .ok_or(ProgressError::NothingToGrade)?
            .questions()
            .to_vec();

        let questions = self.questions.get_questions(&pending_ids).await?;
        let score = progress.grade(answers, &questions, self.pass_ratio, self.clock.now())?;
        self.progress.save_progress(&progress).await?;

        info!(
            player = %player,
            level = %score.level,
            correct = score.correct,
            total = score.total,
            passed = score.passed,
            "level graded"
        );
        Ok(score)
    }

    /// Start a new attempt: every question becomes available again.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if progress cannot be loaded or saved.
    pub async fn retake(&self, player: PlayerId) -> Result<QuizProgress, QuizServiceError> {
        let mut progress = self.progress(player).await?;
        let seen = progress.used().len();
        progress.reset(self.clock.now());
        self.progress.save_progress(&progress).await?;

        info!(player = %player, seen, attempts = progress.attempts(), "quiz retaken");
        Ok(progress)
    }

    async fn pool_size(&self) -> Result<PoolSize, QuizServiceError> {
        let count = self.questions.count_questions().await?;
        if count == 0 {
            return Err(QuizServiceError::NoQuestions);
        }
        Ok(PoolSize::try_from(count)?)
    }

    fn draw(
        &self,
        pool: PoolSize,
        progress: &QuizProgress,
        desired_count: u32,
    ) -> Result<Selection, QuizServiceError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let selection = QuestionSelector::new(pool).select(progress.used(), desired_count, &mut *rng)?;
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionDraft;
    use quiz_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    async fn service_with(pool: u64, schedule: LevelSchedule) -> (QuizService, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        for n in 1..=pool {
            repo.insert_question(QuestionDraft {
                prompt: format!("Q{n}"),
                choices: vec!["right".into(), "wrong".into()],
                correct_choice: 0,
                reference: None,
            })
            .await
            .unwrap();
        }
        let svc = QuizService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo.clone()),
        )
        .with_schedule(schedule)
        .with_seed(42);
        (svc, repo)
    }

    fn all_right(round: &LevelRound) -> Vec<(QuestionId, usize)> {
        round.questions.iter().map(|q| (q.id(), 0)).collect()
    }

    #[tokio::test]
    async fn empty_store_is_an_error() {
        let (svc, _) = service_with(0, LevelSchedule::default()).await;
        let err = svc.next_level(PlayerId::new(1)).await.unwrap_err();
        assert!(matches!(err, QuizServiceError::NoQuestions));
    }

    #[tokio::test]
    async fn pending_level_blocks_next_draw() {
        let (svc, _) = service_with(20, LevelSchedule::default()).await;
        let player = PlayerId::new(1);
        svc.next_level(player).await.unwrap();

        let err = svc.next_level(player).await.unwrap_err();
        assert!(matches!(
            err,
            QuizServiceError::Progress(ProgressError::LevelPending(_))
        ));
    }

    #[tokio::test]
    async fn pending_round_replays_drawn_questions() {
        let (svc, _) = service_with(20, LevelSchedule::default()).await;
        let player = PlayerId::new(1);
        assert!(svc.pending_round(player).await.unwrap().is_none());

        let drawn = svc.next_level(player).await.unwrap();
        let pending = svc.pending_round(player).await.unwrap().expect("pending");
        assert_eq!(pending.questions, drawn.questions);
        assert_eq!(pending.remaining, 15);
    }

    #[tokio::test]
    async fn pending_round_reports_the_count_asked_at_draw_time() {
        let (svc, repo) = service_with(20, LevelSchedule::new(6, 0, 6).unwrap()).await;
        let player = PlayerId::new(2);
        svc.next_level(player).await.unwrap();

        let narrower = QuizService::new(
            Clock::fixed(fixed_now()),
            Arc::new(repo.clone()),
            Arc::new(repo),
        )
        .with_schedule(LevelSchedule::new(2, 0, 2).unwrap());
        let pending = narrower.pending_round(player).await.unwrap().expect("pending");
        assert_eq!(pending.requested, 6);
        assert_eq!(pending.questions.len(), 6);
        assert!(!pending.is_short());
    }

    #[tokio::test]
    async fn submit_without_pending_level_fails() {
        let (svc, _) = service_with(5, LevelSchedule::default()).await;
        let err = svc.submit_answers(PlayerId::new(1), &[]).await.unwrap_err();
        assert!(matches!(
            err,
            QuizServiceError::Progress(ProgressError::NothingToGrade)
        ));
    }

    #[tokio::test]
    async fn short_level_then_exhaustion() {
        let schedule = LevelSchedule::new(4, 0, 4).unwrap();
        let (svc, _) = service_with(6, schedule).await;
        let player = PlayerId::new(9);

        let first = svc.next_level(player).await.unwrap();
        assert_eq!(first.questions.len(), 4);
        svc.submit_answers(player, &all_right(&first)).await.unwrap();

        let second = svc.next_level(player).await.unwrap();
        assert_eq!(second.questions.len(), 2);
        assert!(second.is_short());
        assert_eq!(second.remaining, 0);
        svc.submit_answers(player, &all_right(&second)).await.unwrap();

        let third = svc.next_level(player).await.unwrap();
        assert!(third.exhausted);
        assert!(third.questions.is_empty());

        let progress = svc.progress(player).await.unwrap();
        assert_eq!(progress.levels().len(), 2);
        assert_eq!(progress.used().len(), 6);
    }
}
