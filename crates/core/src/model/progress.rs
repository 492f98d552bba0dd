use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

use crate::model::ids::{PlayerId, QuestionId};
use crate::model::level::Level;
use crate::model::question::Question;
use crate::model::used_set::UsedSet;
use crate::selector::Selection;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("level {0} has not been graded yet")]
    LevelPending(Level),

    #[error("no level is waiting for answers")]
    NothingToGrade,

    #[error("question {0} is not part of the pending level")]
    ForeignAnswer(QuestionId),

    #[error("question {0} was answered more than once")]
    DuplicateAnswer(QuestionId),

    #[error("question {0} has no content")]
    MissingQuestion(QuestionId),

    #[error("question {id} has no choice {choice}")]
    InvalidChoice { id: QuestionId, choice: usize },

    #[error("pass ratio must be in [0, 1]")]
    InvalidPassRatio,

    #[error("invalid persisted progress: {0}")]
    InvalidPersistedState(String),
}

//
// ─── LEVEL RECORD ──────────────────────────────────────────────────────────────
//

/// Questions drawn for one level and, once graded, how many were right.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRecord {
    level: Level,
    questions: Vec<QuestionId>,
    requested: u32,
    correct: Option<u32>,
    drawn_at: DateTime<Utc>,
}

impl LevelRecord {
    #[must_use]
    pub fn new(
        level: Level,
        questions: Vec<QuestionId>,
        requested: u32,
        drawn_at: DateTime<Utc>,
    ) -> Self {
        Self {
            level,
            questions,
            requested,
            correct: None,
            drawn_at,
        }
    }

    /// Rehydrate a record from storage.
    #[must_use]
    pub fn from_persisted(
        level: Level,
        questions: Vec<QuestionId>,
        requested: u32,
        correct: Option<u32>,
        drawn_at: DateTime<Utc>,
    ) -> Self {
        Self {
            level,
            questions,
            requested,
            correct,
            drawn_at,
        }
    }

    #[must_use]
    pub fn level(&self) -> Level {
        self.level
    }

    #[must_use]
    pub fn questions(&self) -> &[QuestionId] {
        &self.questions
    }

    /// How many questions the schedule asked for when this level was drawn.
    #[must_use]
    pub fn requested(&self) -> u32 {
        self.requested
    }

    #[must_use]
    pub fn correct(&self) -> Option<u32> {
        self.correct
    }

    #[must_use]
    pub fn drawn_at(&self) -> DateTime<Utc> {
        self.drawn_at
    }

    #[must_use]
    pub fn is_graded(&self) -> bool {
        self.correct.is_some()
    }
}

//
// ─── SCORE ─────────────────────────────────────────────────────────────────────
//

/// Result of grading one level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelScore {
    pub level: Level,
    pub correct: u32,
    pub total: u32,
    pub passed: bool,
}

impl LevelScore {
    /// Fraction of correct answers; an empty level counts as fully correct.
    #[must_use]
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            f64::from(self.correct) / f64::from(self.total)
        }
    }
}

/// Share of correct answers needed to pass a level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassRatio(f64);

impl PassRatio {
    pub const DEFAULT: f64 = 0.6;

    /// # Errors
    ///
    /// Returns `ProgressError::InvalidPassRatio` unless `0.0 <= ratio <= 1.0`.
    pub fn new(ratio: f64) -> Result<Self, ProgressError> {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ProgressError::InvalidPassRatio);
        }
        Ok(Self(ratio))
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for PassRatio {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// A player's position in the quiz: what they have seen and where they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizProgress {
    player_id: PlayerId,
    used: UsedSet,
    current_level: Level,
    levels: Vec<LevelRecord>,
    attempts: u32,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl QuizProgress {
    /// Fresh progress at level 1 with nothing seen.
    #[must_use]
    pub fn start(player_id: PlayerId, now: DateTime<Utc>) -> Self {
        Self {
            player_id,
            used: UsedSet::new(),
            current_level: Level::FIRST,
            levels: Vec::new(),
            attempts: 0,
            started_at: now,
            updated_at: now,
        }
    }

    /// Rehydrate progress from storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidPersistedState` if a level record
    /// references a question missing from the used set or if more than one
    /// level is ungraded.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        player_id: PlayerId,
        used: UsedSet,
        current_level: Level,
        levels: Vec<LevelRecord>,
        attempts: u32,
        started_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, ProgressError> {
        for record in &levels {
            if let Some(missing) = record.questions().iter().find(|id| !used.contains(**id)) {
                return Err(ProgressError::InvalidPersistedState(format!(
                    "level {} references unseen question {missing}",
                    record.level()
                )));
            }
        }
        let pending = levels.iter().filter(|r| !r.is_graded()).count();
        if pending > 1 {
            return Err(ProgressError::InvalidPersistedState(format!(
                "{pending} levels are ungraded"
            )));
        }

        Ok(Self {
            player_id,
            used,
            current_level,
            levels,
            attempts,
            started_at,
            updated_at,
        })
    }

    #[must_use]
    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    #[must_use]
    pub fn used(&self) -> &UsedSet {
        &self.used
    }

    #[must_use]
    pub fn current_level(&self) -> Level {
        self.current_level
    }

    #[must_use]
    pub fn levels(&self) -> &[LevelRecord] {
        &self.levels
    }

    /// Completed retakes.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The drawn level still waiting for answers, if any.
    #[must_use]
    pub fn pending_level(&self) -> Option<&LevelRecord> {
        self.levels.last().filter(|r| !r.is_graded())
    }

    /// Total correct answers across graded levels of this attempt.
    #[must_use]
    pub fn total_correct(&self) -> u32 {
        self.levels.iter().filter_map(LevelRecord::correct).sum()
    }

    /// Fails if the previous level was drawn but not graded.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::LevelPending` while a level awaits answers.
    pub fn ensure_ready_to_draw(&self) -> Result<(), ProgressError> {
        match self.pending_level() {
            Some(pending) => Err(ProgressError::LevelPending(pending.level())),
            None => Ok(()),
        }
    }

    /// Record a draw for the current level and adopt the selector's used set.
    ///
    /// An empty selection records nothing.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::LevelPending` while a level awaits answers.
    pub fn apply_selection(
        &mut self,
        selection: &Selection,
        now: DateTime<Utc>,
    ) -> Result<(), ProgressError> {
        self.ensure_ready_to_draw()?;
        if selection.selected.is_empty() {
            return Ok(());
        }
        self.levels.push(LevelRecord::new(
            self.current_level,
            selection.selected.clone(),
            selection.requested,
            now,
        ));
        self.used = selection.used.clone();
        self.updated_at = now;
        Ok(())
    }

    /// Grade the pending level and move on to the next one.
    ///
    /// `questions` must hold content for every question of the pending level;
    /// unanswered questions count as wrong. The level advances whether or not
    /// the score passes.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if nothing is pending, an answer targets a
    /// question outside the pending level or repeats one, a choice index does
    /// not exist, or content is missing.
    pub fn grade(
        &mut self,
        answers: &[(QuestionId, usize)],
        questions: &[Question],
        pass_ratio: PassRatio,
        now: DateTime<Utc>,
    ) -> Result<LevelScore, ProgressError> {
        let Some(record) = self.levels.last_mut().filter(|r| !r.is_graded()) else {
            return Err(ProgressError::NothingToGrade);
        };

        let in_level: BTreeSet<QuestionId> = record.questions.iter().copied().collect();
        let by_id: HashMap<QuestionId, &Question> =
            questions.iter().map(|q| (q.id(), q)).collect();

        let mut answered = BTreeSet::new();
        let mut correct = 0_u32;
        for (id, choice) in answers {
            if !in_level.contains(id) {
                return Err(ProgressError::ForeignAnswer(*id));
            }
            if !answered.insert(*id) {
                return Err(ProgressError::DuplicateAnswer(*id));
            }
            let question = by_id
                .get(id)
                .ok_or(ProgressError::MissingQuestion(*id))?;
            if *choice >= question.choices().len() {
                return Err(ProgressError::InvalidChoice {
                    id: *id,
                    choice: *choice,
                });
            }
            if question.is_correct(*choice) {
                correct += 1;
            }
        }

        let total = u32::try_from(record.questions.len()).unwrap_or(u32::MAX);
        record.correct = Some(correct);
        let level = record.level;

        let mut score = LevelScore {
            level,
            correct,
            total,
            passed: false,
        };
        score.passed = score.ratio() >= pass_ratio.value();

        self.current_level = self.current_level.next();
        self.updated_at = now;
        Ok(score)
    }

    /// Start over: forget every seen question and return to level 1.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.used.clear();
        self.levels.clear();
        self.current_level = Level::FIRST;
        self.attempts = self.attempts.saturating_add(1);
        self.started_at = now;
        self.updated_at = now;
    }
}
