use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScheduleError {
    #[error("level numbers start at 1")]
    InvalidLevel,

    #[error("base question count must be > 0")]
    InvalidBaseCount,

    #[error("max question count must be > 0")]
    InvalidMaxCount,

    #[error("base question count must be <= max question count")]
    InvalidCountBounds,
}

//
// ─── LEVEL ─────────────────────────────────────────────────────────────────────
//

/// 1-based quiz level.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Level(u32);

impl Level {
    pub const FIRST: Level = Level(1);

    /// # Errors
    ///
    /// Returns `ScheduleError::InvalidLevel` for level 0.
    pub fn new(value: u32) -> Result<Self, ScheduleError> {
        if value == 0 {
            return Err(ScheduleError::InvalidLevel);
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn value(self) -> u32 {
        self.0
    }

    /// The level after this one, saturating at `u32::MAX`.
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Level({})", self.0)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── REQUEST ───────────────────────────────────────────────────────────────────
//

/// A level asking for a number of unseen questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelRequest {
    pub level: Level,
    pub desired_count: u32,
}

impl LevelRequest {
    #[must_use]
    pub fn new(level: Level, desired_count: u32) -> Self {
        Self {
            level,
            desired_count,
        }
    }
}

//
// ─── SCHEDULE ──────────────────────────────────────────────────────────────────
//

/// Maps a level to the number of questions it draws.
///
/// Count grows linearly: `base_count + step * (level - 1)`, capped at `max_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSchedule {
    base_count: u32,
    step: u32,
    max_count: u32,
}

impl LevelSchedule {
    pub const DEFAULT_BASE_COUNT: u32 = 5;
    pub const DEFAULT_STEP: u32 = 2;
    pub const DEFAULT_MAX_COUNT: u32 = 15;

    /// # Errors
    ///
    /// Returns `ScheduleError` when a count is zero or `base_count > max_count`.
    pub fn new(base_count: u32, step: u32, max_count: u32) -> Result<Self, ScheduleError> {
        if base_count == 0 {
            return Err(ScheduleError::InvalidBaseCount);
        }
        if max_count == 0 {
            return Err(ScheduleError::InvalidMaxCount);
        }
        if base_count > max_count {
            return Err(ScheduleError::InvalidCountBounds);
        }
        Ok(Self {
            base_count,
            step,
            max_count,
        })
    }

    /// Number of questions requested for `level`.
    #[must_use]
    pub fn questions_for(&self, level: Level) -> u32 {
        let growth = self.step.saturating_mul(level.value().saturating_sub(1));
        self.base_count.saturating_add(growth).min(self.max_count)
    }

    /// Builds the selector request for `level`.
    #[must_use]
    pub fn request_for(&self, level: Level) -> LevelRequest {
        LevelRequest::new(level, self.questions_for(level))
    }
}

impl Default for LevelSchedule {
    fn default() -> Self {
        Self {
            base_count: Self::DEFAULT_BASE_COUNT,
            step: Self::DEFAULT_STEP,
            max_count: Self::DEFAULT_MAX_COUNT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(n: u32) -> Level {
        Level::new(n).unwrap()
    }

    #[test]
    fn level_zero_is_rejected() {
        assert_eq!(Level::new(0), Err(ScheduleError::InvalidLevel));
    }

    #[test]
    fn default_schedule_grows_then_caps() {
        let schedule = LevelSchedule::default();
        assert_eq!(schedule.questions_for(level(1)), 5);
        assert_eq!(schedule.questions_for(level(2)), 7);
        assert_eq!(schedule.questions_for(level(5)), 13);
        assert_eq!(schedule.questions_for(level(6)), 15);
        assert_eq!(schedule.questions_for(level(40)), 15);
    }

    #[test]
    fn flat_schedule_with_zero_step() {
        let schedule = LevelSchedule::new(3, 0, 3).unwrap();
        assert_eq!(schedule.questions_for(level(1)), 3);
        assert_eq!(schedule.questions_for(level(9)), 3);
    }

    #[test]
    fn huge_levels_do_not_overflow() {
        let schedule = LevelSchedule::new(1, u32::MAX, 50).unwrap();
        assert_eq!(schedule.questions_for(level(u32::MAX)), 50);
    }

    #[test]
    fn schedule_validation() {
        assert_eq!(
            LevelSchedule::new(0, 1, 5),
            Err(ScheduleError::InvalidBaseCount)
        );
        assert_eq!(
            LevelSchedule::new(1, 1, 0),
            Err(ScheduleError::InvalidMaxCount)
        );
        assert_eq!(
            LevelSchedule::new(6, 1, 5),
            Err(ScheduleError::InvalidCountBounds)
        );
    }

    #[test]
    fn request_carries_level_and_count() {
        let request = LevelSchedule::default().request_for(level(3));
        assert_eq!(request.level, level(3));
        assert_eq!(request.desired_count, 9);
    }
}
