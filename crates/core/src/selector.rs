//! Non-repeating random question selection.
//!
//! Each level draws questions the player has not seen yet. The used set is
//! passed in and returned; nothing is kept between calls.
//!
//! Sampling materializes the unseen ids and partially shuffles them, so the
//! cost of a draw depends only on the pool size, never on how depleted the
//! pool is.

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU32;
use thiserror::Error;

use crate::model::{QuestionId, UsedSet};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SelectionError {
    #[error("pool size must be a positive integer, got {size}")]
    InvalidPoolSize { size: i128 },

    #[error("desired question count must be >= 0, got {count}")]
    InvalidDesiredCount { count: i64 },

    #[error("question {id} is outside the pool of {pool_size} questions")]
    UnknownQuestion { id: QuestionId, pool_size: u32 },
}

//
// ─── POOL SIZE ─────────────────────────────────────────────────────────────────
//

/// Number of questions in the store. Always positive.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolSize(NonZeroU32);

impl PoolSize {
    /// # Errors
    ///
    /// Returns `SelectionError::InvalidPoolSize` for an empty pool.
    pub fn new(size: u32) -> Result<Self, SelectionError> {
        NonZeroU32::new(size)
            .map(Self)
            .ok_or(SelectionError::InvalidPoolSize { size: 0 })
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// Returns true when `id` addresses a question in `1..=size`.
    #[must_use]
    pub fn contains(self, id: QuestionId) -> bool {
        (1..=u64::from(self.get())).contains(&id.value())
    }
}

impl TryFrom<i64> for PoolSize {
    type Error = SelectionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(SelectionError::InvalidPoolSize {
                size: i128::from(value),
            })
    }
}

impl TryFrom<u64> for PoolSize {
    type Error = SelectionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(SelectionError::InvalidPoolSize {
                size: i128::from(value),
            })
    }
}

impl fmt::Debug for PoolSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PoolSize({})", self.0)
    }
}

impl fmt::Display for PoolSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── SELECTION ─────────────────────────────────────────────────────────────────
//

/// Outcome of one draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Newly drawn ids in draw order. Never contains duplicates.
    pub selected: Vec<QuestionId>,
    /// `used ∪ selected`; persist this before the next draw.
    pub used: UsedSet,
    /// Count the caller asked for.
    pub requested: u32,
    /// Unseen questions before this draw.
    pub available: usize,
}

impl Selection {
    /// Returns true when the pool had nothing left to draw.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.available == 0
    }

    /// Returns true when fewer questions were drawn than requested.
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.selected.len() < usize::try_from(self.requested).unwrap_or(usize::MAX)
    }

    /// Unseen questions left after this draw.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.available - self.selected.len()
    }

    #[must_use]
    pub fn selected_set(&self) -> BTreeSet<QuestionId> {
        self.selected.iter().copied().collect()
    }
}

//
// ─── SELECTOR ──────────────────────────────────────────────────────────────────
//

/// Draws unseen questions from a pool of fixed size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionSelector {
    pool: PoolSize,
}

impl QuestionSelector {
    #[must_use]
    pub fn new(pool: PoolSize) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool_size(&self) -> PoolSize {
        self.pool
    }

    /// Number of pool questions not yet in `used`.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::UnknownQuestion` if `used` holds an id outside the pool.
    pub fn available(&self, used: &UsedSet) -> Result<usize, SelectionError> {
        self.check_used(used)?;
        Ok(self.pool.get() as usize - used.len())
    }

    /// Draw up to `desired_count` questions that are not in `used`.
    ///
    /// The count is silently capped at the number of unseen questions; an
    /// exhausted pool yields an empty selection and an unchanged used set.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::UnknownQuestion` if `used` holds an id outside the pool.
    pub fn select<R: Rng + ?Sized>(
        &self,
        used: &UsedSet,
        desired_count: u32,
        rng: &mut R,
    ) -> Result<Selection, SelectionError> {
        self.check_used(used)?;

        let mut candidates: Vec<QuestionId> = (1..=u64::from(self.pool.get()))
            .map(QuestionId::new)
            .filter(|id| !used.contains(*id))
            .collect();
        let available = candidates.len();
        let take = usize::try_from(desired_count)
            .unwrap_or(usize::MAX)
            .min(available);

        let (picked, _) = candidates.partial_shuffle(rng, take);
        let selected = picked.to_vec();

        let mut updated = used.clone();
        updated.extend(selected.iter().copied());

        Ok(Selection {
            selected,
            used: updated,
            requested: desired_count,
            available,
        })
    }

    fn check_used(&self, used: &UsedSet) -> Result<(), SelectionError> {
        // The set is ordered, so its two ends bound every member.
        let ends = [used.as_set().first(), used.as_set().last()];
        for id in ends.into_iter().flatten() {
            if !self.pool.contains(*id) {
                return Err(SelectionError::UnknownQuestion {
                    id: *id,
                    pool_size: self.pool.get(),
                });
            }
        }
        Ok(())
    }
}

/// Draw from a pool described by untrusted signed inputs.
///
/// # Errors
///
/// Returns `SelectionError` if `pool_size <= 0`, `desired_count < 0`, or
/// `used` holds an id outside `1..=pool_size`.
pub fn select_questions<R: Rng + ?Sized>(
    pool_size: i64,
    used: &UsedSet,
    desired_count: i64,
    rng: &mut R,
) -> Result<Selection, SelectionError> {
    let pool = PoolSize::try_from(pool_size)?;
    if desired_count < 0 {
        return Err(SelectionError::InvalidDesiredCount {
            count: desired_count,
        });
    }
    let desired = u32::try_from(desired_count).unwrap_or(u32::MAX);
    QuestionSelector::new(pool).select(used, desired, rng)
}
