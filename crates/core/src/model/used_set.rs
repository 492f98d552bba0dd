use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::model::ids::QuestionId;

/// Questions already shown to a player during the current attempt.
///
/// The set only grows between retakes. It is an explicit value: callers load
/// it from storage, pass it to the selector and persist the updated copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsedSet(BTreeSet<QuestionId>);

impl UsedSet {
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    #[must_use]
    pub fn contains(&self, id: QuestionId) -> bool {
        self.0.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.0.iter().copied()
    }

    /// Returns `self ∪ other` without modifying either side.
    #[must_use]
    pub fn union(&self, other: &BTreeSet<QuestionId>) -> Self {
        Self(self.0.union(other).copied().collect())
    }

    /// Returns true when `other` shares no id with this set.
    #[must_use]
    pub fn is_disjoint(&self, other: &BTreeSet<QuestionId>) -> bool {
        self.0.is_disjoint(other)
    }

    /// Forget every shown question (retake).
    pub fn clear(&mut self) {
        self.0.clear();
    }

    #[must_use]
    pub fn as_set(&self) -> &BTreeSet<QuestionId> {
        &self.0
    }
}

impl FromIterator<QuestionId> for UsedSet {
    fn from_iter<I: IntoIterator<Item = QuestionId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<QuestionId> for UsedSet {
    fn extend<I: IntoIterator<Item = QuestionId>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}
