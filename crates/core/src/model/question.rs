use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("question needs between {min} and {max} choices, got {got}")]
    ChoiceCount { min: usize, max: usize, got: usize },

    #[error("choice {index} cannot be empty")]
    EmptyChoice { index: usize },

    #[error("correct choice {index} is out of range")]
    CorrectChoiceOutOfRange { index: usize },
}

/// Unvalidated question input, as typed by an editor or read from a seed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub prompt: String,
    pub choices: Vec<String>,
    pub correct_choice: usize,
    pub reference: Option<String>,
}

impl QuestionDraft {
    /// Validate the draft and return it with surrounding whitespace removed.
    ///
    /// Normalizing an already normalized draft returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or a choice is blank, the number of
    /// choices is outside `Question::MIN_CHOICES..=Question::MAX_CHOICES`, or the
    /// correct index does not address a choice.
    pub fn normalize(self) -> Result<Self, QuestionError> {
        let prompt = self.prompt.trim().to_owned();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        let got = self.choices.len();
        if !(Question::MIN_CHOICES..=Question::MAX_CHOICES).contains(&got) {
            return Err(QuestionError::ChoiceCount {
                min: Question::MIN_CHOICES,
                max: Question::MAX_CHOICES,
                got,
            });
        }

        let mut choices = Vec::with_capacity(got);
        for (index, choice) in self.choices.into_iter().enumerate() {
            let trimmed = choice.trim();
            if trimmed.is_empty() {
                return Err(QuestionError::EmptyChoice { index });
            }
            choices.push(trimmed.to_owned());
        }

        if self.correct_choice >= choices.len() {
            return Err(QuestionError::CorrectChoiceOutOfRange {
                index: self.correct_choice,
            });
        }

        let reference = self
            .reference
            .map(|r| r.trim().to_owned())
            .filter(|r| !r.is_empty());

        Ok(Self {
            prompt,
            choices,
            correct_choice: self.correct_choice,
            reference,
        })
    }

    /// Validate the draft and attach the id assigned by the question store.
    ///
    /// # Errors
    ///
    /// Returns the same `QuestionError` that `normalize` would.
    pub fn validate(self, id: QuestionId) -> Result<Question, QuestionError> {
        let draft = self.normalize()?;
        Ok(Question {
            id,
            prompt: draft.prompt,
            choices: draft.choices,
            correct_choice: draft.correct_choice,
            reference: draft.reference,
        })
    }

    /// Run validation without an id, e.g. before asking the store for one.
    ///
    /// # Errors
    ///
    /// Returns the same `QuestionError` that `normalize` would.
    pub fn check(&self) -> Result<(), QuestionError> {
        self.clone().normalize().map(|_| ())
    }
}

/// A multiple-choice quiz question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    choices: Vec<String>,
    correct_choice: usize,
    reference: Option<String>,
}

impl Question {
    pub const MIN_CHOICES: usize = 2;
    pub const MAX_CHOICES: usize = 6;

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }

    #[must_use]
    pub fn correct_choice(&self) -> usize {
        self.correct_choice
    }

    /// Scripture reference backing the answer, e.g. "Genesis 1:1".
    #[must_use]
    pub fn reference(&self) -> Option<&str> {
        self.reference.as_deref()
    }

    #[must_use]
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct_choice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            prompt: "  Who built the ark?  ".into(),
            choices: vec!["Moses".into(), " Noah ".into(), "David".into()],
            correct_choice: 1,
            reference: Some("Genesis 6:14".into()),
        }
    }

    #[test]
    fn validate_trims_text() {
        let question = draft().validate(QuestionId::new(1)).unwrap();
        assert_eq!(question.prompt(), "Who built the ark?");
        assert_eq!(question.choices()[1], "Noah");
        assert!(question.is_correct(1));
        assert!(!question.is_correct(0));
        assert_eq!(question.reference(), Some("Genesis 6:14"));
    }

    #[test]
    fn blank_prompt_is_rejected() {
        let mut d = draft();
        d.prompt = "   ".into();
        assert_eq!(
            d.validate(QuestionId::new(1)),
            Err(QuestionError::EmptyPrompt)
        );
    }

    #[test]
    fn single_choice_is_rejected() {
        let mut d = draft();
        d.choices = vec!["Noah".into()];
        d.correct_choice = 0;
        assert_eq!(
            d.validate(QuestionId::new(1)),
            Err(QuestionError::ChoiceCount {
                min: 2,
                max: 6,
                got: 1
            })
        );
    }

    #[test]
    fn blank_choice_reports_index() {
        let mut d = draft();
        d.choices[2] = " ".into();
        assert_eq!(
            d.validate(QuestionId::new(1)),
            Err(QuestionError::EmptyChoice { index: 2 })
        );
    }

    #[test]
    fn correct_choice_must_exist() {
        let mut d = draft();
        d.correct_choice = 3;
        assert_eq!(
            d.validate(QuestionId::new(1)),
            Err(QuestionError::CorrectChoiceOutOfRange { index: 3 })
        );
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = draft().normalize().unwrap();
        assert_eq!(once.prompt, "Who built the ark?");
        assert_eq!(once.clone().normalize(), Ok(once));
    }

    #[test]
    fn blank_reference_becomes_none() {
        let mut d = draft();
        d.reference = Some("  ".into());
        let question = d.validate(QuestionId::new(2)).unwrap();
        assert_eq!(question.reference(), None);
    }
}
