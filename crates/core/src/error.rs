use thiserror::Error;

use crate::model::{ProgressError, QuestionError, ScheduleError};
use crate::selector::SelectionError;

/// Any domain error raised by this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}
