mod ids;
mod level;
mod progress;
mod question;
mod used_set;

pub use ids::{ParseIdError, PlayerId, QuestionId};
pub use level::{Level, LevelRequest, LevelSchedule, ScheduleError};
pub use progress::{LevelRecord, LevelScore, PassRatio, ProgressError, QuizProgress};
pub use question::{Question, QuestionDraft, QuestionError};
pub use used_set::UsedSet;
