#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod selector;
pub mod time;

pub use error::Error;
pub use selector::{PoolSize, QuestionSelector, Selection, SelectionError, select_questions};
pub use time::Clock;
