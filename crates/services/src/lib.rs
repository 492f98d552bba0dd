#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod question_service;
pub mod quiz_service;

pub use quiz_core::Clock;

pub use app_services::{AppServices, QuizSettings};
pub use error::{AppServicesError, QuestionServiceError, QuizServiceError};
pub use question_service::QuestionService;
pub use quiz_service::{LevelRound, QuizService};
