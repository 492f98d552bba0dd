use clap::{Parser, Subcommand};
use quiz_core::model::{LevelSchedule, PassRatio, PlayerId, QuestionId};

/// Bible quiz with non-repeating levels.
#[derive(Debug, Parser)]
#[command(name = "quiz", version)]
pub struct Cli {
    /// SQLite URL or file path.
    #[arg(long = "db", env = "QUIZ_DB_URL", default_value = "sqlite://quiz.sqlite3")]
    pub db_url: String,

    /// Player whose progress is read and written.
    #[arg(long, env = "QUIZ_PLAYER_ID", default_value_t = 1)]
    pub player: u64,

    /// Questions drawn at level 1.
    #[arg(long, default_value_t = LevelSchedule::DEFAULT_BASE_COUNT)]
    pub base_count: u32,

    /// Extra questions per level.
    #[arg(long, default_value_t = LevelSchedule::DEFAULT_STEP)]
    pub step: u32,

    /// Upper bound on questions per level.
    #[arg(long, default_value_t = LevelSchedule::DEFAULT_MAX_COUNT)]
    pub max_count: u32,

    /// Share of correct answers needed to pass a level.
    #[arg(long, default_value_t = PassRatio::DEFAULT)]
    pub pass_ratio: f64,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    #[must_use]
    pub fn player_id(&self) -> PlayerId {
        PlayerId::new(self.player)
    }
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Add the built-in sample questions to the pool.
    Seed,
    /// Draw the questions for the current level.
    Next,
    /// Grade the pending level, e.g. `answer 4=2 11=1` (choices count from 1).
    Answer {
        #[arg(value_parser = parse_answer)]
        answers: Vec<(QuestionId, usize)>,
    },
    /// Show progress and the pending level, if any.
    Status,
    /// Forget every seen question and restart at level 1.
    Retake,
}

/// Parses `<question id>=<1-based choice>` into a 0-based choice index.
pub fn parse_answer(raw: &str) -> Result<(QuestionId, usize), String> {
    let (id, choice) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <question>=<choice>, got `{raw}`"))?;
    let id: QuestionId = id.parse().map_err(|e| format!("{e}: `{id}`"))?;
    let choice: usize = choice
        .trim()
        .parse()
        .map_err(|_| format!("invalid choice `{choice}`"))?;
    if choice == 0 {
        return Err("choices are numbered from 1".into());
    }
    Ok((id, choice - 1))
}
