use std::fmt;

use clap::Parser;
use quiz_core::model::{LevelSchedule, PassRatio, QuizProgress};
use services::{AppServices, Clock, LevelRound, QuizSettings};
use tracing::debug;

mod cli;
mod logger;
mod seed;

use cli::{Cli, Command};

#[derive(Debug)]
enum ArgsError {
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn settings_from(cli: &Cli) -> Result<QuizSettings, quiz_core::Error> {
    Ok(QuizSettings {
        schedule: LevelSchedule::new(cli.base_count, cli.step, cli.max_count)?,
        pass_ratio: PassRatio::new(cli.pass_ratio)?,
    })
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Make sure the database file exists; sqlx will not create it on its own.
fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn print_round(round: &LevelRound) {
    if round.exhausted {
        println!("You've completed all available questions. Run `quiz retake` to start over.");
        return;
    }

    println!(
        "Level {} ({} question{})",
        round.level,
        round.questions.len(),
        if round.questions.len() == 1 { "" } else { "s" }
    );
    for question in &round.questions {
        println!();
        println!("#{} {}", question.id(), question.prompt());
        for (index, choice) in question.choices().iter().enumerate() {
            println!("   {}) {choice}", index + 1);
        }
    }
    println!();
    if round.is_short() {
        println!("Only {} new questions were left for this level.", round.questions.len());
    }
    println!("{} unseen question(s) remain.", round.remaining);
}

fn print_progress(progress: &QuizProgress) {
    println!("Player {}", progress.player_id());
    println!("  level:     {}", progress.current_level());
    println!("  seen:      {}", progress.used().len());
    println!("  correct:   {}", progress.total_correct());
    println!("  retakes:   {}", progress.attempts());
    for record in progress.levels() {
        match record.correct() {
            Some(correct) => println!(
                "  level {:>3}: {correct}/{}",
                record.level(),
                record.questions().len()
            ),
            None => println!(
                "  level {:>3}: {} question(s) awaiting answers",
                record.level(),
                record.questions().len()
            ),
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = settings_from(&cli)?;
    let db_url = normalize_sqlite_url(&cli.db_url);
    debug!(db = %db_url, ?settings, "starting");

    // Open + migrate SQLite in the binary glue so core/services stay storage-agnostic.
    prepare_sqlite_file(&db_url)?;
    let app = AppServices::new_sqlite(&db_url, Clock::default(), settings).await?;
    let player = cli.player_id();

    match cli.command {
        Command::Seed => {
            let added = app.questions().add_questions(seed::sample_drafts()).await?;
            let total = app.questions().question_count().await?;
            println!("Added {} questions ({total} in pool).", added.len());
        }
        Command::Next => {
            let round = app.quiz().next_level(player).await?;
            print_round(&round);
        }
        Command::Answer { answers } => {
            let score = app.quiz().submit_answers(player, &answers).await?;
            println!(
                "Level {}: {}/{} correct, {}.",
                score.level,
                score.correct,
                score.total,
                if score.passed { "passed" } else { "not passed" }
            );
        }
        Command::Status => {
            let progress = app.quiz().progress(player).await?;
            print_progress(&progress);
            if let Some(round) = app.quiz().pending_round(player).await? {
                println!();
                print_round(&round);
            }
        }
        Command::Retake => {
            let progress = app.quiz().retake(player).await?;
            println!(
                "Starting attempt {} at level {}.",
                progress.attempts() + 1,
                progress.current_level()
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = logger::try_init() {
        eprintln!("failed to set up logging: {err}");
    }
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_urls_pass_through() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url(" sqlite:///tmp/quiz.db "),
            "sqlite:///tmp/quiz.db"
        );
    }

    #[test]
    fn bare_paths_become_absolute_urls() {
        assert_eq!(normalize_sqlite_url("/data/quiz.db"), "sqlite:///data/quiz.db");
        let relative = normalize_sqlite_url("sqlite:quiz.db");
        assert!(relative.starts_with("sqlite:///"));
        assert!(relative.ends_with("quiz.db"));
    }

    #[test]
    fn invalid_settings_are_reported() {
        let cli = Cli::try_parse_from(["quiz", "--base-count", "0", "status"]).unwrap();
        let err = settings_from(&cli).unwrap_err();
        assert!(matches!(err, quiz_core::Error::Schedule(_)));

        let cli = Cli::try_parse_from(["quiz", "--pass-ratio", "1.5", "status"]).unwrap();
        let err = settings_from(&cli).unwrap_err();
        assert!(matches!(err, quiz_core::Error::Progress(_)));
    }
}
