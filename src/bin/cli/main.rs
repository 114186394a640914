mod app;
mod commands;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use vocab_lib::ledger::{QuizDirection, UpdateMode};

#[derive(Parser)]
#[command(name = "vocab-cli", about = "Vocabulary ledger scheduling and consistency checks", version)]
struct Cli {
    /// Config file (default: <config dir>/vocab/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum DirectionArg {
    Forward,
    Reverse,
}

impl From<DirectionArg> for QuizDirection {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Forward => QuizDirection::Forward,
            DirectionArg::Reverse => QuizDirection::Reverse,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum ModeArg {
    /// Graded records with factor and interval
    Quality,
    /// Legacy: skip when the status did not change
    StatusChange,
    /// Legacy: skip only a repeated miss
    Always,
}

impl From<ModeArg> for UpdateMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Quality => UpdateMode::Quality,
            ModeArg::StatusChange => UpdateMode::OnStatusChange,
            ModeArg::Always => UpdateMode::Always,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Validate the ledger against the notebooks (exit code 1 on errors)
    Check,

    /// Repair the ledger and notebooks in place
    Fix,

    /// List expressions due for review
    Due {
        /// Quiz direction
        #[arg(long, default_value = "forward")]
        direction: DirectionArg,
        /// Maximum results
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Record one quiz answer in the ledger
    Record {
        /// Notebook id, used as the file name for a new history
        notebook_id: String,
        /// Episode or deck title
        unit: String,
        /// Scene title (empty for flashcard decks)
        scene: String,
        /// Expression as shown in the notebook
        expression: String,
        /// SM-2 quality grade 0-5; 3 and above counts as correct.
        /// Derived from --missed and the response time when omitted
        #[arg(long, conflicts_with = "missed")]
        quality: Option<i32>,
        /// The answer was wrong (used when no quality is given)
        #[arg(long)]
        missed: bool,
        /// Answered in the reverse direction
        #[arg(long)]
        reverse: bool,
        /// The word was already known before this quiz
        #[arg(long)]
        known: bool,
        /// Response time in milliseconds
        #[arg(long, default_value = "0")]
        response_time_ms: i64,
        /// How the answer is written to the ledger
        #[arg(long, default_value = "quality")]
        mode: ModeArg,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let app = app::App::load(cli.config.as_deref())?;

    match cli.command {
        Command::Check => {
            if !commands::check::run(&app, &cli.format, use_color)? {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Fix => {
            commands::fix::run(&app, &cli.format, use_color)?;
        }
        Command::Due { direction, limit } => {
            commands::due::run(&app, direction.into(), limit, &cli.format, use_color)?;
        }
        Command::Record {
            notebook_id,
            unit,
            scene,
            expression,
            quality,
            missed,
            reverse,
            known,
            response_time_ms,
            mode,
        } => {
            let args = commands::record::RecordArgs {
                notebook_id,
                unit,
                scene,
                expression,
                quality,
                missed,
                reverse,
                known,
                response_time_ms,
                mode: mode.into(),
            };
            commands::record::run(&app, args, &cli.format, use_color)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}
