use anyhow::Result;
use chrono::Utc;

use vocab_lib::ledger::updater::{self, QuizOutcome, UpdateMode};
use vocab_lib::ledger::{
    ExpressionParent, Ledger, LearningExpression, QuizDirection, QuizType, FLASHCARD_UNIT_TITLE,
};
use vocab_lib::scheduler::algorithm::{quality_from_outcome, PASSING_QUALITY};

use crate::app::App;
use crate::render::terminal::{paint, render_written, Color};
use crate::OutputFormat;

pub struct RecordArgs {
    pub notebook_id: String,
    pub unit: String,
    pub scene: String,
    pub expression: String,
    pub quality: Option<i32>,
    pub missed: bool,
    pub reverse: bool,
    pub known: bool,
    pub response_time_ms: i64,
    pub mode: UpdateMode,
}

fn find<'a>(ledger: &'a Ledger, unit: &str, scene: &str, key: &str) -> Option<&'a LearningExpression> {
    let history = ledger.find_history(unit)?;
    let parent = if ledger.history(history).metadata.is_flashcard() {
        ExpressionParent::Deck(history)
    } else {
        ExpressionParent::Scene(ledger.find_scene(history, scene)?)
    };
    ledger
        .find_expression(parent, key)
        .map(|id| ledger.expression(id))
}

pub fn run(app: &App, args: RecordArgs, format: &OutputFormat, use_color: bool) -> Result<()> {
    // Ledger entries are keyed by the base form when the note has one
    let corpus = app.load_corpus()?;
    let key = corpus
        .index()
        .note_at(&args.unit, &args.scene, &args.expression)
        .map(|note| note.key.preferred().to_string())
        .unwrap_or_else(|| args.expression.clone());
    if key != args.expression {
        log::info!("Recording '{}' under its base form '{}'", args.expression, key);
    }

    let direction = if args.reverse {
        QuizDirection::Reverse
    } else {
        QuizDirection::Forward
    };
    let quiz_type = if args.reverse {
        QuizType::Reverse
    } else if args.unit == FLASHCARD_UNIT_TITLE {
        QuizType::Flashcard
    } else {
        QuizType::Notebook
    };
    let quality = args
        .quality
        .unwrap_or_else(|| quality_from_outcome(!args.missed, args.response_time_ms));
    let outcome = QuizOutcome {
        notebook_id: args.notebook_id,
        unit_title: args.unit,
        scene_title: args.scene,
        expression: key,
        is_correct: quality >= PASSING_QUALITY,
        is_known_word: args.known,
        quality,
        response_time_ms: args.response_time_ms,
        quiz_type,
        direction,
    };

    let mut ledger = app.load_ledger()?;
    let found = updater::apply(&mut ledger, &outcome, args.mode, Utc::now());
    let summary = app.save_ledger(&ledger)?;

    let expression = find(&ledger, &outcome.unit_title, &outcome.scene_title, &outcome.expression);
    let latest = expression.and_then(|e| e.logs(direction).latest());

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "found": found,
                "expression": outcome.expression,
                "record": latest,
                "easinessFactor": expression.map(|e| e.easiness(direction)),
                "written": summary.written.iter().map(|p| p.to_string_lossy()).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            let verb = if found { "Updated" } else { "Created" };
            println!("{} {}", verb, paint(&outcome.expression, Color::BOLD, use_color));
            if let Some(record) = latest {
                let interval = if record.interval_days > 0 {
                    format!(", next review in {}d", record.interval_days)
                } else {
                    String::new()
                };
                println!("  status {}{}", record.status, interval);
            }
            println!("{}", render_written(&summary.written, use_color));
        }
    }

    Ok(())
}
