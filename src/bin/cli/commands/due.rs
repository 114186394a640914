use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use vocab_lib::ledger::QuizDirection;
use vocab_lib::scheduler::algorithm::{correct_streak, format_interval};
use vocab_lib::scheduler::review::review_threshold_days;
use vocab_lib::scheduler::{is_due, ContentKind};

use crate::app::App;
use crate::render::terminal::{paint, Color};
use crate::OutputFormat;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DueItem {
    file: String,
    unit: String,
    scene: String,
    expression: String,
    reviews: usize,
    correct_streak: usize,
    last_reviewed: Option<DateTime<Utc>>,
    interval: String,
}

pub fn run(
    app: &App,
    direction: QuizDirection,
    limit: Option<usize>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let ledger = app.load_ledger()?;
    let now = Utc::now();

    let mut items = Vec::new();
    for id in ledger.expression_ids() {
        if limit.map_or(false, |limit| items.len() >= limit) {
            break;
        }
        let expression = ledger.expression(id);
        if expression.expression.trim().is_empty() {
            continue;
        }
        let parent = ledger.parent_of(id);
        let history = ledger.history(ledger.history_of(parent));
        let kind = if history.metadata.is_flashcard() {
            ContentKind::Flashcard
        } else {
            ContentKind::Story
        };
        if !is_due(expression, direction, kind, now) {
            continue;
        }

        let logs = expression.logs(direction);
        items.push(DueItem {
            file: ledger.file(history.file).name.clone(),
            unit: history.metadata.title.clone(),
            scene: ledger.scene_title(parent).to_string(),
            expression: expression.expression.clone(),
            reviews: logs.len(),
            correct_streak: correct_streak(logs.as_slice()),
            last_reviewed: logs.latest().and_then(|r| r.learned_at),
            interval: format_interval(review_threshold_days(logs)),
        });
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        OutputFormat::Plain => {
            if items.is_empty() {
                println!("Nothing due");
                return Ok(());
            }
            for item in &items {
                let place = if item.scene.is_empty() {
                    item.unit.clone()
                } else {
                    format!("{} / {}", item.unit, item.scene)
                };
                let last = item
                    .last_reviewed
                    .map(|at| at.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{}  {}  {}",
                    paint(&item.expression, Color::BOLD, use_color),
                    paint(&place, Color::DIM, use_color),
                    paint(
                        &format!("last {} | streak {} | interval {}", last, item.correct_streak, item.interval),
                        Color::CYAN,
                        use_color
                    ),
                );
            }
            println!("\n{} due", items.len());
        }
    }

    Ok(())
}
