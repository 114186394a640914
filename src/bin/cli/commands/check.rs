use anyhow::Result;

use crate::app::App;
use crate::render::terminal::render_report;
use crate::OutputFormat;

/// Returns false when the report has errors
pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<bool> {
    let corpus = app.load_corpus()?;
    let ledger = app.load_ledger()?;
    let report = app.validator(&corpus).validate(&ledger);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Plain => {
            println!("{}", render_report(&report, use_color));
        }
    }

    Ok(!report.has_errors())
}
