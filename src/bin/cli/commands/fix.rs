use anyhow::{Context, Result};

use vocab_lib::consistency::AutoFixer;

use crate::app::App;
use crate::render::terminal::{render_report, render_written};
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let mut corpus = app.load_corpus()?;
    let mut ledger = app.load_ledger()?;

    let report = AutoFixer::new(&app.dictionary).fix(&mut corpus, &mut ledger);

    // Every repair is done in memory before anything is written
    let mut written = app.save_ledger(&ledger)?.written;
    written.extend(corpus.save_dirty().context("Failed to write notebooks")?);

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "warnings": report.warnings,
                "written": written.iter().map(|p| p.to_string_lossy()).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("{}", render_report(&report, use_color));
            println!("{}", render_written(&written, use_color));
        }
    }

    Ok(())
}
