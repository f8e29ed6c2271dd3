//! Export and import command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;

use onboard_core::{Config, ExportDocument};

use crate::app::Controller;
use crate::output::{Output, OutputFormat};

/// Write the draft and outbox to a JSON file
///
/// Defaults to `<data_dir>/<form_name>-export-<unix millis>.json`.
pub async fn export(
    controller: &Controller,
    config: &Config,
    out: Option<PathBuf>,
    output: &Output,
) -> Result<()> {
    let doc = controller.export().await.context("Failed to read the store")?;
    let path = out.unwrap_or_else(|| config.export_path(Utc::now().timestamp_millis()));

    doc.write_to(&path)
        .with_context(|| format!("Failed to write export to {}", path.display()))?;

    match output.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "path": path,
                "draft": doc.draft.is_some(),
                "queued": doc.outbox.len()
            })
        ),
        OutputFormat::Quiet => println!("{}", path.display()),
        OutputFormat::Human => output.success(&format!(
            "Exported {} queued submission(s) to {}",
            doc.outbox.len(),
            path.display()
        )),
    }
    Ok(())
}

/// Load an export file into the store
pub async fn import(controller: &Controller, file: PathBuf, output: &Output) -> Result<()> {
    let doc = ExportDocument::read_from(&file)
        .with_context(|| format!("Failed to read export file {}", file.display()))?;
    let summary = controller
        .import(&doc)
        .await
        .context("Failed to import into the store")?;

    match output.format {
        OutputFormat::Json => println!("{}", serde_json::json!(summary)),
        OutputFormat::Quiet => println!("{}", summary.queued),
        OutputFormat::Human => {
            output.success(&format!(
                "Imported {} submission(s) from {}",
                summary.queued,
                file.display()
            ));
            if summary.skipped > 0 {
                println!("  Skipped {} already queued", summary.skipped);
            }
            if summary.draft_restored {
                println!("  Draft restored");
            }
        }
    }
    Ok(())
}
