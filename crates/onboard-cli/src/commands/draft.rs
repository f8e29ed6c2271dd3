//! Draft command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use onboard_core::models::{COLLECTIONS, SCALAR_FIELDS};
use onboard_core::{Draft, SubRecord};

use crate::app::Controller;
use crate::output::Output;
use crate::prompt::confirm;

/// Show the stored draft
pub async fn show(controller: &Controller, output: &Output) -> Result<()> {
    let draft = controller.load_draft().await?;
    output.print_draft(&draft);
    Ok(())
}

/// Set one scalar field; an empty value removes it
///
/// Fields outside the onboarding form are stored anyway, with a warning.
pub async fn set(
    controller: &Controller,
    field: String,
    value: String,
    output: &Output,
) -> Result<()> {
    let field = field.trim().to_string();
    if field.is_empty() {
        bail!("Field name cannot be empty");
    }
    if let Some(warning) = unknown_field_warning(&field) {
        output.warning(&warning);
    }

    let mut draft = controller.load_draft().await?;
    if value.trim().is_empty() {
        draft.unset(&field);
    } else {
        draft.set_input(&field, &value);
    }
    controller
        .save_draft(&draft)
        .await
        .context("Failed to save draft")?;

    output.success(&format!("Set {} = {}", field, draft.text(&field)));
    Ok(())
}

/// Append a record built from `key=value` pairs
pub async fn add_record(
    controller: &Controller,
    collection: String,
    pairs: Vec<String>,
    output: &Output,
) -> Result<()> {
    let record = parse_record(&collection, &pairs)?;

    let mut draft = controller.load_draft().await?;
    draft.push_record(collection.clone(), record);
    controller
        .save_draft(&draft)
        .await
        .context("Failed to save draft")?;

    output.success(&format!(
        "Added record {} to {}",
        draft.records(&collection).len(),
        collection
    ));
    Ok(())
}

/// Remove a record by its 1-based position
pub async fn remove_record(
    controller: &Controller,
    collection: String,
    index: usize,
    output: &Output,
) -> Result<()> {
    let mut draft = controller.load_draft().await?;
    let removed = index
        .checked_sub(1)
        .and_then(|i| draft.remove_record(&collection, i));
    if removed.is_none() {
        bail!(
            "No record {} in {} ({} record(s))",
            index,
            collection,
            draft.records(&collection).len()
        );
    }

    controller
        .save_draft(&draft)
        .await
        .context("Failed to save draft")?;
    output.success(&format!("Removed record {} from {}", index, collection));
    Ok(())
}

/// Reset the draft to empty
pub async fn clear(controller: &Controller, yes: bool, output: &Output) -> Result<()> {
    let draft = controller.load_draft().await?;
    if draft.is_empty() {
        output.message("Draft is already empty.");
        return Ok(());
    }

    if !yes && output.should_prompt() && !confirm("Clear the current draft?")? {
        output.message("Cancelled.");
        return Ok(());
    }

    controller
        .clear_draft()
        .await
        .context("Failed to clear draft")?;
    output.success("Draft cleared");
    Ok(())
}

/// Replace the draft with the contents of a JSON file
pub async fn save(controller: &Controller, file: PathBuf, output: &Output) -> Result<()> {
    let content = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let draft: Draft = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a valid draft", file.display()))?;

    controller
        .save_draft(&draft)
        .await
        .context("Failed to save draft")?;
    output.success(&format!("Draft saved from {}", file.display()));
    Ok(())
}

/// Warning text for a field the onboarding form does not declare
fn unknown_field_warning(field: &str) -> Option<String> {
    if SCALAR_FIELDS.contains(&field) {
        return None;
    }
    Some(format!(
        "'{}' is not an onboarding form field; storing it anyway. Known fields: {}",
        field,
        SCALAR_FIELDS.join(", ")
    ))
}

/// Build a record for `collection` from `key=value` arguments
///
/// Every declared key is present in the result; missing ones are empty.
fn parse_record(collection: &str, pairs: &[String]) -> Result<SubRecord> {
    let Some((_, keys)) = COLLECTIONS.iter().find(|(name, _)| *name == collection) else {
        let names: Vec<&str> = COLLECTIONS.iter().map(|(name, _)| *name).collect();
        bail!(
            "Unknown collection '{}'. Valid collections: {}",
            collection,
            names.join(", ")
        );
    };

    let mut record: SubRecord = keys
        .iter()
        .map(|key| (key.to_string(), String::new()))
        .collect();

    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Expected key=value, got '{}'", pair);
        };
        let key = key.trim();
        if !keys.contains(&key) {
            bail!(
                "Unknown key '{}' for {}. Valid keys: {}",
                key,
                collection,
                keys.join(", ")
            );
        }
        record.insert(key.to_string(), value.trim().to_string());
    }

    Ok(record)
}
