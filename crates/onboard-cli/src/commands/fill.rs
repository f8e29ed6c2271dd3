//! Interactive form filling
//!
//! Walks the form one field at a time. Every change is handed to the
//! autosaver, so an interrupted session keeps whatever was typed up to the
//! last quiet moment.

use std::io::Write;

use anyhow::{Context, Result};
use tokio::io::AsyncBufRead;

use onboard_core::models::{collection_label, SubRecord, COLLECTIONS, SCALAR_FIELDS};
use onboard_core::sync::REQUIRED_FIELDS;
use onboard_core::Submitted;

use crate::app::Controller;
use crate::output::Output;
use crate::prompt::Prompter;

/// Answer that clears a field
const CLEAR_MARKER: &str = "-";

/// Fill in the draft interactively, optionally submitting it at the end
pub async fn fill<R, W>(
    controller: &Controller,
    prompter: &mut Prompter<R, W>,
    output: &Output,
) -> Result<Option<Submitted>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut draft = controller.load_draft().await?;
    let autosaver = controller.autosaver();

    prompter.say("Press Enter to keep a value, '-' to clear it. Changes are saved as you go.")?;

    let mut finished = false;
    for field in SCALAR_FIELDS {
        let marker = if REQUIRED_FIELDS.contains(field) { "*" } else { "" };
        let current = draft.text(field);
        let prompt = if current.is_empty() {
            format!("{}{}: ", field, marker)
        } else {
            format!("{}{} [{}]: ", field, marker, current)
        };

        let Some(answer) = prompter.ask(&prompt).await? else {
            finished = true;
            break;
        };
        let answer = answer.trim();
        if answer.is_empty() {
            continue;
        }
        if answer == CLEAR_MARKER {
            draft.unset(field);
        } else {
            draft.set_input(field, answer);
        }
        autosaver.touch(draft.clone());
    }

    'collections: for (collection, keys) in COLLECTIONS {
        if finished {
            break;
        }
        loop {
            let question = format!(
                "Add to {} ({} so far)?",
                collection_label(collection),
                draft.records(collection).len()
            );
            if !prompter.ask_yes_no(&question).await? {
                break;
            }

            let mut record = SubRecord::new();
            for key in keys.iter() {
                let Some(answer) = prompter.ask(&format!("  {}: ", key)).await? else {
                    finished = true;
                    break 'collections;
                };
                record.insert(key.to_string(), answer.trim().to_string());
            }
            draft.push_record(*collection, record);
            autosaver.touch(draft.clone());
        }
    }

    if let Err(e) = controller.validate(&draft) {
        autosaver.shutdown().await;
        prompter.say(&format!("Draft saved. Fix {} before submitting.", e))?;
        return Ok(None);
    }

    if finished || !prompter.ask_yes_no("Submit now?").await? {
        autosaver.shutdown().await;
        prompter.say("Draft saved.")?;
        return Ok(None);
    }

    // Flushed first so the draft is on disk if queueing fails
    autosaver.shutdown().await;

    let submitted = controller
        .submit(&draft)
        .await
        .context("Failed to queue submission")?;
    output.print_submitted(&submitted);
    Ok(Some(submitted))
}
