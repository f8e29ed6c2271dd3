//! Status command handler

use anyhow::Result;

use onboard_core::{Config, DurableStoreExt};

use crate::app::Controller;
use crate::output::{Output, OutputFormat};

/// Show connectivity, outbox and draft status
pub async fn show(controller: &Controller, config: &Config, output: &Output) -> Result<()> {
    let view = controller.status().await?;
    let draft = controller.store().load_draft().await?;
    let store_path = config.store_path();
    let store_size = std::fs::metadata(&store_path).map(|m| m.len()).ok();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "online": view.online,
                    "queued": view.queued,
                    "sync": view.sync,
                    "endpoint_url": config.endpoint_url,
                    "draft": {
                        "empty": draft.is_empty(),
                        "company_name": draft.text("company_name"),
                    },
                    "storage": {
                        "path": store_path,
                        "size": store_size,
                    }
                })
            );
        }
        OutputFormat::Quiet => output.print_status(&view),
        OutputFormat::Human => {
            println!("Onboard Status");
            println!("==============");
            println!();
            output.print_status(&view);
            println!();
            println!("Draft:");
            if draft.is_empty() {
                println!("  (empty)");
            } else {
                let company = draft.text("company_name");
                println!(
                    "  Company: {}",
                    if company.is_empty() { "(not set)" } else { company.as_str() }
                );
                println!("  Fields:  {}", draft.fields.len());
            }
            println!();
            println!("Endpoint: {}", config.endpoint_url);
            println!();
            println!("Storage:");
            println!("  Location: {}", store_path.display());
            match store_size {
                Some(size) => println!("  Size:     {}", human_size(size)),
                None => println!("  Size:     (not created)"),
            }
        }
    }

    Ok(())
}

fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
