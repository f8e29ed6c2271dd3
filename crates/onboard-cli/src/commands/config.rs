//! Config command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};

use onboard_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "endpoint_url": config.endpoint_url,
                    "form_name": config.form_name,
                    "autosave_debounce_ms": config.autosave_debounce_ms,
                    "wire_record_limit": config.wire_record_limit,
                    "request_timeout_secs": config.request_timeout_secs,
                    "probe_interval_secs": config.probe_interval_secs,
                    "log_level": config.log_level,
                    "log_file": config.log_file
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  data_dir:             {}", config.data_dir.display());
            println!("  endpoint_url:         {}", config.endpoint_url);
            println!("  form_name:            {}", config.form_name);
            println!("  autosave_debounce_ms: {}", config.autosave_debounce_ms);
            println!("  wire_record_limit:    {}", config.wire_record_limit);
            println!(
                "  request_timeout_secs: {}",
                config
                    .request_timeout_secs
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "(transport default)".to_string())
            );
            println!("  probe_interval_secs:  {}", config.probe_interval_secs);
            println!(
                "  log_level:            {}",
                config.log_level.as_deref().unwrap_or("(not set)")
            );
            println!(
                "  log_file:             {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    // "none" clears optional keys
    let value = if value == "none" { String::new() } else { value };
    config.set_value(&key, &value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}
