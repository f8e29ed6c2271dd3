//! Onboard CLI
//!
//! Command-line interface for the Caprock onboarding form: edit a draft
//! offline, queue it for submission, and sync the queue when online.

use std::fs::OpenOptions as FileOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use onboard_core::Config;

mod app;
mod commands;
mod output;
mod prompt;

use app::OpenOptions;
use output::{Output, OutputFormat};
use prompt::Prompter;

#[derive(Parser)]
#[command(name = "onboard")]
#[command(about = "Onboard - Local-first onboarding form client")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Treat the network as unavailable; nothing is sent
    #[arg(long, global = true)]
    offline: bool,

    /// Use a throwaway in-memory store for this run
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Path to config file (overrides ONBOARD_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show connectivity, outbox and draft status
    Status,
    /// Inspect or edit the draft
    Draft {
        #[command(subcommand)]
        command: Option<DraftCommands>,
    },
    /// Fill in the draft interactively
    Fill,
    /// Validate the draft and queue it for submission
    Submit,
    /// Deliver queued submissions now
    Sync,
    /// Sync whenever connectivity comes back, until interrupted
    Watch,
    /// Inspect queued submissions
    Queue {
        #[command(subcommand)]
        command: Option<QueueCommands>,
    },
    /// Export the draft and outbox to a JSON file
    Export {
        /// Output file (defaults to the data directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Import a JSON export
    Import {
        /// Export file to read
        file: PathBuf,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum DraftCommands {
    /// Show the draft
    Show,
    /// Set a form field (empty value removes it)
    Set {
        /// Field name, e.g. company_name
        field: String,
        /// New value
        value: String,
    },
    /// Add a record to a collection
    #[command(alias = "add")]
    AddRecord {
        /// Collection: locations, vlans, ssids or lobs
        collection: String,
        /// Record fields as key=value
        pairs: Vec<String>,
    },
    /// Remove a record from a collection
    #[command(alias = "rm")]
    RemoveRecord {
        /// Collection: locations, vlans, ssids or lobs
        collection: String,
        /// Record number as shown by `draft show`
        index: usize,
    },
    /// Reset the draft to empty
    Clear {
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Replace the draft with a JSON file
    Save {
        /// Draft JSON file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum QueueCommands {
    /// List queued submissions
    #[command(alias = "ls")]
    List,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (endpoint_url, data_dir, form_name, ...)
        key: String,
        /// Configuration value ("none" clears optional keys)
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands work without a store
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), &output);
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    init_logging(&config, cli.verbose);

    let options = OpenOptions {
        offline: cli.offline,
        ephemeral: cli.ephemeral,
    };
    let controller = app::open(&config, options).await?;

    match cli.command.unwrap_or(Commands::Status) {
        Commands::Status => commands::status::show(&controller, &config, &output).await,
        Commands::Draft { command } => handle_draft_command(command, &controller, &output).await,
        Commands::Fill => {
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            let mut prompter = Prompter::new(input, std::io::stdout());
            commands::fill::fill(&controller, &mut prompter, &output)
                .await
                .map(|_| ())
        }
        Commands::Submit => submit(&controller, &output).await,
        Commands::Sync => commands::sync::sync(&controller, &output).await,
        Commands::Watch => commands::sync::watch(controller, &config, cli.offline, &output).await,
        Commands::Queue { command } => match command {
            Some(QueueCommands::List) | None => commands::queue::list(&controller, &output).await,
        },
        Commands::Export { out } => {
            commands::data::export(&controller, &config, out, &output).await
        }
        Commands::Import { file } => commands::data::import(&controller, file, &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

async fn handle_draft_command(
    command: Option<DraftCommands>,
    controller: &app::Controller,
    output: &Output,
) -> Result<()> {
    match command {
        Some(DraftCommands::Show) | None => commands::draft::show(controller, output).await,
        Some(DraftCommands::Set { field, value }) => {
            commands::draft::set(controller, field, value, output).await
        }
        Some(DraftCommands::AddRecord { collection, pairs }) => {
            commands::draft::add_record(controller, collection, pairs, output).await
        }
        Some(DraftCommands::RemoveRecord { collection, index }) => {
            commands::draft::remove_record(controller, collection, index, output).await
        }
        Some(DraftCommands::Clear { yes }) => commands::draft::clear(controller, yes, output).await,
        Some(DraftCommands::Save { file }) => commands::draft::save(controller, file, output).await,
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Queue the stored draft
async fn submit(controller: &app::Controller, output: &Output) -> Result<()> {
    let draft = controller.load_draft().await?;
    let submitted = controller
        .submit(&draft)
        .await
        .context("Cannot submit the draft")?;
    output.print_submitted(&submitted);
    Ok(())
}

/// Initialize tracing
///
/// `-v`/`-vv` win over `log_level` (config or ONBOARD_LOG). Logs go to
/// stderr unless `log_file` is set.
fn init_logging(config: &Config, verbose: u8) {
    let log_level = match verbose {
        0 => config.log_level.as_deref().unwrap_or("warn"),
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::new(format!(
        "onboard_core={},onboard_cli={}",
        log_level, log_level
    ));

    if let Some(ref log_path) = config.log_file {
        let log_file = match FileOptions::new().create(true).append(true).open(log_path) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
                return;
            }
        };

        // Ignore error if already initialized
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(log_file))
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
