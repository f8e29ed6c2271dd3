//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use onboard_core::models::{collection_label, COLLECTIONS};
use onboard_core::{Draft, DrainReport, DrainStatus, QueuedSubmission, StatusView, Submitted};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print the current draft
    pub fn print_draft(&self, draft: &Draft) {
        match self.format {
            OutputFormat::Human => {
                if draft.is_empty() {
                    println!("Draft is empty.");
                    return;
                }
                for (field, value) in &draft.fields {
                    println!("{:<18} {}", format!("{}:", field), value);
                }
                for (name, _) in COLLECTIONS {
                    print_records(name, draft);
                }
                for name in draft.collections.keys() {
                    if !COLLECTIONS.iter().any(|(known, _)| known == name) {
                        print_records(name, draft);
                    }
                }
            }
            OutputFormat::Json => print_json(draft),
            OutputFormat::Quiet => {
                if !draft.is_empty() {
                    println!("{}", draft.text("company_name"));
                }
            }
        }
    }

    /// Print queued submissions, oldest first
    pub fn print_queue(&self, items: &[QueuedSubmission]) {
        match self.format {
            OutputFormat::Human => {
                if items.is_empty() {
                    println!("Outbox is empty.");
                    return;
                }
                for item in items {
                    let entry = &item.entry;
                    println!(
                        "{:>4} | {} | {} | {} | {}",
                        item.id,
                        entry.queued_at.format("%Y-%m-%d %H:%M"),
                        truncate(&entry.primary.company_name, 30),
                        truncate(&entry.primary.primary_email, 30),
                        &entry.idempotency_key.to_string()[..8]
                    );
                }
                println!("\n{} queued submission(s)", items.len());
            }
            OutputFormat::Json => print_json(&items),
            OutputFormat::Quiet => {
                for item in items {
                    println!("{}", item.id);
                }
            }
        }
    }

    /// Print the result of a drain cycle
    pub fn print_drain(&self, report: &DrainReport) {
        match self.format {
            OutputFormat::Human => {
                match report.status {
                    DrainStatus::Offline => {
                        println!("Offline: {} submission(s) queued", report.remaining)
                    }
                    DrainStatus::AllSynced => println!("✓ {}", report.status),
                    DrainStatus::SomeQueued => println!("⚠ {}", report.status),
                }
                if report.attempted > 0 {
                    println!(
                        "  Delivered: {}, failed: {}, remaining: {}",
                        report.delivered, report.failed, report.remaining
                    );
                }
            }
            OutputFormat::Json => print_json(report),
            OutputFormat::Quiet => println!("{}", report.remaining),
        }
    }

    /// Print a queued submission and the drain that followed it
    pub fn print_submitted(&self, submitted: &Submitted) {
        match self.format {
            OutputFormat::Human => {
                println!("✓ Queued submission {}", submitted.id);
                match &submitted.drain {
                    Some(report) => self.print_drain(report),
                    None => println!("⚠ Could not sync; it will be retried on the next sync."),
                }
            }
            OutputFormat::Json => print_json(&serde_json::json!({
                "id": submitted.id,
                "idempotency_key": submitted.idempotency_key,
                "drain": submitted.drain,
            })),
            OutputFormat::Quiet => println!("{}", submitted.id),
        }
    }

    /// Print the status badges
    pub fn print_status(&self, view: &StatusView) {
        match self.format {
            OutputFormat::Human => {
                println!("Connectivity: {}", view.online_badge());
                println!("Outbox:       {}", view.queue_badge());
                println!("Sync:         {}", view.sync);
            }
            OutputFormat::Json => print_json(view),
            OutputFormat::Quiet => println!("{}", view.queued),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print a warning to stderr (suppressed in quiet mode)
    pub fn warning(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => eprintln!("Warning: {}", msg),
            OutputFormat::Json => {
                eprintln!("{}", serde_json::json!({"warning": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_records(collection: &str, draft: &Draft) {
    let records = draft.records(collection);
    if records.is_empty() {
        return;
    }
    println!();
    println!("── {} ({}) ──", collection_label(collection), records.len());
    for (index, record) in records.iter().enumerate() {
        let pairs: Vec<String> = record
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        println!("{:>3}. {}", index + 1, pairs.join(", "));
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output: {}", e),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
