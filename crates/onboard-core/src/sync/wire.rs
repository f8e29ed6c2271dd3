//! Wire format for the submission endpoint
//!
//! Each queued submission is flattened into an ordered list of form fields
//! and sent as `application/x-www-form-urlencoded`. Encoding only depends on
//! the stored entry, so a retried submission is byte-identical.
//!
//! Field layout:
//!
//! ```text
//! form-name, idempotency_key,
//! company_name, primary_email, primary_contact, primary_phone,
//! <collection>_count, <collection>_<i>_<key>..., [<collection>_truncated],
//! summary, summary_inline, payload
//! ```
//!
//! Only the first `record_limit` records of each collection are exploded
//! into indexed fields. `<collection>_count` always carries the full count
//! and `payload` always carries the full draft, so nothing is lost when the
//! flattened view is cut short.

use std::collections::BTreeSet;

use crate::models::{collection_label, Draft, QueuedSubmission, SubRecord, COLLECTIONS};

pub const CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// An encoded submission, ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireForm {
    fields: Vec<(String, String)>,
}

impl WireForm {
    /// Flatten a queued submission
    pub fn encode(item: &QueuedSubmission, record_limit: usize) -> serde_json::Result<Self> {
        let entry = &item.entry;
        let data = &entry.data;
        let mut form = WireForm { fields: Vec::new() };

        form.push("form-name", &entry.kind);
        form.push("idempotency_key", entry.idempotency_key.to_string());
        form.push("company_name", &entry.primary.company_name);
        form.push("primary_email", &entry.primary.primary_email);
        form.push("primary_contact", &entry.primary.primary_contact);
        form.push("primary_phone", data.text("primary_phone"));

        for collection in collection_names(data) {
            let records = data.records(&collection);
            form.push(format!("{}_count", collection), records.len().to_string());

            for (index, record) in records.iter().take(record_limit).enumerate() {
                for (key, value) in ordered_pairs(&collection, record) {
                    form.push(format!("{}_{}_{}", collection, index + 1, key), value);
                }
            }

            if records.len() > record_limit {
                form.push(format!("{}_truncated", collection), "true");
            }
        }

        let lines = summary_lines(item);
        form.push("summary", lines.join("\n"));
        form.push("summary_inline", lines.join(" | "));
        form.push("payload", serde_json::to_string(data)?);

        Ok(form)
    }

    fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Field pairs in wire order
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// URL-encoded request body
    pub fn body(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .finish()
    }
}

/// Known collections in form order, then any others the draft carries
fn collection_names(draft: &Draft) -> Vec<String> {
    let known: Vec<String> = COLLECTIONS.iter().map(|(name, _)| name.to_string()).collect();
    let extra: BTreeSet<&String> = draft
        .collections
        .keys()
        .filter(|name| !known.contains(name))
        .collect();

    let mut names = known;
    names.extend(extra.into_iter().cloned());
    names
}

/// Record fields with the form's declared keys first
fn ordered_pairs<'a>(collection: &str, record: &'a SubRecord) -> Vec<(&'a str, &'a str)> {
    let declared: &[&str] = COLLECTIONS
        .iter()
        .find(|(name, _)| *name == collection)
        .map(|(_, keys)| *keys)
        .unwrap_or(&[]);

    let mut pairs: Vec<(&str, &str)> = declared
        .iter()
        .filter_map(|key| record.get_key_value(*key))
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    pairs.extend(
        record
            .iter()
            .filter(|(k, _)| !declared.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str())),
    );
    pairs
}

/// Short label for a record in summaries (its name or id)
fn record_label(record: &SubRecord) -> Option<&str> {
    ["name", "id"]
        .iter()
        .filter_map(|key| record.get(*key))
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
}

/// Human-readable summary, one fact per line
pub fn summary_lines(item: &QueuedSubmission) -> Vec<String> {
    let entry = &item.entry;
    let data = &entry.data;

    let mut lines = vec![
        format!("Company: {}", or_dash(&entry.primary.company_name)),
        format!("Contact: {}", or_dash(&entry.primary.primary_contact)),
        format!("Email: {}", or_dash(&entry.primary.primary_email)),
        format!("Phone: {}", or_dash(&data.text("primary_phone"))),
    ];

    for collection in collection_names(data) {
        let records = data.records(&collection);
        let labels: Vec<&str> = records.iter().filter_map(record_label).collect();
        let label = collection_label(&collection);
        if labels.is_empty() {
            lines.push(format!("{}: {}", label, records.len()));
        } else {
            lines.push(format!("{}: {} ({})", label, records.len(), labels.join(", ")));
        }
    }

    lines.push(format!("Queued: {}", entry.queued_at.to_rfc3339()));
    lines
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}
