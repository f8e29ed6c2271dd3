//! Data models for the onboarding client
//!
//! Defines the core data structures: the in-progress `Draft` and the
//! immutable `QueuedSubmission` that wraps a snapshot of it.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

/// Repeatable sub-record collections on the onboarding form, with the keys
/// each record carries.
pub const COLLECTIONS: &[(&str, &[&str])] = &[
    ("locations", &["name", "address", "isp", "notes"]),
    ("vlans", &["id", "purpose", "subnet"]),
    ("ssids", &["name", "purpose", "notes"]),
    ("lobs", &["name", "vendor", "notes"]),
];

/// Scalar fields on the onboarding form, in form order
pub const SCALAR_FIELDS: &[&str] = &[
    "company_name",
    "primary_contact",
    "primary_email",
    "primary_phone",
    "business_address",
    "business_hours",
    "m365_tenant",
    "primary_domain",
    "m365_notes",
    "wan_ip",
    "router_model",
    "firewall",
    "switching",
    "wireless",
    "count_desktops",
    "count_laptops",
    "count_servers",
    "os_av",
    "backup",
    "compliance",
    "escalation",
    "notes",
];

/// Scalar fields stored as numbers
pub const NUMERIC_FIELDS: &[&str] = &["count_desktops", "count_laptops", "count_servers"];

/// Human labels for collections, used in summaries
pub fn collection_label(name: &str) -> &str {
    match name {
        "locations" => "Locations",
        "vlans" => "VLANs",
        "ssids" => "SSIDs",
        "lobs" => "LOB apps",
        other => other,
    }
}

/// A single scalar form value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Number(Number),
}

impl FieldValue {
    /// Parse raw form input for `field`
    ///
    /// Numeric fields coerce anything unparseable to 0, the way the web form
    /// did; everything else is trimmed text.
    pub fn from_input(field: &str, raw: &str) -> Self {
        let raw = raw.trim();
        if NUMERIC_FIELDS.contains(&field) {
            let number = raw
                .parse::<i64>()
                .map(Number::from)
                .ok()
                .or_else(|| raw.parse::<f64>().ok().and_then(Number::from_f64))
                .unwrap_or_else(|| Number::from(0));
            FieldValue::Number(number)
        } else {
            FieldValue::Text(raw.to_string())
        }
    }

    /// True for empty or whitespace-only text
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Number(_) => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(Number::from(n))
    }
}

/// One repeatable sub-record (a location, VLAN, SSID, or LOB application)
pub type SubRecord = BTreeMap<String, String>;

/// The single in-progress form state
///
/// Serializes to one flat JSON object: scalars as strings or numbers,
/// collections as arrays of string objects.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub fields: BTreeMap<String, FieldValue>,
    pub collections: BTreeMap<String, Vec<SubRecord>>,
}

impl Draft {
    /// Empty structural skeleton: no scalars, every known collection empty
    pub fn skeleton() -> Self {
        Self {
            fields: BTreeMap::new(),
            collections: COLLECTIONS
                .iter()
                .map(|(name, _)| (name.to_string(), Vec::new()))
                .collect(),
        }
    }

    /// True when no scalar is set and every collection is empty
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.collections.values().all(Vec::is_empty)
    }

    /// Get a scalar field
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Get a scalar field as text (numbers are formatted)
    pub fn text(&self, field: &str) -> String {
        self.fields
            .get(field)
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    /// Set a scalar field
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Set a scalar field from raw form input (trimmed, numeric coercion)
    pub fn set_input(&mut self, field: &str, raw: &str) {
        self.fields
            .insert(field.to_string(), FieldValue::from_input(field, raw));
    }

    /// Remove a scalar field
    pub fn unset(&mut self, field: &str) -> Option<FieldValue> {
        self.fields.remove(field)
    }

    /// Records of a collection (empty if the collection doesn't exist)
    pub fn records(&self, collection: &str) -> &[SubRecord] {
        self.collections
            .get(collection)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Append a sub-record to a collection, creating the collection if needed
    pub fn push_record(&mut self, collection: impl Into<String>, record: SubRecord) {
        self.collections
            .entry(collection.into())
            .or_default()
            .push(record);
    }

    /// Remove the sub-record at `index`, returning it if it existed
    pub fn remove_record(&mut self, collection: &str, index: usize) -> Option<SubRecord> {
        let records = self.collections.get_mut(collection)?;
        if index < records.len() {
            Some(records.remove(index))
        } else {
            None
        }
    }

    /// Denormalized summary used for display and the wire form
    pub fn primary(&self) -> PrimarySummary {
        PrimarySummary {
            company_name: self.text("company_name"),
            primary_email: self.text("primary_email"),
            primary_contact: self.text("primary_contact"),
        }
    }
}

impl Serialize for Draft {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + self.collections.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        for (key, records) in &self.collections {
            map.serialize_entry(key, records)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Draft {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = Map::<String, Value>::deserialize(deserializer)?;
        Draft::from_object(object).map_err(de::Error::custom)
    }
}

impl Draft {
    fn from_object(object: Map<String, Value>) -> Result<Self, String> {
        let mut draft = Draft::default();
        for (key, value) in object {
            match value {
                Value::String(s) => {
                    draft.fields.insert(key, FieldValue::Text(s));
                }
                Value::Number(n) => {
                    draft.fields.insert(key, FieldValue::Number(n));
                }
                Value::Array(items) => {
                    let records = items
                        .into_iter()
                        .map(|item| record_from_value(&key, item))
                        .collect::<Result<Vec<_>, _>>()?;
                    draft.collections.insert(key, records);
                }
                other => {
                    return Err(format!(
                        "field '{}' must be a string, number, or list of records, got {}",
                        key,
                        json_kind(&other)
                    ))
                }
            }
        }
        Ok(draft)
    }
}

fn record_from_value(collection: &str, value: Value) -> Result<SubRecord, String> {
    let Value::Object(object) = value else {
        return Err(format!(
            "records in '{}' must be objects, got {}",
            collection,
            json_kind(&value)
        ));
    };

    object
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => Ok((key, s)),
            other => Err(format!(
                "'{}.{}' must be a string, got {}",
                collection,
                key,
                json_kind(&other)
            )),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// Small subset of fields copied out of the draft for quick display
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrimarySummary {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub primary_email: String,
    #[serde(default)]
    pub primary_contact: String,
}

/// Identifier assigned by the store when a submission is queued
pub type SubmissionId = i64;

/// The stored body of a queued submission (everything except its id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEntry {
    /// Form identifier, e.g. `caprock-onboarding`
    #[serde(rename = "type")]
    pub kind: String,
    /// Stable key sent with every delivery attempt so the endpoint can dedupe
    #[serde(default = "Uuid::new_v4")]
    pub idempotency_key: Uuid,
    pub primary: PrimarySummary,
    /// Full draft snapshot at queue time
    pub data: Draft,
    pub queued_at: DateTime<Utc>,
}

impl OutboxEntry {
    /// Snapshot a draft into a new entry
    pub fn new(kind: impl Into<String>, draft: &Draft) -> Self {
        Self {
            kind: kind.into(),
            idempotency_key: Uuid::new_v4(),
            primary: draft.primary(),
            data: draft.clone(),
            queued_at: Utc::now(),
        }
    }
}

/// A queued submission as read back from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedSubmission {
    pub id: SubmissionId,
    #[serde(flatten)]
    pub entry: OutboxEntry,
}

impl QueuedSubmission {
    /// Sort submissions oldest first (ties broken by id)
    pub fn sort_oldest_first(items: &mut [QueuedSubmission]) {
        items.sort_by(|a, b| {
            a.entry
                .queued_at
                .cmp(&b.entry.queued_at)
                .then(a.id.cmp(&b.id))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn sample_draft() -> Draft {
        let mut draft = Draft::skeleton();
        draft.set("company_name", "Acme");
        draft.set("primary_email", "jane@acme.com");
        draft.set("count_desktops", 12);
        let mut location = SubRecord::new();
        location.insert("name".into(), "HQ".into());
        location.insert("address".into(), "1 Main St".into());
        draft.push_record("locations", location);
        draft
    }

    #[test]
    fn test_skeleton_has_all_collections() {
        let draft = Draft::skeleton();
        assert!(draft.is_empty());
        assert!(draft.fields.is_empty());
        for (name, _) in COLLECTIONS {
            assert!(draft.collections.contains_key(*name));
        }
    }

    #[test]
    fn test_draft_serializes_flat() {
        let value = serde_json::to_value(sample_draft()).unwrap();
        assert_eq!(value["company_name"], "Acme");
        assert_eq!(value["count_desktops"], 12);
        assert_eq!(value["locations"][0]["name"], "HQ");
        assert_eq!(value["vlans"], json!([]));
    }

    #[test]
    fn test_draft_deserializes_browser_shape() {
        let value = json!({
            "company_name": "Acme",
            "count_laptops": 3,
            "ssids": [{"name": "Guest", "purpose": "Guest", "notes": ""}],
            "ts": "2024-05-01T12:00:00.000Z"
        });
        let draft: Draft = serde_json::from_value(value).unwrap();
        assert_eq!(draft.text("company_name"), "Acme");
        assert_eq!(draft.get("count_laptops"), Some(&FieldValue::from(3)));
        assert_eq!(draft.records("ssids")[0]["name"], "Guest");
        assert_eq!(draft.text("ts"), "2024-05-01T12:00:00.000Z");
    }

    #[test]
    fn test_draft_rejects_unsupported_values() {
        assert!(serde_json::from_value::<Draft>(json!({"flag": true})).is_err());
        assert!(serde_json::from_value::<Draft>(json!({"notes": null})).is_err());
        assert!(serde_json::from_value::<Draft>(json!({"vlans": [1, 2]})).is_err());
        assert!(serde_json::from_value::<Draft>(json!({"vlans": [{"id": 20}]})).is_err());
    }

    #[test]
    fn test_empty_object_is_empty_draft() {
        let draft: Draft = serde_json::from_value(json!({})).unwrap();
        assert!(draft.is_empty());
    }

    #[test]
    fn test_numeric_input_coercion() {
        let mut draft = Draft::default();
        draft.set_input("count_servers", " 4 ");
        draft.set_input("count_laptops", "lots");
        draft.set_input("company_name", "  Acme  ");

        assert_eq!(draft.get("count_servers"), Some(&FieldValue::from(4)));
        assert_eq!(draft.get("count_laptops"), Some(&FieldValue::from(0)));
        assert_eq!(draft.text("company_name"), "Acme");
    }

    #[test]
    fn test_remove_record() {
        let mut draft = sample_draft();
        assert!(draft.remove_record("locations", 3).is_none());
        assert!(draft.remove_record("missing", 0).is_none());
        let removed = draft.remove_record("locations", 0).unwrap();
        assert_eq!(removed["name"], "HQ");
        assert!(draft.records("locations").is_empty());
    }

    #[test]
    fn test_entry_is_point_in_time_snapshot() {
        let mut draft = sample_draft();
        let entry = OutboxEntry::new("caprock-onboarding", &draft);

        draft.set("company_name", "Changed");
        draft.push_record("vlans", SubRecord::new());

        assert_eq!(entry.data.text("company_name"), "Acme");
        assert!(entry.data.records("vlans").is_empty());
        assert_eq!(entry.primary.company_name, "Acme");
        assert_eq!(entry.primary.primary_email, "jane@acme.com");
    }

    #[test]
    fn test_queued_submission_json_shape() {
        let entry = OutboxEntry::new("caprock-onboarding", &sample_draft());
        let queued = QueuedSubmission { id: 7, entry };
        let value = serde_json::to_value(&queued).unwrap();

        assert_eq!(value["id"], 7);
        assert_eq!(value["type"], "caprock-onboarding");
        assert!(value["queuedAt"].is_string());
        assert!(value["idempotencyKey"].is_string());
        assert_eq!(value["data"]["company_name"], "Acme");

        let parsed: QueuedSubmission = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, queued);
    }

    #[test]
    fn test_sort_oldest_first() {
        let draft = sample_draft();
        let base = OutboxEntry::new("f", &draft);
        let mut newer = base.clone();
        newer.queued_at = base.queued_at + Duration::seconds(5);

        let mut items = vec![
            QueuedSubmission { id: 3, entry: newer },
            QueuedSubmission { id: 2, entry: base.clone() },
            QueuedSubmission { id: 1, entry: base },
        ];
        QueuedSubmission::sort_oldest_first(&mut items);
        let ids: Vec<_> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
