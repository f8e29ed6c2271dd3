//! Submission validation
//!
//! A draft may be queued once every required field is filled in and every
//! email-shaped field looks like an address. Only the first problem is
//! reported so the caller can focus that one field.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::models::Draft;

/// Required fields, in the order they appear on the form
pub const REQUIRED_FIELDS: &[&str] = &[
    "company_name",
    "primary_contact",
    "primary_email",
    "primary_phone",
];

/// Fields that must hold an email address when filled in
pub const EMAIL_FIELDS: &[&str] = &["primary_email"];

/// Why a field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    MissingField,
    MalformedEmail,
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationReason::MissingField => f.write_str("is required"),
            ValidationReason::MalformedEmail => f.write_str("must be a valid email address"),
        }
    }
}

/// A user-correctable problem with the form
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{field}' {reason}")]
pub struct ValidationError {
    /// Field to highlight
    pub field: String,
    pub reason: ValidationReason,
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
    })
}

/// Check whether `value` looks like an email address
pub fn is_email(value: &str) -> bool {
    email_pattern().is_match(value.trim())
}

/// Validate a draft for submission
///
/// Required fields are checked first, in declaration order, then email
/// shapes. Never touches any store.
pub fn validate(draft: &Draft) -> Result<(), ValidationError> {
    for field in REQUIRED_FIELDS {
        let missing = draft.get(field).map_or(true, |value| value.is_blank());
        if missing {
            return Err(ValidationError {
                field: field.to_string(),
                reason: ValidationReason::MissingField,
            });
        }
    }

    for field in EMAIL_FIELDS {
        if let Some(value) = draft.get(field) {
            if !value.is_blank() && !is_email(&value.to_string()) {
                return Err(ValidationError {
                    field: field.to_string(),
                    reason: ValidationReason::MalformedEmail,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_draft() -> Draft {
        let mut draft = Draft::skeleton();
        draft.set("company_name", "Acme");
        draft.set("primary_contact", "Jane Doe");
        draft.set("primary_email", "jane@acme.com");
        draft.set("primary_phone", "555-0100");
        draft
    }

    #[test]
    fn test_valid_draft_passes() {
        assert!(validate(&valid_draft()).is_ok());
    }

    #[test]
    fn test_first_missing_field_in_declaration_order() {
        let mut draft = valid_draft();
        draft.unset("primary_phone");
        draft.unset("primary_contact");

        let err = validate(&draft).unwrap_err();
        assert_eq!(err.field, "primary_contact");
        assert_eq!(err.reason, ValidationReason::MissingField);
    }

    #[test]
    fn test_whitespace_counts_as_missing() {
        let mut draft = valid_draft();
        draft.set("company_name", "   ");

        let err = validate(&draft).unwrap_err();
        assert_eq!(err.field, "company_name");
    }

    #[test]
    fn test_empty_draft_reports_company_name() {
        let err = validate(&Draft::skeleton()).unwrap_err();
        assert_eq!(err.field, "company_name");
        assert_eq!(err.to_string(), "'company_name' is required");
    }

    #[test]
    fn test_malformed_email() {
        let mut draft = valid_draft();
        draft.set("primary_email", "jane at acme");

        let err = validate(&draft).unwrap_err();
        assert_eq!(err.field, "primary_email");
        assert_eq!(err.reason, ValidationReason::MalformedEmail);
        assert!(err.to_string().contains("valid email"));
    }

    #[test]
    fn test_missing_fields_reported_before_bad_email() {
        let mut draft = valid_draft();
        draft.set("primary_email", "nope");
        draft.unset("primary_phone");

        assert_eq!(validate(&draft).unwrap_err().field, "primary_phone");
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_email("jane@acme.com"));
        assert!(is_email(" ops+it@sub.example.co.uk "));
        assert!(!is_email("jane@acme"));
        assert!(!is_email("@acme.com"));
        assert!(!is_email("jane doe@acme.com"));
        assert!(!is_email(""));
    }
}
