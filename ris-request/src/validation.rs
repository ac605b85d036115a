//! Field validation
//!
//! - [`ValidationError`]: a classified rejection of one field value
//! - [`FieldRules`]: rule descriptors evaluated by [`ValidationError::check`]
//! - [`RequestValidator`]: pre-submission pass over an assembled request

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::request::RisRequest;
use crate::types::InquiryMode;

/// Validation failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Value longer than the allowed maximum
    Length,
    /// Value does not match the field pattern
    Regex,
    /// Field required for the inquiry mode but missing
    Required,
}

impl ErrorKind {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Length => "LENGTH",
            ErrorKind::Regex => "REGEX",
            ErrorKind::Required => "REQUIRED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "LENGTH" => Ok(ErrorKind::Length),
            "REGEX" => Ok(ErrorKind::Regex),
            "REQUIRED" => Ok(ErrorKind::Required),
            other => Err(crate::Error::UnknownErrorKind(other.to_string())),
        }
    }
}

/// Rules to check a single field against
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldRules {
    /// Field name
    pub field: String,
    /// Inquiry mode the field is required for
    pub mode: Option<String>,
    /// Field value
    pub value: String,
    /// Pattern the value failed to match
    pub pattern: Option<String>,
    /// Maximum allowed length of `field`
    pub max_length: Option<usize>,
}

impl FieldRules {
    /// Rules for a field
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ..Self::default()
        }
    }

    /// Set the value under check
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Report a required-for-mode violation
    pub fn mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Report a pattern violation
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Set the maximum length
    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

/// A rejected field value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ValidationError {
    kind: ErrorKind,
    message: String,
    field: String,
    mode: Option<String>,
    value: String,
    pattern: Option<String>,
    max_length: Option<usize>,
}

impl ValidationError {
    /// Length violation
    pub fn length(field: &str, length: usize, max_length: usize) -> Self {
        Self {
            kind: ErrorKind::Length,
            message: format!(
                "Field [{}] has length [{}] which is longer than the maximum of [{}]",
                field, length, max_length
            ),
            field: field.to_string(),
            mode: None,
            value: String::new(),
            pattern: None,
            max_length: Some(max_length),
        }
    }

    /// Pattern violation
    pub fn regex(field: &str, value: &str, pattern: &str) -> Self {
        Self {
            kind: ErrorKind::Regex,
            message: format!(
                "Field [{}] has value [{}] which does not match the pattern [{}]",
                field, value, pattern
            ),
            field: field.to_string(),
            mode: None,
            value: value.to_string(),
            pattern: Some(pattern.to_string()),
            max_length: None,
        }
    }

    /// Required-for-mode violation
    pub fn required(field: &str, mode: &str) -> Self {
        Self {
            kind: ErrorKind::Required,
            message: format!(
                "Required field [{}] missing for mode [{}]",
                field,
                mode.to_uppercase()
            ),
            field: field.to_string(),
            mode: Some(mode.to_string()),
            value: String::new(),
            pattern: None,
            max_length: None,
        }
    }

    /// Evaluate rules in the order length, pattern, mode.
    ///
    /// Every violated rule replaces the error recorded before it, so the last
    /// violation is the one reported. A supplied pattern or mode counts as
    /// violated; the length rule compares the character length of `field`.
    pub fn check(rules: &FieldRules) -> Result<(), ValidationError> {
        let mut error: Option<(ErrorKind, String)> = None;

        if let Some(max) = rules.max_length {
            let length = rules.field.chars().count();
            if length > max {
                let e = Self::length(&rules.field, length, max);
                error = Some((e.kind, e.message));
            }
        }

        if let Some(pattern) = &rules.pattern {
            let e = Self::regex(&rules.field, &rules.value, pattern);
            error = Some((e.kind, e.message));
        }

        if let Some(mode) = &rules.mode {
            let e = Self::required(&rules.field, mode);
            error = Some((e.kind, e.message));
        }

        match error {
            Some((kind, message)) => Err(Self {
                kind,
                message,
                field: rules.field.clone(),
                mode: rules.mode.clone(),
                value: rules.value.clone(),
                pattern: rules.pattern.clone(),
                max_length: rules.max_length,
            }),
            None => Ok(()),
        }
    }

    /// Failure class
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Field name
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Inquiry mode, for required-field errors
    pub fn mode(&self) -> Option<&str> {
        self.mode.as_deref()
    }

    /// Offending value
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Violated pattern
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Maximum allowed length
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }
}

/// Rules for one wire field
#[derive(Debug)]
struct FieldSpec {
    name: &'static str,
    max_length: Option<usize>,
    pattern: Option<Regex>,
    required: &'static [InquiryMode],
}

fn spec(
    name: &'static str,
    max_length: Option<usize>,
    pattern: Option<&str>,
    required: &'static [InquiryMode],
) -> FieldSpec {
    FieldSpec {
        name,
        max_length,
        pattern: pattern.map(|p| Regex::new(p).expect("built-in field pattern")),
        required,
    }
}

const ALL_MODES: &[InquiryMode] = &[
    InquiryMode::Default,
    InquiryMode::Phone,
    InquiryMode::WithThresholds,
    InquiryMode::JustThresholds,
];

const ORDER_MODES: &[InquiryMode] = &[InquiryMode::Default, InquiryMode::Phone];

/// Pre-submission validator over the flattened wire map
#[derive(Debug)]
pub struct RequestValidator {
    specs: Vec<FieldSpec>,
}

impl RequestValidator {
    /// Create validator with the built-in field rules
    pub fn new() -> Self {
        let specs = vec![
            spec("VERS", Some(8), Some(r"^\d{1,2}\.\d{1,2}\.\d{1,2}$"), ALL_MODES),
            spec("PENC", None, Some(r"^(KHASH|MASK)?$"), &[]),
            spec("MERC", None, Some(r"^\d{6}$"), ALL_MODES),
            spec("SESS", Some(32), None, ORDER_MODES),
            spec("ORDR", Some(32), None, &[]),
            spec("CUSTOMER_ID", Some(32), None, &[]),
            spec("MACK", None, Some(r"^[YN]$"), &[]),
            spec("AUTH", None, Some(r"^[AD]$"), &[]),
            spec("AVSZ", None, Some(r"^[MNX]$"), &[]),
            spec("AVST", None, Some(r"^[MNX]$"), &[]),
            spec("CVVR", None, Some(r"^[MNX]$"), &[]),
            spec("PTYP", Some(4), None, ORDER_MODES),
            spec("PTOK", Some(32), None, &[]),
            spec("LAST4", Some(4), None, &[]),
            spec("CCMM", None, Some(r"^(0[1-9]|1[0-2])$"), &[]),
            spec("CCYY", None, Some(r"^\d{4}$"), &[]),
        ];

        Self { specs }
    }

    /// Check every known field of `request` for `mode`, returning one error
    /// per rejected field.
    pub fn validate(&self, request: &RisRequest, mode: InquiryMode) -> Vec<ValidationError> {
        let wire = request.to_wire_map();
        let mut errors = Vec::new();

        for spec in &self.specs {
            let value = wire.get(spec.name).map(String::as_str).unwrap_or("");

            if value.is_empty() {
                if spec.required.contains(&mode) {
                    errors.push(ValidationError::required(spec.name, mode.as_str()));
                }
                continue;
            }

            if let Some(max) = spec.max_length {
                let length = value.chars().count();
                if length > max {
                    errors.push(ValidationError::length(spec.name, length, max));
                    continue;
                }
            }

            if let Some(pattern) = &spec.pattern {
                if !pattern.is_match(value) {
                    errors.push(ValidationError::regex(spec.name, value, pattern.as_str()));
                }
            }
        }

        if !errors.is_empty() {
            tracing::debug!(
                mode = %mode,
                errors = errors.len(),
                "RIS request failed validation"
            );
        }

        errors
    }
}

impl RequestValidator {
    /// Like [`RequestValidator::validate`], but fail on the first rejected
    /// field
    pub fn validate_strict(&self, request: &RisRequest, mode: InquiryMode) -> crate::Result<()> {
        match self.validate(request, mode).into_iter().next() {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

impl Default for RequestValidator {
    fn default() -> Self {
        Self::new()
    }
}
