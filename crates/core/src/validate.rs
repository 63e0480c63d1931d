//! Small accumulating validator used by the document schemas.
//!
//! Every check records a field error instead of returning early, so a rejected
//! write reports all failing fields at once.

use crate::error::{DomainError, DomainResult, ValidationErrors};

#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a value to be present.
    pub fn required<T>(&mut self, field: &str, value: Option<T>, message: &str) -> Option<T> {
        if value.is_none() {
            self.errors.push(field, message);
        }
        value
    }

    /// Require a text value that is non-empty after trimming; returns it trimmed.
    pub fn required_text(&mut self, field: &str, value: Option<&str>, message: &str) -> Option<String> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                self.errors.push(field, message);
                None
            }
        }
    }

    /// Character-length bounds (inclusive).
    pub fn length_between(
        &mut self,
        field: &str,
        value: &str,
        min: usize,
        max: usize,
        too_short: &str,
        too_long: &str,
    ) {
        let len = value.chars().count();
        if len < min {
            self.errors.push(field, too_short);
        } else if len > max {
            self.errors.push(field, too_long);
        }
    }

    /// Numeric bounds (inclusive).
    pub fn within(&mut self, field: &str, value: f64, min: f64, max: f64, too_low: &str, too_high: &str) {
        if value < min {
            self.errors.push(field, too_low);
        } else if value > max {
            self.errors.push(field, too_high);
        }
    }

    /// Record `message` unless `ok`.
    pub fn check(&mut self, field: &str, ok: bool, message: impl Into<String>) {
        if !ok {
            self.errors.push(field, message);
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> DomainResult<()> {
        self.errors.into_result()
    }

    /// The collected failures as an error, for callers that already know a
    /// check failed.
    pub fn into_error(self) -> DomainError {
        DomainError::Validation(self.errors)
    }
}
