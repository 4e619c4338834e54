use lazy_static::lazy_static;
use regex::Regex;
use time::Date;

use crate::error::{ApiError, FieldError};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

const DATE_FORMAT: &[time::format_description::FormatItem<'static>] =
    time::macros::format_description!("[year]-[month]-[day]");

/// Collects every violation for a request before failing it as a whole.
/// Request DTOs keep their fields optional so missing values surface here
/// as field errors instead of serde rejections.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Required string with length bounds; returns the trimmed value when valid.
    pub fn require_str(
        &mut self,
        field: &str,
        value: Option<&str>,
        min: usize,
        max: usize,
    ) -> Option<String> {
        match value.map(str::trim) {
            None => {
                self.fail(field, format!("{field} is required"));
                None
            }
            Some(v) if v.len() < min || v.len() > max => {
                self.fail(
                    field,
                    format!("{field} must be between {min} and {max} characters"),
                );
                None
            }
            Some(v) => Some(v.to_string()),
        }
    }

    pub fn require_email(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        match value.map(|v| v.trim().to_lowercase()) {
            None => {
                self.fail(field, format!("{field} is required"));
                None
            }
            Some(v) if !is_valid_email(&v) => {
                self.fail(field, format!("{field} must be a valid email address"));
                None
            }
            Some(v) => Some(v),
        }
    }

    pub fn optional_email(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        value?;
        self.require_email(field, value)
    }

    pub fn require_number(
        &mut self,
        field: &str,
        value: Option<f64>,
        min: f64,
        max: f64,
    ) -> Option<f64> {
        match value {
            None => {
                self.fail(field, format!("{field} is required"));
                None
            }
            Some(v) => self.number_in_range(field, v, min, max),
        }
    }

    pub fn optional_number(
        &mut self,
        field: &str,
        value: Option<f64>,
        min: f64,
        max: f64,
    ) -> Option<f64> {
        value.and_then(|v| self.number_in_range(field, v, min, max))
    }

    fn number_in_range(&mut self, field: &str, value: f64, min: f64, max: f64) -> Option<f64> {
        if value < min || value > max {
            self.fail(field, format!("{field} must be between {min} and {max}"));
            None
        } else {
            Some(value)
        }
    }

    pub fn optional_int(&mut self, field: &str, value: Option<i64>, min: i64, max: i64) -> Option<i64> {
        match value {
            None => None,
            Some(v) if v < min || v > max => {
                self.fail(field, format!("{field} must be between {min} and {max}"));
                None
            }
            Some(v) => Some(v),
        }
    }

    /// Required ISO-8601 date (`YYYY-MM-DD`).
    pub fn require_date(&mut self, field: &str, value: Option<&str>) -> Option<Date> {
        match value {
            None => {
                self.fail(field, format!("{field} is required"));
                None
            }
            Some(v) => self.parse_date(field, v),
        }
    }

    pub fn optional_date(&mut self, field: &str, value: Option<&str>) -> Option<Date> {
        value.and_then(|v| self.parse_date(field, v))
    }

    fn parse_date(&mut self, field: &str, value: &str) -> Option<Date> {
        match Date::parse(value, DATE_FORMAT) {
            Ok(d) => Some(d),
            Err(_) => {
                self.fail(field, format!("{field} must be an ISO 8601 date"));
                None
            }
        }
    }

    /// Required member of a fixed enumeration, parsed via `FromStr`.
    pub fn require_enum<T: std::str::FromStr>(
        &mut self,
        field: &str,
        value: Option<&str>,
        allowed: &str,
    ) -> Option<T> {
        match value {
            None => {
                self.fail(field, format!("{field} is required"));
                None
            }
            Some(v) => self.parse_enum(field, v, allowed),
        }
    }

    pub fn optional_enum<T: std::str::FromStr>(
        &mut self,
        field: &str,
        value: Option<&str>,
        allowed: &str,
    ) -> Option<T> {
        value.and_then(|v| self.parse_enum(field, v, allowed))
    }

    fn parse_enum<T: std::str::FromStr>(
        &mut self,
        field: &str,
        value: &str,
        allowed: &str,
    ) -> Option<T> {
        match value.parse::<T>() {
            Ok(v) => Some(v),
            Err(_) => {
                self.fail(field, format!("{field} must be one of: {allowed}"));
                None
            }
        }
    }

    /// Required non-empty list of strings.
    pub fn require_list(&mut self, field: &str, value: Option<Vec<String>>) -> Option<Vec<String>> {
        match value {
            None => {
                self.fail(field, format!("{field} is required"));
                None
            }
            Some(v) if v.is_empty() => {
                self.fail(field, format!("{field} must be a non-empty list"));
                None
            }
            Some(v) => Some(v),
        }
    }

    pub fn optional_list(&mut self, field: &str, value: Option<Vec<String>>) -> Option<Vec<String>> {
        match value {
            Some(v) if v.is_empty() => {
                self.fail(field, format!("{field} must be a non-empty list"));
                None
            }
            other => other,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consumes the validator; fails the request with every collected violation.
    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plausible_emails() {
        assert!(is_valid_email("student@university.edu"));
        assert!(is_valid_email("a.b+c@example.co.uk"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("two@@example.com"));
    }

    #[test]
    fn collects_all_violations_not_just_the_first() {
        let mut v = Validator::new();
        v.require_str("title", None, 1, 255);
        v.require_number("amount", Some(-5.0), 0.0, f64::MAX);
        v.require_email("contact_email", Some("bogus"));
        v.require_date("deadline", Some("tomorrow"));
        let err = v.finish().unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                assert_eq!(errors.len(), 4);
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, ["title", "amount", "contact_email", "deadline"]);
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn valid_input_passes() {
        let mut v = Validator::new();
        let title = v.require_str("title", Some("  Merit Award  "), 1, 255);
        let amount = v.require_number("amount", Some(5000.0), 0.0, f64::MAX);
        let deadline = v.require_date("deadline", Some("2099-01-01"));
        assert!(v.finish().is_ok());
        assert_eq!(title.as_deref(), Some("Merit Award"));
        assert_eq!(amount, Some(5000.0));
        assert!(deadline.is_some());
    }

    #[test]
    fn empty_list_is_a_violation() {
        let mut v = Validator::new();
        v.require_list("eligibility", Some(vec![]));
        v.optional_list("field_of_study", Some(vec![]));
        assert!(!v.is_ok());
    }

    #[test]
    fn optional_fields_are_skipped_when_absent() {
        let mut v = Validator::new();
        assert!(v.optional_number("gpa_requirement", None, 0.0, 4.0).is_none());
        assert!(v.optional_date("deadline", None).is_none());
        assert!(v.optional_list("field_of_study", None).is_none());
        assert!(v.finish().is_ok());
    }
}
