/// Request validation helpers
///
/// Structural rules (required, length, email) are declared on request
/// structs with `validator`. Checks that need a value set or the database
/// (enum membership, dates, uniqueness, foreign keys) are added by the
/// handler to the same [`FieldErrors`], so a single 422 response lists every
/// failing field.
///
/// # Example
///
/// ```
/// use projectdesk_api::validation::FieldErrors;
/// use projectdesk_shared::models::project::ProjectStatus;
///
/// let mut errors = FieldErrors::new();
/// let allowed = ProjectStatus::ALL.map(|s| s.as_str());
/// let status: Option<ProjectStatus> = errors.enum_value("status", Some("archived"), &allowed);
///
/// assert!(status.is_none());
/// assert_eq!(
///     errors.get("status").unwrap(),
///     ["The selected status is invalid. Allowed values: active, inactive."]
/// );
/// ```

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};
use validator::Validate;

use crate::error::ApiError;

/// Field name to list of messages, ordered by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the `validator` rules declared on `input`
    pub fn from_rules<T: Validate>(input: &T) -> Self {
        let mut errors = Self::new();

        if let Err(report) = input.validate() {
            for (field, failures) in report.field_errors() {
                let field = field.to_string();
                for failure in failures.iter() {
                    let message = match &failure.message {
                        Some(message) => message.to_string(),
                        None => format!("The {} field is invalid.", human(&field)),
                    };
                    errors.add(&field, message);
                }
            }
        }

        errors
    }

    /// Adds rule failures for fields that have no error yet
    ///
    /// A field already rejected for its JSON type would otherwise also be
    /// reported as missing.
    pub fn add_rules<T: Validate>(&mut self, input: &T) {
        for (field, messages) in Self::from_rules(input).0 {
            self.0.entry(field).or_insert(messages);
        }
    }

    /// A single error on one field
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of messages across all fields
    pub fn len(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// First message, in field order
    pub fn first_message(&self) -> Option<&str> {
        self.0.values().flatten().next().map(String::as_str)
    }

    /// Parses an enum field, recording an error if the value is not allowed
    ///
    /// A missing value is left to the `required` rule and produces no
    /// additional error here.
    pub fn enum_value<E: FromStr>(
        &mut self,
        field: &str,
        value: Option<&str>,
        allowed: &[&str],
    ) -> Option<E> {
        let value = value?;

        match value.parse::<E>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                tracing::debug!(field, value, "Rejected enum value");
                self.add(
                    field,
                    format!(
                        "The selected {} is invalid. Allowed values: {}.",
                        human(field),
                        allowed.join(", ")
                    ),
                );
                None
            }
        }
    }

    /// Parses a `YYYY-MM-DD` date field
    ///
    /// A missing value is left to the `required` rule.
    pub fn date(&mut self, field: &str, value: Option<&str>) -> Option<NaiveDate> {
        let value = value?;

        match parse_date(value) {
            Some(date) => Some(date),
            None => {
                self.add(field, format!("The {} field must be a valid date.", human(field)));
                None
            }
        }
    }

    /// Ok when no field failed
    pub fn into_result(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ValidationError(self))
        }
    }
}

/// JSON object body, read one field at a time
///
/// Strings are trimmed and a blank string counts as missing, so `required`
/// rules reject it. A value of the wrong JSON type becomes an error on its
/// field instead of failing the whole body.
///
/// # Example
///
/// ```
/// use projectdesk_api::validation::Payload;
/// use serde_json::json;
///
/// let mut payload = Payload::new(json!({ "name": "  Ana ", "code": "", "project_id": "7" })).unwrap();
///
/// assert_eq!(payload.text("name").as_deref(), Some("Ana"));
/// assert_eq!(payload.text("code"), None);
/// assert_eq!(payload.integer("project_id"), Some(7));
/// ```
#[derive(Debug)]
pub struct Payload {
    fields: Map<String, Value>,
    errors: FieldErrors,
}

impl Payload {
    /// # Errors
    ///
    /// 400 when the body is not a JSON object
    pub fn new(body: Value) -> Result<Self, ApiError> {
        match body {
            Value::Object(fields) => Ok(Self {
                fields,
                errors: FieldErrors::new(),
            }),
            _ => Err(ApiError::BadRequest(
                "The request body must be a JSON object.".to_string(),
            )),
        }
    }

    /// Trimmed string; numbers are taken as their text
    pub fn text(&mut self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::String(value) => non_blank(value.trim()),
            Value::Number(number) => Some(number.to_string()),
            Value::Null => None,
            _ => {
                self.errors.add(field, string_message(field));
                None
            }
        }
    }

    /// String kept exactly as sent, for passwords; blank counts as missing
    pub fn secret(&mut self, field: &str) -> Option<String> {
        match self.fields.get(field)? {
            Value::String(value) if value.trim().is_empty() => None,
            Value::String(value) => Some(value.clone()),
            Value::Null => None,
            _ => {
                self.errors.add(field, string_message(field));
                None
            }
        }
    }

    /// Nullable string: missing is `None`, `null` or blank is `Some(None)`
    pub fn nullable_text(&mut self, field: &str) -> Option<Option<String>> {
        match self.fields.get(field)? {
            Value::Null => Some(None),
            Value::String(value) => Some(non_blank(value.trim())),
            Value::Number(number) => Some(Some(number.to_string())),
            _ => {
                self.errors.add(field, string_message(field));
                None
            }
        }
    }

    /// Integer sent as a JSON number or a numeric string
    pub fn integer(&mut self, field: &str) -> Option<i64> {
        let parsed = match self.fields.get(field)? {
            Value::Null => return None,
            Value::String(value) if value.trim().is_empty() => return None,
            Value::String(value) => value.trim().parse::<i64>().ok(),
            Value::Number(number) => number.as_i64(),
            _ => None,
        };

        if parsed.is_none() {
            self.errors.add(field, integer_message(field));
        }
        parsed
    }

    /// Type errors collected while reading, plus the rules declared on `input`
    pub fn finish<T: Validate>(self, input: &T) -> FieldErrors {
        let mut errors = self.errors;
        errors.add_rules(input);
        errors
    }
}

fn non_blank(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::ValidationError(errors)
    }
}

/// Parses a calendar date
///
/// Accepts `2025-06-01`, an RFC 3339 timestamp or a date with a
/// `HH:MM[:SS[.fff]]` time after `T` or a space; the time is dropped.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    const DATE_TIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];

    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.date_naive());
    }

    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|timestamp| timestamp.date())
}

/// `due_date` -> `due date`
pub fn human(field: &str) -> String {
    field.replace('_', " ")
}

pub fn string_message(field: &str) -> String {
    format!("The {} field must be a string.", human(field))
}

pub fn integer_message(field: &str) -> String {
    format!("The {} field must be an integer.", human(field))
}

/// Message for a unique column that is already in use
pub fn taken_message(field: &str) -> String {
    format!("The {} has already been taken.", human(field))
}

/// Message for a reference to a row that doesn't exist
pub fn invalid_reference_message(field: &str) -> String {
    format!("The selected {} is invalid.", human(field))
}
