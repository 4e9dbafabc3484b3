//! # Common API Types
//!
//! Shared pagination envelope and request validation helpers used by the
//! resource handlers.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::{IntoParams, ToSchema};

use crate::error::{ApiError, validation_error};
use crate::repositories::{PageRequest, PageSlice};

/// Paginated response wrapper for list endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaginatedResponse<T> {
    /// Total number of matching items
    pub count: u64,
    /// Next page number (null on the last page)
    pub next: Option<u64>,
    /// Previous page number (null on the first page)
    pub previous: Option<u64>,
    /// Items on this page
    pub results: Vec<T>,
}

impl<T> From<PageSlice<T>> for PaginatedResponse<T> {
    fn from(slice: PageSlice<T>) -> Self {
        Self {
            count: slice.count,
            next: slice.has_next().then_some(slice.page + 1),
            previous: slice.has_previous().then_some(slice.page - 1),
            results: slice.items,
        }
    }
}

/// Non-paginated `results` wrapper
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResultsResponse<T> {
    pub results: Vec<T>,
}

/// Page selector shared by list endpoints
#[derive(Debug, Default, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-based page number
    pub page: Option<u64>,
}

impl PageQuery {
    pub fn request(&self, page_size: u64) -> PageRequest {
        PageRequest::new(self.page.unwrap_or(1), page_size)
    }
}

const PASSWORD_REDACTED: &str = "********";

/// Serializes a request body for audit logging with every `password` field masked.
pub fn redacted_payload<T: Serialize>(payload: &T) -> Value {
    fn mask(value: &mut Value) {
        match value {
            Value::Object(map) => {
                for (key, inner) in map.iter_mut() {
                    if key == "password" && !inner.is_null() {
                        *inner = Value::String(PASSWORD_REDACTED.to_string());
                    } else {
                        mask(inner);
                    }
                }
            }
            Value::Array(items) => items.iter_mut().for_each(mask),
            _ => {}
        }
    }

    let mut value = serde_json::to_value(payload).unwrap_or(Value::Null);
    mask(&mut value);
    value
}

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("valid username pattern"))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern")
    })
}

/// Collects per-field validation messages into a single 400 response.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Map<String, Value>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        let entry = self
            .errors
            .entry(field.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(messages) = entry {
            messages.push(Value::String(message.into()));
        }
    }

    /// Returns the value when present and non-blank, recording an error otherwise.
    pub fn required<'v>(&mut self, field: &str, value: Option<&'v str>) -> Option<&'v str> {
        match value {
            Some(v) if !v.trim().is_empty() => Some(v),
            Some(_) => {
                self.add(field, "This field may not be blank.");
                None
            }
            None => {
                self.add(field, "This field is required.");
                None
            }
        }
    }

    pub fn max_length(&mut self, field: &str, value: Option<&str>, max: usize) {
        if let Some(v) = value
            && v.chars().count() > max
        {
            self.add(
                field,
                format!("Ensure this field has no more than {max} characters."),
            );
        }
    }

    pub fn username(&mut self, value: Option<&str>) {
        if let Some(v) = self.required("username", value) {
            if !username_pattern().is_match(v) {
                self.add(
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                );
            }
            self.max_length("username", Some(v), 150);
        }
    }

    pub fn email(&mut self, value: Option<&str>) {
        if let Some(v) = self.required("email", value)
            && !email_pattern().is_match(v)
        {
            self.add("email", "Enter a valid email address.");
        }
    }

    /// Like [`FieldErrors::email`] but only when the client sent the field.
    pub fn optional_email(&mut self, value: Option<&str>) {
        if value.is_some() {
            self.email(value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let message = self
            .errors
            .iter()
            .next()
            .and_then(|(field, messages)| {
                messages
                    .get(0)
                    .and_then(Value::as_str)
                    .map(|m| format!("{field}: {m}"))
            })
            .unwrap_or_else(|| "Validation failed".to_string());
        Err(validation_error(&message, Value::Object(self.errors)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginated_response_links_neighbour_pages() {
        let slice = PageSlice::new(vec!["a"], 25, PageRequest::new(2, 10));
        let response = PaginatedResponse::from(slice);

        assert_eq!(response.count, 25);
        assert_eq!(response.next, Some(3));
        assert_eq!(response.previous, Some(1));
    }

    #[test]
    fn single_page_has_no_links() {
        let response = PaginatedResponse::from(PageSlice::new(
            Vec::<u8>::new(),
            0,
            PageRequest::new(1, 10),
        ));
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"count": 0, "next": null, "previous": null, "results": []})
        );
    }

    #[test]
    fn nested_passwords_are_masked() {
        let payload = serde_json::json!({
            "department": "Tech",
            "user": {"username": "emp1", "password": "secret"}
        });
        let redacted = redacted_payload(&payload);

        assert_eq!(redacted["user"]["password"], "********");
        assert_eq!(redacted["user"]["username"], "emp1");
    }

    #[test]
    fn usernames_follow_the_login_character_set() {
        let mut errors = FieldErrors::new();
        errors.username(Some("jane.doe+lunch@corp"));
        assert!(errors.is_empty());

        errors.username(Some("jane doe"));
        errors.username(None);
        let err = errors.into_result().unwrap_err();
        let details = err.details.unwrap();
        assert_eq!(details["username"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn emails_need_a_domain() {
        let mut errors = FieldErrors::new();
        errors.email(Some("jane@corp.example"));
        errors.optional_email(None);
        assert!(errors.is_empty());

        errors.email(Some("jane@"));
        let err = errors.into_result().unwrap_err();
        assert_eq!(
            err.message,
            Box::from("email: Enter a valid email address.")
        );
    }

    #[test]
    fn max_length_counts_characters() {
        let mut errors = FieldErrors::new();
        errors.max_length("title", Some("ééé"), 3);
        assert!(errors.is_empty());
        errors.max_length("title", Some("éééé"), 3);
        assert!(!errors.is_empty());
    }
}
