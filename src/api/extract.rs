use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use bson::oid::ObjectId;
use serde::Deserialize;

use crate::db::models::Page;
use crate::error::{AppError, Resource, ValidationIssue};

/// JSON body extractor whose rejections render like every other API error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections render like every other API error.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::invalid("body", rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::invalid("query", rejection.body_text())
    }
}

/// Parse an id taken from the URL path. A malformed id cannot name a
/// record, so it is reported as not found.
pub fn path_id(raw: &str, resource: Resource) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| AppError::NotFound(resource))
}

/// `?page=&count=` for paginated listings.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
    pub count: Option<String>,
}

impl PageQuery {
    pub fn validate(self) -> Result<Page, AppError> {
        let mut v = Validator::default();
        let page = v.positive("page", self.page, "Page");
        let count = v.positive("count", self.count, "Count");
        match (page, count) {
            (Some(page), Some(count)) if v.is_clean() => Page::new(page, count),
            _ => Err(v.into_error()),
        }
    }
}

/// Collects field issues while a payload is turned into typed input.
#[derive(Debug, Default)]
pub struct Validator {
    issues: Vec<ValidationIssue>,
}

impl Validator {
    pub fn issue(&mut self, field: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(field, message));
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn into_error(self) -> AppError {
        AppError::Validation(self.issues)
    }

    /// A present value of any type.
    pub fn required<T>(&mut self, field: &str, value: Option<T>, label: &str) -> Option<T> {
        if value.is_none() {
            self.issue(field, format!("{label} is required"));
        }
        value
    }

    /// A present, non-blank string, trimmed.
    pub fn required_string(
        &mut self,
        field: &str,
        value: Option<String>,
        label: &str,
    ) -> Option<String> {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                self.issue(field, format!("{label} is required"));
                None
            }
        }
    }

    /// A required ObjectId in hex form.
    pub fn object_id(
        &mut self,
        field: &str,
        value: Option<String>,
        label: &str,
    ) -> Option<ObjectId> {
        let raw = self.required_string(field, value, label)?;
        self.parse_object_id(field, &raw, label)
    }

    /// An optional ObjectId; a present but malformed value is an issue.
    pub fn optional_object_id(
        &mut self,
        field: &str,
        value: Option<String>,
        label: &str,
    ) -> Option<ObjectId> {
        let raw = value?;
        self.parse_object_id(field, raw.trim(), label)
    }

    /// A positive integer sent as a string (query parameters).
    pub fn positive(&mut self, field: &str, value: Option<String>, label: &str) -> Option<u32> {
        let raw = self.required_string(field, value, label)?;
        match raw.parse::<u32>() {
            Ok(n) if n > 0 => Some(n),
            _ => {
                self.issue(field, format!("{label} must be greater than 0"));
                None
            }
        }
    }

    fn parse_object_id(&mut self, field: &str, raw: &str, label: &str) -> Option<ObjectId> {
        match ObjectId::parse_str(raw) {
            Ok(id) => Some(id),
            Err(_) => {
                self.issue(field, format!("Invalid {} id", label.to_lowercase()));
                None
            }
        }
    }
}

/// Drop blank optional strings.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
