use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

pub const MSG_NAME: &str = "Please enter your full name.";
pub const MSG_EMAIL: &str = "Please enter a valid email address.";
pub const MSG_URL: &str = "Please enter a valid url.";

/// Field name -> messages, in the shape the forms render next to each input.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(value)` when nothing was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn is_valid_url(raw: &str) -> bool {
    url::Url::parse(raw).is_ok()
}

/// Trimmed, non-empty value of an optional form field.
pub(crate) fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

pub(crate) fn check_name(errors: &mut FieldErrors, raw: Option<&str>) -> String {
    match non_empty(raw) {
        Some(name) => name,
        None => {
            errors.add("name", MSG_NAME);
            String::new()
        }
    }
}

/// Validated email, lower-cased when `normalize` is set.
pub(crate) fn check_email(errors: &mut FieldErrors, raw: Option<&str>, normalize: bool) -> String {
    let email = raw.map(str::trim).unwrap_or_default();
    let email = if normalize {
        email.to_lowercase()
    } else {
        email.to_string()
    };
    if !is_valid_email(&email) {
        errors.add("email", MSG_EMAIL);
    }
    email
}
