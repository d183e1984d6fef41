//! Client-side validation rules
//!
//! These run before anything is submitted. The server re-validates and
//! remains the source of truth; its field-keyed rejections decode into the
//! same [`FieldErrors`] shape.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::{LoginCredentials, RegisterCredentials};
use crate::task::{CreateTaskDto, UpdateTaskDto};
use crate::{Error, Result};

pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;
pub const USERNAME_MIN_CHARS: usize = 3;
pub const PASSWORD_MIN_CHARS: usize = 8;

/// Key the server uses for errors not tied to one field
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Field-keyed validation messages, ordered by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// All messages recorded for a field
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// First message recorded for a field
    pub fn first(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Decode a server error body such as `{"username": ["taken"]}`.
    ///
    /// Values may be a list of strings or a bare string; anything else is
    /// skipped. Returns `None` when nothing usable was found.
    pub fn from_json(body: &Value) -> Option<Self> {
        let object = body.as_object()?;
        let mut errors = Self::new();
        for (field, value) in object {
            match value {
                Value::String(message) => errors.add(field, message.clone()),
                Value::Array(items) => {
                    for message in items.iter().filter_map(Value::as_str) {
                        errors.add(field, message);
                    }
                }
                _ => {}
            }
        }
        (!errors.is_empty()).then_some(errors)
    }

    /// `Ok(())` when empty, otherwise a Validation error
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                first = false;
                write!(f, "{}: {}", field, message)?;
            }
        }
        Ok(())
    }
}

fn check_title(title: &str, errors: &mut FieldErrors) {
    let len = title.chars().count();
    if len == 0 {
        errors.add("title", "Title is required");
    } else if len > TITLE_MAX_CHARS {
        errors.add("title", "Title must be at most 100 characters");
    }
}

fn check_description(description: &str, errors: &mut FieldErrors) {
    let len = description.chars().count();
    if len == 0 {
        errors.add("description", "Description is required");
    } else if len > DESCRIPTION_MAX_CHARS {
        errors.add("description", "Description must be at most 500 characters");
    }
}

/// Validate a new task before it is submitted
pub fn validate_new_task(task: &CreateTaskDto) -> Result<()> {
    let mut errors = FieldErrors::new();
    check_title(&task.title, &mut errors);
    check_description(&task.description, &mut errors);
    errors.into_result()
}

/// Validate the fields present in a partial update
pub fn validate_task_patch(patch: &UpdateTaskDto) -> Result<()> {
    let mut errors = FieldErrors::new();
    if let Some(title) = &patch.title {
        check_title(title, &mut errors);
    }
    if let Some(description) = &patch.description {
        check_description(description, &mut errors);
    }
    errors.into_result()
}

pub fn validate_login(credentials: &LoginCredentials) -> Result<()> {
    let mut errors = FieldErrors::new();
    if credentials.username.is_empty() {
        errors.add("username", "Username is required");
    }
    if credentials.password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.into_result()
}

pub fn validate_registration(credentials: &RegisterCredentials) -> Result<()> {
    let mut errors = FieldErrors::new();
    if credentials.username.chars().count() < USERNAME_MIN_CHARS {
        errors.add("username", "Username must be at least 3 characters");
    }
    if !is_valid_email(&credentials.email) {
        errors.add("email", "Invalid email address");
    }
    if credentials.password.chars().count() < PASSWORD_MIN_CHARS {
        errors.add("password", "Password must be at least 8 characters");
    }
    if credentials.password2.is_empty() {
        errors.add("password2", "Please confirm your password");
    } else if credentials.password != credentials.password2 {
        errors.add("password2", "Passwords don't match");
    }
    errors.into_result()
}

/// Syntactic email check: `local@domain.tld`, no whitespace
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => {
            !name.is_empty() && !tld.is_empty() && !domain.starts_with('.')
        }
        None => false,
    }
}
