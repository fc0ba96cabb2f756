//! Field rules for create/update payloads.
//!
//! Every rule is evaluated and all violations are collected per field. The
//! syntactic checks are pure; email uniqueness needs the store and runs last,
//! only for an email that is otherwise valid.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::AppError;
use crate::users::dto::UserPayload;
use crate::users::repo::UserStore;

pub const NAME_MIN: usize = 3;
pub const NAME_MAX: usize = 70;
/// Width of the `users.email` column.
pub const EMAIL_MAX: usize = 255;
pub const PASSWORD_MIN: usize = 6;

pub const EMAIL_TAKEN: &str = "The email has already been taken.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    /// Updating `id`; that record is excluded from the uniqueness check.
    Update { id: Uuid },
}

impl Mode {
    fn excluded(self) -> Option<Uuid> {
        match self {
            Mode::Create => None,
            Mode::Update { id } => Some(id),
        }
    }
}

/// Field name -> messages in rule order. Serializes as a plain JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.keys().copied()
    }

    pub fn email_taken() -> Self {
        let mut errors = Self::default();
        errors.add("email", EMAIL_TAKEN);
        errors
    }
}

/// Payload that passed every rule, already normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUser {
    pub name: String,
    pub email: String,
    /// `None` only in update mode, meaning "keep the stored password".
    pub password: Option<String>,
}

/// Input after type checks and normalization; absent or empty fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Normalized {
    pub(crate) name: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) password: Option<String>,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// String value of `field`; `null` counts as absent, any other JSON type is an error.
fn text(
    field: &'static str,
    value: Option<&Value>,
    errors: &mut FieldErrors,
) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.add(field, format!("The {field} field must be a string."));
            None
        }
    }
}

fn normalize(payload: &UserPayload, errors: &mut FieldErrors) -> Normalized {
    let trimmed = |v: String| Some(v.trim().to_string()).filter(|v| !v.is_empty());
    Normalized {
        name: text("name", payload.name.as_ref(), errors).and_then(trimmed),
        email: text("email", payload.email.as_ref(), errors)
            .and_then(trimmed)
            .map(|e| e.to_lowercase()),
        // not trimmed; only the empty string means absent
        password: text("password", payload.password.as_ref(), errors)
            .filter(|p| !p.is_empty()),
    }
}

/// Runs every rule that does not need the store.
pub(crate) fn check_fields(payload: &UserPayload, mode: Mode) -> (Normalized, FieldErrors) {
    let mut errors = FieldErrors::default();
    let fields = normalize(payload, &mut errors);

    if errors.get("name").is_none() {
        match &fields.name {
            None => errors.add("name", "The name field is required."),
            Some(name) => {
                let len = name.chars().count();
                if len < NAME_MIN {
                    errors.add(
                        "name",
                        format!("The name field must be at least {NAME_MIN} characters."),
                    );
                }
                if len > NAME_MAX {
                    errors.add(
                        "name",
                        format!("The name field must not be greater than {NAME_MAX} characters."),
                    );
                }
            }
        }
    }

    if errors.get("email").is_none() {
        match &fields.email {
            None => errors.add("email", "The email field is required."),
            Some(email) => {
                if !is_valid_email(email) {
                    errors.add("email", "The email field must be a valid email address.");
                }
                if email.chars().count() > EMAIL_MAX {
                    errors.add(
                        "email",
                        format!("The email field must not be greater than {EMAIL_MAX} characters."),
                    );
                }
            }
        }
    }

    if errors.get("password").is_none() {
        match (&fields.password, mode) {
            (None, Mode::Create) => errors.add("password", "The password field is required."),
            (None, Mode::Update { .. }) => {}
            (Some(password), _) => {
                if password.chars().count() < PASSWORD_MIN {
                    errors.add(
                        "password",
                        format!("The password field must be at least {PASSWORD_MIN} characters."),
                    );
                }
            }
        }
    }

    (fields, errors)
}

/// Full validation: field rules plus email uniqueness against `store`.
pub async fn validate(
    store: &dyn UserStore,
    payload: &UserPayload,
    mode: Mode,
) -> Result<ValidatedUser, AppError> {
    let (fields, mut errors) = check_fields(payload, mode);

    if errors.get("email").is_none() {
        if let Some(email) = &fields.email {
            if store.email_taken(email, mode.excluded()).await? {
                errors.add("email", EMAIL_TAKEN);
            }
        }
    }

    match (fields.name, fields.email) {
        (Some(name), Some(email)) if errors.is_empty() => Ok(ValidatedUser {
            name,
            email,
            password: fields.password,
        }),
        _ => Err(AppError::Validation(errors)),
    }
}
