use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::users::pagination::Page;
use crate::users::repo_types::User;
use crate::users::validation::FieldErrors;

/// Body of `POST /api/users` and `PUT /api/users/{id}`. Every field is optional
/// and untyped at the wire level; the validator decides what is required and
/// reports a wrong JSON type as a field error.
#[derive(Debug, Default, Deserialize)]
pub struct UserPayload {
    pub name: Option<Value>,
    pub email: Option<Value>,
    pub password: Option<Value>,
}

/// `?page=N`. Kept as text so that junk falls back to the first page.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1)
    }
}

/// Uniform response wrapper used by every API endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Page<User>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

impl Envelope {
    fn empty(success: bool) -> Self {
        Self {
            success,
            message: None,
            errors: None,
            users: None,
            user: None,
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::empty(true)
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::empty(false)
        }
    }

    pub fn invalid(message: impl Into<String>, errors: FieldErrors) -> Self {
        Self {
            errors: Some(errors),
            ..Self::failure(message)
        }
    }

    pub fn users(page: Page<User>) -> Self {
        Self {
            users: Some(page),
            ..Self::empty(true)
        }
    }

    pub fn user(user: User) -> Self {
        Self {
            user: Some(user),
            ..Self::empty(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_is_lenient() {
        let q = |p: Option<&str>| PageQuery { page: p.map(Into::into) }.page();
        assert_eq!(q(None), 1);
        assert_eq!(q(Some("3")), 3);
        assert_eq!(q(Some("0")), 1);
        assert_eq!(q(Some("-2")), 1);
        assert_eq!(q(Some("abc")), 1);
    }

    #[test]
    fn envelope_omits_absent_keys() {
        let json = serde_json::to_value(Envelope::ok("done")).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "message": "done" }));
    }

    #[test]
    fn payload_accepts_missing_null_and_mistyped_fields() {
        let p: UserPayload =
            serde_json::from_str(r#"{"name":"Alice","email":123,"password":null}"#).unwrap();
        assert_eq!(p.name, Some(Value::from("Alice")));
        assert_eq!(p.email, Some(Value::from(123)));
        assert!(p.password.is_none());
    }
}
