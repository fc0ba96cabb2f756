use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, error, warn};

use crate::users::{dto::Envelope, repo::StoreError, validation::FieldErrors};

pub const VALIDATION_FAILED: &str = "Validation failed. Please check the provided data.";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(FieldErrors),
    #[error("user not found")]
    NotFound,
    #[error("{message}")]
    BadRequest { status: StatusCode, message: String },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            // lost a race with a concurrent write; report it like the validator would
            StoreError::EmailTaken => AppError::Validation(FieldErrors::email_taken()),
            StoreError::Other(e) => AppError::Internal(e),
        }
    }
}

/// Field type errors are reported by the validator; whatever still fails to
/// extract is not a usable object, so 422 stays reserved for `errors` responses.
impl From<JsonRejection> for AppError {
    fn from(r: JsonRejection) -> Self {
        let status = match &r {
            JsonRejection::JsonDataError(_) => StatusCode::BAD_REQUEST,
            _ => r.status(),
        };
        AppError::BadRequest {
            status,
            message: r.body_text(),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(r: PathRejection) -> Self {
        debug!(error = %r.body_text(), "unresolvable user id");
        AppError::NotFound
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest { status, .. } => *status,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Validation(errors) => {
                debug!(fields = ?errors.fields().collect::<Vec<_>>(), "validation failed");
                Envelope::invalid(VALIDATION_FAILED, errors)
            }
            AppError::NotFound => {
                warn!("user not found");
                Envelope::failure("User not found.")
            }
            AppError::BadRequest { message, .. } => {
                warn!(%status, %message, "bad request");
                Envelope::failure(message)
            }
            AppError::Internal(e) => {
                error!(error = ?e, "request failed");
                Envelope::failure("Server error")
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_conflict_becomes_email_error() {
        let err = AppError::from(StoreError::EmailTaken);
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        match err {
            AppError::Validation(errors) => assert!(errors.get("email").is_some()),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn body_that_is_not_an_object_is_a_bad_request() {
        use axum::{body::Body, extract::FromRequest, http::Request};

        use crate::users::dto::UserPayload;

        let req = Request::builder()
            .method("POST")
            .header("content-type", "application/json")
            .body(Body::from(r#""just a string""#))
            .unwrap();
        let rejection = Json::<UserPayload>::from_request(req, &()).await.unwrap_err();
        assert!(matches!(rejection, JsonRejection::JsonDataError(_)));
        assert_eq!(AppError::from(rejection).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn statuses() {
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
