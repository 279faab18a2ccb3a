use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::{error, warn};
use taskdeck::{ErrorBody, FieldError, ServiceError, sea_orm::DbErr};
use thiserror::Error;

/// Everything a handler can fail with, mapped onto a status and a
/// `{ "message": ... }` body.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Not authorized, no token")]
    MissingToken,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingToken => StatusCode::UNAUTHORIZED,
            ApiError::Service(err) => match err {
                ServiceError::ValidationError(_) => StatusCode::BAD_REQUEST,
                ServiceError::Unauthorized | ServiceError::InvalidCredentials => {
                    StatusCode::UNAUTHORIZED
                }
                ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
                ServiceError::DuplicateEmail(_) => StatusCode::CONFLICT,
                ServiceError::DatabaseError(_)
                | ServiceError::HashError(_)
                | ServiceError::TokenError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedPayload(rejection.body_text())
    }
}

impl From<FieldError> for ApiError {
    fn from(err: FieldError) -> Self {
        ApiError::Service(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Service(err) if err.is_internal() => {
                error!("request failed: {err}");
                "Internal server error".to_string()
            }
            ApiError::MissingToken => {
                warn!("request rejected, no bearer token");
                self.to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}

/// Startup failures of the server process.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database unavailable: {0}")]
    Database(#[from] DbErr),

    #[error("Listener failed: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(FieldError::Missing("Title")), StatusCode::BAD_REQUEST),
            (ApiError::MissingToken, StatusCode::UNAUTHORIZED),
            (ServiceError::Unauthorized.into(), StatusCode::UNAUTHORIZED),
            (ServiceError::InvalidCredentials.into(), StatusCode::UNAUTHORIZED),
            (ServiceError::NotFound("t".into()).into(), StatusCode::NOT_FOUND),
            (ServiceError::DuplicateEmail("a@b.c".into()).into(), StatusCode::CONFLICT),
            (
                ServiceError::HashError("boom".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "{err}");
        }
    }

    #[test]
    fn test_validation_message_is_the_field_message() {
        let err = ApiError::from(FieldError::Missing("Due date"));
        assert_eq!(err.to_string(), "Due date is required");
    }
}
