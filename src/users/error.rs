use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User with email {0} already exists")]
    DuplicateEmail(String),

    #[error("User doesn't exist")]
    NotFound,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type UserResult<T> = Result<T, UserError>;

impl UserError {
    /// Caller mistakes, as opposed to failures of hashing or storage.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            UserError::DuplicateEmail(_) | UserError::NotFound | UserError::InvalidRequest(_)
        )
    }
}

impl From<JsonRejection> for UserError {
    fn from(rejection: JsonRejection) -> Self {
        UserError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            return (StatusCode::BAD_REQUEST, self.to_string()).into_response();
        }
        tracing::error!(error = %self, "user request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "An internal error occurred".to_string(),
        )
            .into_response()
    }
}
