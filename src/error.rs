use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Wrapper putting every success payload under the `detail` key, mirroring
/// the envelope `ApiError` produces for failures.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub detail: T,
}

impl<T: Serialize> Envelope<T> {
    pub fn new(detail: T) -> Self {
        Self { detail }
    }
}

/// Every business-rule failure in the API. Converted to the
/// `{"detail": {"message", "status_code"}}` envelope at the request boundary;
/// nothing below the handlers touches HTTP types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
    #[error("Invalid email")]
    InvalidEmail,
    #[error("profile must be administrator or standard")]
    InvalidRole,
    #[error("User not found")]
    UserNotFound,
    #[error("Code not found")]
    CodeNotFound,
    #[error("{0}")]
    NotFound(&'static str),
    #[error("email already exists")]
    EmailTaken,
    #[error("password is incorrect")]
    WrongPassword,
    #[error("current password is incorrect")]
    WrongCurrentPassword,
    #[error("API Key is required")]
    MissingApiKey,
    #[error("Invalid API Key")]
    InvalidApiKey,
    #[error("Token is required")]
    MissingToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Unauthorized. This request can only be made by administrators.")]
    AdminOnly,
    #[error("Incorrect code")]
    CodeMismatch,
    #[error("Code expired")]
    CodeExpired,
    #[error("invalid code")]
    InvalidCode,
    #[error("code not verified")]
    CodeNotVerified,
    #[error("Error sending verification code to email")]
    MailDelivery,
    #[error(
        "An error occurred while processing the image. Please check that the \
         image is in the correct format and try again."
    )]
    InvalidImage,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
    #[error("database error")]
    Database(sqlx::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::EmptyField(_)
            | ApiError::MissingApiKey
            | ApiError::MissingToken
            | ApiError::CodeExpired
            | ApiError::CodeNotVerified
            | ApiError::InvalidImage => StatusCode::BAD_REQUEST,
            ApiError::WrongPassword | ApiError::WrongCurrentPassword => StatusCode::UNAUTHORIZED,
            ApiError::InvalidApiKey
            | ApiError::TokenExpired
            | ApiError::InvalidToken
            | ApiError::AdminOnly
            | ApiError::CodeMismatch
            | ApiError::InvalidCode => StatusCode::FORBIDDEN,
            ApiError::UserNotFound | ApiError::CodeNotFound | ApiError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::EmailTaken => StatusCode::CONFLICT,
            ApiError::InvalidEmail | ApiError::InvalidRole => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::MailDelivery | ApiError::Internal(_) | ApiError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        // Unique-violation on users.email is the conflict-as-signal path for
        // concurrent registrations racing past the existence check.
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return ApiError::EmailTaken;
            }
        }
        ApiError::Database(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    message: String,
    status_code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = Json(Envelope::new(ErrorDetail {
            message: self.to_string(),
            status_code: status.as_u16(),
        }));
        (status, body).into_response()
    }
}
