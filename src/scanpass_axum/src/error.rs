use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use scanpass_adapters::TokenAuthError;
use scanpass_application::{ChangePasswordError, LoginError, QrLoginError, RefreshTokenError};
use scanpass_core::{PasswordHasherError, QrSessionStoreError, UserStoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub error: String,
}

#[derive(Debug, Error)]
pub enum AuthApiError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account deactivated")]
    AccountDeactivated,

    #[error("Invalid or expired session")]
    InvalidOrExpiredSession,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl AuthApiError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthApiError::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            AuthApiError::InvalidOrExpiredSession => "INVALID_OR_EXPIRED_SESSION",
            AuthApiError::SessionNotFound => "SESSION_NOT_FOUND",
            AuthApiError::Unauthorized => "UNAUTHORIZED",
            AuthApiError::ValidationFailed(_) => "VALIDATION_FAILED",
            AuthApiError::StorageFailure(_) => "STORAGE_FAILURE",
            AuthApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthApiError::InvalidCredentials | AuthApiError::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            AuthApiError::AccountDeactivated => StatusCode::FORBIDDEN,
            AuthApiError::InvalidOrExpiredSession | AuthApiError::ValidationFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthApiError::SessionNotFound => StatusCode::NOT_FOUND,
            AuthApiError::StorageFailure(_) | AuthApiError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let status_code = self.status();

        // Server-side detail stays in the logs.
        let error_message = match &self {
            AuthApiError::StorageFailure(_) | AuthApiError::InternalError(_) => {
                tracing::error!(error = %self, "request failed");
                "Internal server error".to_owned()
            }
            _ => self.to_string(),
        };

        let body = Json(ErrorResponse {
            code: self.code().to_owned(),
            error: error_message,
        });

        (status_code, body).into_response()
    }
}

impl From<JsonRejection> for AuthApiError {
    fn from(rejection: JsonRejection) -> Self {
        AuthApiError::ValidationFailed(rejection.body_text())
    }
}

impl From<QueryRejection> for AuthApiError {
    fn from(rejection: QueryRejection) -> Self {
        AuthApiError::ValidationFailed(rejection.body_text())
    }
}

impl From<TokenAuthError> for AuthApiError {
    fn from(_: TokenAuthError) -> Self {
        AuthApiError::Unauthorized
    }
}

impl From<UserStoreError> for AuthApiError {
    fn from(error: UserStoreError) -> Self {
        match error {
            UserStoreError::UserNotFound => AuthApiError::Unauthorized,
            UserStoreError::UserAlreadyExists | UserStoreError::UnexpectedError(_) => {
                AuthApiError::StorageFailure(error.to_string())
            }
        }
    }
}

impl From<QrSessionStoreError> for AuthApiError {
    fn from(error: QrSessionStoreError) -> Self {
        AuthApiError::StorageFailure(error.to_string())
    }
}

impl From<PasswordHasherError> for AuthApiError {
    fn from(error: PasswordHasherError) -> Self {
        match error {
            PasswordHasherError::Mismatch => AuthApiError::InvalidCredentials,
            PasswordHasherError::UnexpectedError(e) => AuthApiError::InternalError(e),
        }
    }
}

impl From<LoginError> for AuthApiError {
    fn from(error: LoginError) -> Self {
        match error {
            LoginError::InvalidCredentials => AuthApiError::InvalidCredentials,
            LoginError::AccountDeactivated => AuthApiError::AccountDeactivated,
            LoginError::UserError(e) => AuthApiError::ValidationFailed(e.to_string()),
            LoginError::UserStoreError(e) => e.into(),
            LoginError::PasswordHasherError(e) => e.into(),
            LoginError::TokenError(e) => AuthApiError::InternalError(e.to_string()),
        }
    }
}

impl From<RefreshTokenError> for AuthApiError {
    fn from(error: RefreshTokenError) -> Self {
        match error {
            RefreshTokenError::UserNotFound => AuthApiError::Unauthorized,
            RefreshTokenError::AccountDeactivated => AuthApiError::AccountDeactivated,
            RefreshTokenError::UserStoreError(e) => e.into(),
            RefreshTokenError::TokenError(e) => AuthApiError::InternalError(e.to_string()),
        }
    }
}

impl From<ChangePasswordError> for AuthApiError {
    fn from(error: ChangePasswordError) -> Self {
        match error {
            ChangePasswordError::IncorrectCurrentPassword => AuthApiError::InvalidCredentials,
            ChangePasswordError::UserError(e) => AuthApiError::ValidationFailed(e.to_string()),
            ChangePasswordError::UserStoreError(e) => e.into(),
            ChangePasswordError::PasswordHasherError(e) => e.into(),
        }
    }
}

impl From<QrLoginError> for AuthApiError {
    fn from(error: QrLoginError) -> Self {
        match error {
            QrLoginError::InvalidOrExpiredSession => AuthApiError::InvalidOrExpiredSession,
            QrLoginError::SessionNotFound => AuthApiError::SessionNotFound,
            QrLoginError::InvalidCredentials => AuthApiError::InvalidCredentials,
            QrLoginError::AccountDeactivated => AuthApiError::AccountDeactivated,
            QrLoginError::StorageFailure(e) => AuthApiError::StorageFailure(e),
            QrLoginError::InternalError(e) => AuthApiError::InternalError(e),
        }
    }
}
