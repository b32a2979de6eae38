//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`; responses are JSON envelopes of the form
//! `{ "error": true, "message": "...", "code": "...", "field_errors": {...}? }`.

use std::collections::HashMap;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::email::EmailError;
use crate::services::tokens::TokenError;

/// Application-level error type for the accounts service.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Token operation failed.
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    /// Email delivery failed.
    #[error("Email error: {0}")]
    Email(#[from] EmailError),

    /// Input validation failed, with per-field messages.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Requester is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Requester is authenticated but not allowed.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build a validation error from field-level messages.
    #[must_use]
    pub fn validation(message: impl Into<String>, field_errors: HashMap<String, String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors,
        }
    }

    /// Machine-readable code for client handling.
    fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) | Self::Token(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Database(RepositoryError::NotFound) => "NOT_FOUND",
            Self::Database(RepositoryError::Conflict(_)) => "CONFLICT",
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::RoleMismatch => "UNAUTHORIZED",
                AuthError::AccountInactive | AuthError::ActivationTokenSpent => "FORBIDDEN",
                AuthError::InvalidEmail(_)
                | AuthError::WeakPassword(_)
                | AuthError::EmailTaken
                | AuthError::InvalidActivationToken => "VALIDATION_ERROR",
                AuthError::PasswordHash | AuthError::Repository(_) => "INTERNAL_SERVER_ERROR",
            },
            Self::Database(_) | Self::Internal(_) | Self::Email(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(RepositoryError::Database(_) | RepositoryError::DataCorruption(_))
                | Self::Internal(_)
                | Self::Email(_)
                | Self::Auth(AuthError::PasswordHash | AuthError::Repository(_))
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::RoleMismatch => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::AccountInactive | AuthError::ActivationTokenSpent => {
                    StatusCode::FORBIDDEN
                }
                AuthError::InvalidEmail(_)
                | AuthError::WeakPassword(_)
                | AuthError::EmailTaken
                | AuthError::InvalidActivationToken => StatusCode::BAD_REQUEST,
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Token(err) => match err {
                TokenError::Invalid | TokenError::Expired => StatusCode::UNAUTHORIZED,
                TokenError::Encoding(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Validation { .. } | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) | Self::Email(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) | Self::Email(_) => "Internal server error".to_string(),
            Self::Database(err) => match err {
                RepositoryError::NotFound => "Not found".to_string(),
                RepositoryError::Conflict(msg) => msg.clone(),
                _ => "Internal server error".to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::RoleMismatch => {
                    "Invalid credentials".to_string()
                }
                AuthError::AccountInactive => "Account is not active".to_string(),
                AuthError::EmailTaken => "An account with this email already exists".to_string(),
                AuthError::WeakPassword(msg) => msg.clone(),
                AuthError::InvalidEmail(e) => e.to_string(),
                AuthError::InvalidActivationToken => "Invalid activation link".to_string(),
                AuthError::ActivationTokenSpent => {
                    "Activation link expired or already used".to_string()
                }
                AuthError::PasswordHash | AuthError::Repository(_) => {
                    "Internal server error".to_string()
                }
            },
            Self::Token(_) => "Invalid or expired token".to_string(),
            Self::Validation { message, .. } => message.clone(),
            _ => self.to_string(),
        };

        let mut body = json!({
            "error": true,
            "message": message,
            "code": self.code(),
        });

        if let Self::Validation { field_errors, .. } = &self
            && !field_errors.is_empty()
        {
            body["field_errors"] = json!(field_errors);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("address 123".to_string());
        assert_eq!(err.to_string(), "Not found: address 123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_auth_error_status_mapping() {
        // Failed credential check and role mismatch are both 401
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::RoleMismatch)),
            StatusCode::UNAUTHORIZED
        );
        // Correct credentials on an inactive account is 403
        assert_eq!(
            get_status(AppError::Auth(AuthError::AccountInactive)),
            StatusCode::FORBIDDEN
        );
        // Duplicate email surfaces as a 400 with explicit message
        assert_eq!(
            get_status(AppError::Auth(AuthError::EmailTaken)),
            StatusCode::BAD_REQUEST
        );
        // Activation token: unknown is 400, spent/expired is 403
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidActivationToken)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::ActivationTokenSpent)),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_repository_error_status_mapping() {
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict(
                "profile already exists".to_string()
            ))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_validation_error_carries_field_errors() {
        let mut fields = HashMap::new();
        fields.insert("password2".to_string(), "Passwords do not match".to_string());

        let err = AppError::validation("Validation failed", fields);
        assert_eq!(get_status(err), StatusCode::BAD_REQUEST);
    }
}
