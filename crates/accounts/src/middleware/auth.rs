//! Authentication extractors.
//!
//! Provides extractors for requiring bearer-token authentication in route
//! handlers.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;
use crate::models::CurrentAccount;
use crate::state::AppState;

/// Extractor that requires an authenticated account.
///
/// Validates the `Authorization: Bearer <token>` header and recovers the
/// requester from the access token claims. Rejects with 401 when the header
/// is missing or the token fails validation.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAccount(account): RequireAccount,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", account.email)
/// }
/// ```
pub struct RequireAccount(pub CurrentAccount);

impl<S> FromRequestParts<S> for RequireAccount
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_owned()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_owned()))?;

        let account = state.tokens().validate_access(token)?;

        Ok(Self(account))
    }
}
