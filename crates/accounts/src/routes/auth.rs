//! Authentication route handlers.
//!
//! Registration, email activation, login and token lifecycle.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use kabaditech_core::{AccountId, AccountRole, ProfileKind};

use crate::db::{
    AccountRepository, ActivationTokenRepository, ProfileRepository, RefreshTokenRepository,
};
use crate::error::{AppError, Result};
use crate::middleware::RequireAccount;
use crate::models::{Account, CurrentAccount};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Days before an activation link expires.
const ACTIVATION_TOKEN_DAYS: i32 = 3;

// =============================================================================
// Payload Types
// =============================================================================

/// Registration payload.
#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub password2: String,
    pub account_type: String,
    pub profile_type: String,
}

/// Login payload.
#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
    pub user_type: String,
}

/// Refresh payload.
#[derive(Debug, Deserialize)]
pub struct RefreshPayload {
    pub refresh: String,
}

/// Logout payload.
#[derive(Debug, Deserialize)]
pub struct LogoutPayload {
    pub refresh: String,
}

// =============================================================================
// Response Types
// =============================================================================

/// Account summary returned by registration and login.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub account_type: AccountRole,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.as_i32(),
            email: account.email.to_string(),
            full_name: account.full_name.clone(),
            account_type: account.role,
            is_active: account.is_active,
            created_at: account.created_at,
        }
    }
}

/// Registration response.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub kt_id: String,
    pub account: AccountResponse,
}

/// Login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub account: AccountResponse,
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle registration.
///
/// Validates the payload, creates the inactive account and its role-specific
/// profile (allocating the KT id), generates the profile QR code, and sends
/// the activation email. QR and email failures are logged but never fail the
/// registration.
#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let (role, kind) = validate_registration(&payload)?;

    let auth = AuthService::new(state.pool());
    let account = auth
        .register(&payload.email, &payload.full_name, &payload.password, role)
        .await?;

    // Create the profile; the KT id allocation runs inside the insert
    // transaction. A fresh account cannot own a profile yet, so a failure
    // here is unexpected - compensate by removing the account again.
    let profiles = ProfileRepository::new(state.pool());
    let profile = match profiles.create(account.id, kind).await {
        Ok(profile) => profile,
        Err(e) => {
            tracing::error!(account_id = %account.id, error = %e, "profile creation failed, rolling back account");
            if let Err(cleanup) = AccountRepository::new(state.pool()).delete(account.id).await {
                tracing::error!(account_id = %account.id, error = %cleanup, "account cleanup failed");
            }
            return Err(e.into());
        }
    };

    // QR code: best effort, the column stays NULL on failure
    match state.qr().generate_profile_qr(&profile.kt_id, &account.email) {
        Ok(path) => {
            if let Err(e) = profiles.set_qr_code(account.id, role, &path).await {
                tracing::error!(account_id = %account.id, error = %e, "failed to record QR code path");
            }
        }
        Err(e) => {
            tracing::error!(account_id = %account.id, error = %e, "QR code generation failed");
        }
    }

    // Activation token + email: best effort, the account stays inactive
    // until a token is consumed
    let raw_token = state.tokens().generate_opaque();
    let token_hash = state.tokens().hash_opaque(&raw_token);
    let tokens = ActivationTokenRepository::new(state.pool());
    match tokens
        .create(account.id, &token_hash, ACTIVATION_TOKEN_DAYS)
        .await
    {
        Ok(_) => {
            let url = state.config().activation_url(account.id.as_i32(), &raw_token);
            if let Err(e) = state
                .email()
                .send_activation_email(account.email.as_str(), &account.full_name, &url)
                .await
            {
                tracing::error!(account_id = %account.id, error = %e, "activation email failed");
            }
        }
        Err(e) => {
            tracing::error!(account_id = %account.id, error = %e, "activation token creation failed");
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Account created. Check your email for the activation link.".to_owned(),
            kt_id: profile.kt_id.to_string(),
            account: AccountResponse::from(&account),
        }),
    ))
}

/// Handle the activation link.
///
/// Single-use: a second visit reports the token as spent.
#[instrument(skip(state, token))]
pub async fn email_verify(
    State(state): State<AppState>,
    Path((uid, token)): Path<(i32, String)>,
) -> Result<Json<serde_json::Value>> {
    let token_hash = state.tokens().hash_opaque(&token);

    AuthService::new(state.pool())
        .activate(AccountId::new(uid), &token_hash)
        .await?;

    Ok(Json(serde_json::json!({
        "message": "Account activated. You can now log in."
    })))
}

/// Handle login.
///
/// Unknown email, wrong password and role mismatch are all 401; an inactive
/// account with correct credentials is 403.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<LoginResponse>> {
    let role: AccountRole = payload.user_type.parse().map_err(|e: String| {
        let mut field_errors = HashMap::new();
        field_errors.insert("user_type".to_owned(), e);
        AppError::validation("Validation failed", field_errors)
    })?;

    let account = AuthService::new(state.pool())
        .authenticate(&payload.email, &payload.password, role)
        .await?;

    let current = CurrentAccount::from(&account);
    let access = state.tokens().issue_access(&current)?;

    let refresh = state.tokens().generate_opaque();
    let refresh_hash = state.tokens().hash_opaque(&refresh);
    RefreshTokenRepository::new(state.pool())
        .create(account.id, &refresh_hash, state.tokens().refresh_expiry())
        .await?;

    Ok(Json(LoginResponse {
        access,
        refresh,
        account: AccountResponse::from(&account),
    }))
}

/// Rotate the access token using a refresh token.
#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshPayload>,
) -> Result<Json<serde_json::Value>> {
    let refresh_hash = state.tokens().hash_opaque(&payload.refresh);

    let token = RefreshTokenRepository::new(state.pool())
        .get_live(&refresh_hash)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid refresh token".to_owned()))?;

    let account = AccountRepository::new(state.pool())
        .get_by_id(token.account_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid refresh token".to_owned()))?;

    if !account.is_active {
        return Err(AppError::Forbidden("account is not active".to_owned()));
    }

    let access = state.tokens().issue_access(&CurrentAccount::from(&account))?;

    Ok(Json(serde_json::json!({ "access": access })))
}

/// Revoke the presented refresh token.
///
/// Revoking an already-revoked or unknown token is not an error.
#[instrument(skip(state, account, payload))]
pub async fn logout(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    Json(payload): Json<LogoutPayload>,
) -> Result<Json<serde_json::Value>> {
    let refresh_hash = state.tokens().hash_opaque(&payload.refresh);

    match RefreshTokenRepository::new(state.pool())
        .revoke(account.id, &refresh_hash)
        .await
    {
        Ok(()) => {}
        Err(crate::db::RepositoryError::NotFound) => {
            tracing::debug!(account_id = %account.id, "logout with unknown refresh token");
        }
        Err(e) => return Err(e.into()),
    }

    Ok(Json(serde_json::json!({ "message": "Logged out." })))
}

// =============================================================================
// Validation
// =============================================================================

/// Field-level validation of the registration payload.
///
/// Runs before any persistence: a payload with mismatched passwords never
/// creates an account.
fn validate_registration(payload: &RegisterPayload) -> Result<(AccountRole, ProfileKind)> {
    let mut field_errors = HashMap::new();

    if payload.full_name.trim().is_empty() {
        field_errors.insert("full_name".to_owned(), "This field is required".to_owned());
    }

    if let Err(e) = kabaditech_core::Email::parse(&payload.email) {
        field_errors.insert("email".to_owned(), e.to_string());
    }

    if let Err(e) = crate::services::auth::validate_password(&payload.password) {
        field_errors.insert("password".to_owned(), e.to_string());
    }

    if payload.password != payload.password2 {
        field_errors.insert("password2".to_owned(), "Passwords do not match".to_owned());
    }

    let role = match payload.account_type.parse::<AccountRole>() {
        Ok(role) => Some(role),
        Err(e) => {
            field_errors.insert("account_type".to_owned(), e);
            None
        }
    };

    let kind = role.and_then(
        |role| match ProfileKind::from_parts(role, &payload.profile_type) {
            Ok(kind) => Some(kind),
            Err(e) => {
                field_errors.insert("profile_type".to_owned(), e);
                None
            }
        },
    );

    match (role, kind) {
        (Some(role), Some(kind)) if field_errors.is_empty() => Ok((role, kind)),
        _ => Err(AppError::validation("Validation failed", field_errors)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn payload() -> RegisterPayload {
        RegisterPayload {
            full_name: "Asha Rao".to_owned(),
            email: "asha@example.com".to_owned(),
            password: "long enough".to_owned(),
            password2: "long enough".to_owned(),
            account_type: "dealer".to_owned(),
            profile_type: "kabadi".to_owned(),
        }
    }

    #[test]
    fn test_valid_registration_payload() {
        let (role, kind) = validate_registration(&payload()).unwrap();
        assert_eq!(role, AccountRole::Dealer);
        assert_eq!(kind.id_prefix().as_str(), "KTDK");
    }

    #[test]
    fn test_password_mismatch_is_field_error() {
        let mut p = payload();
        p.password2 = "different".to_owned();

        let err = validate_registration(&p).unwrap_err();
        match err {
            AppError::Validation { field_errors, .. } => {
                assert!(field_errors.contains_key("password2"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_cross_role_subtype_is_field_error() {
        let mut p = payload();
        p.account_type = "customer".to_owned();
        // "kabadi" is a dealer subtype

        let err = validate_registration(&p).unwrap_err();
        match err {
            AppError::Validation { field_errors, .. } => {
                assert!(field_errors.contains_key("profile_type"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_field_errors_collected() {
        let p = RegisterPayload {
            full_name: "  ".to_owned(),
            email: "not-an-email".to_owned(),
            password: "short".to_owned(),
            password2: "other".to_owned(),
            account_type: "reseller".to_owned(),
            profile_type: "kabadi".to_owned(),
        };

        let err = validate_registration(&p).unwrap_err();
        match err {
            AppError::Validation { field_errors, .. } => {
                for field in ["full_name", "email", "password", "password2", "account_type"] {
                    assert!(field_errors.contains_key(field), "missing error for {field}");
                }
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
