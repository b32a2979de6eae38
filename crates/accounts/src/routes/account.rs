//! Account route handlers.
//!
//! Basic-field access and the explicit cascading delete.

use std::collections::HashMap;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::AccountRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAccount;
use crate::routes::auth::AccountResponse;
use crate::state::AppState;

/// Account update payload.
#[derive(Debug, Deserialize)]
pub struct UpdateAccountPayload {
    pub full_name: String,
}

/// Return the requester's account.
#[instrument(skip(state, account))]
pub async fn show(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
) -> Result<Json<AccountResponse>> {
    let record = AccountRepository::new(state.pool())
        .get_by_id(account.id)
        .await?
        .ok_or_else(|| AppError::NotFound("account not found".to_owned()))?;

    Ok(Json(AccountResponse::from(&record)))
}

/// Update the requester's display name.
#[instrument(skip(state, account, payload))]
pub async fn update(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    Json(payload): Json<UpdateAccountPayload>,
) -> Result<Json<AccountResponse>> {
    if payload.full_name.trim().is_empty() {
        let mut field_errors = HashMap::new();
        field_errors.insert("full_name".to_owned(), "This field is required".to_owned());
        return Err(AppError::validation("Validation failed", field_errors));
    }

    let record = AccountRepository::new(state.pool())
        .update_full_name(account.id, payload.full_name.trim())
        .await?;

    Ok(Json(AccountResponse::from(&record)))
}

/// Delete the requester's account and everything it owns.
///
/// Profile, addresses and tokens are removed in the same transaction as the
/// account row.
#[instrument(skip(state, account))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
) -> Result<StatusCode> {
    AccountRepository::new(state.pool()).delete(account.id).await?;

    Ok(StatusCode::NO_CONTENT)
}
