//! Address route handlers.
//!
//! All operations are scoped to the requester; an address id belonging to a
//! different account behaves exactly like a missing one (404).

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use kabaditech_core::AddressId;

use crate::db::AddressRepository;
use crate::db::addresses::{AddressChanges, NewAddress};
use crate::error::{AppError, Result};
use crate::middleware::RequireAccount;
use crate::models::Address;
use crate::state::AppState;

/// Address creation payload.
#[derive(Debug, Deserialize)]
pub struct CreateAddressPayload {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub landmark: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Address update payload; absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateAddressPayload {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub landmark: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub is_default: Option<bool>,
}

/// `GET /address` - list the requester's addresses.
#[instrument(skip(state, account))]
pub async fn list(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool())
        .list_for_account(account.id)
        .await?;

    Ok(Json(addresses))
}

/// `POST /address` - create an address.
///
/// Setting `is_default` demotes any previous default in the same
/// transaction.
#[instrument(skip(state, account, payload))]
pub async fn create(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    Json(payload): Json<CreateAddressPayload>,
) -> Result<(StatusCode, Json<Address>)> {
    let new_address = validate_create(payload)?;

    let address = AddressRepository::new(state.pool())
        .create(account.id, &new_address)
        .await?;

    Ok((StatusCode::CREATED, Json(address)))
}

/// `PUT /address/{id}` - partial update.
///
/// Promoting to default demotes any previous default in the same
/// transaction; demoting never promotes a replacement.
#[instrument(skip(state, account, payload))]
pub async fn update(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateAddressPayload>,
) -> Result<Json<Address>> {
    let changes = validate_update(payload)?;

    let address = AddressRepository::new(state.pool())
        .update(account.id, AddressId::new(id), &changes)
        .await?;

    Ok(Json(address))
}

/// `DELETE /address/{id}`.
///
/// Deleting the current default leaves the account with zero defaults.
#[instrument(skip(state, account))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    AddressRepository::new(state.pool())
        .delete(account.id, AddressId::new(id))
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Validation
// =============================================================================

/// Required-field validation for address creation.
fn validate_create(payload: CreateAddressPayload) -> Result<NewAddress> {
    let mut field_errors = HashMap::new();

    let mut required = |field: &str, value: Option<String>| -> String {
        match value {
            Some(v) if !v.trim().is_empty() => v,
            _ => {
                field_errors.insert(field.to_owned(), "This field is required".to_owned());
                String::new()
            }
        }
    };

    let line1 = required("line1", payload.line1);
    let city = required("city", payload.city);
    let state = required("state", payload.state);
    let country = required("country", payload.country);
    let postal_code = required("postal_code", payload.postal_code);

    if !field_errors.is_empty() {
        return Err(AppError::validation("Validation failed", field_errors));
    }

    Ok(NewAddress {
        line1,
        line2: payload.line2,
        landmark: payload.landmark,
        city,
        state,
        country,
        postal_code,
        is_default: payload.is_default,
    })
}

/// Reject blanking out required fields on update.
fn validate_update(payload: UpdateAddressPayload) -> Result<AddressChanges> {
    let mut field_errors = HashMap::new();

    for (field, value) in [
        ("line1", &payload.line1),
        ("city", &payload.city),
        ("state", &payload.state),
        ("country", &payload.country),
        ("postal_code", &payload.postal_code),
    ] {
        if value.as_ref().is_some_and(|v| v.trim().is_empty()) {
            field_errors.insert(field.to_owned(), "This field cannot be blank".to_owned());
        }
    }

    if !field_errors.is_empty() {
        return Err(AppError::validation("Validation failed", field_errors));
    }

    Ok(AddressChanges {
        line1: payload.line1,
        line2: payload.line2,
        landmark: payload.landmark,
        city: payload.city,
        state: payload.state,
        country: payload.country,
        postal_code: payload.postal_code,
        is_default: payload.is_default,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn full_payload() -> CreateAddressPayload {
        CreateAddressPayload {
            line1: Some("12 Scrap Yard Road".to_owned()),
            line2: None,
            landmark: Some("Opposite the market".to_owned()),
            city: Some("Pune".to_owned()),
            state: Some("Maharashtra".to_owned()),
            country: Some("India".to_owned()),
            postal_code: Some("411001".to_owned()),
            is_default: true,
        }
    }

    #[test]
    fn test_validate_create_accepts_full_payload() {
        let address = validate_create(full_payload()).unwrap();
        assert_eq!(address.line1, "12 Scrap Yard Road");
        assert!(address.is_default);
    }

    #[test]
    fn test_validate_create_collects_missing_fields() {
        let payload = CreateAddressPayload {
            line1: None,
            line2: None,
            landmark: None,
            city: Some("  ".to_owned()),
            state: None,
            country: Some("India".to_owned()),
            postal_code: None,
            is_default: false,
        };

        let err = validate_create(payload).unwrap_err();
        match err {
            AppError::Validation { field_errors, .. } => {
                for field in ["line1", "city", "state", "postal_code"] {
                    assert!(field_errors.contains_key(field), "missing error for {field}");
                }
                assert!(!field_errors.contains_key("country"));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_update_rejects_blank_required_field() {
        let payload = UpdateAddressPayload {
            line1: Some(String::new()),
            line2: None,
            landmark: None,
            city: None,
            state: None,
            country: None,
            postal_code: None,
            is_default: Some(true),
        };

        let err = validate_update(payload).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_validate_update_passes_partial_changes_through() {
        let payload = UpdateAddressPayload {
            line1: None,
            line2: None,
            landmark: None,
            city: None,
            state: None,
            country: None,
            postal_code: None,
            is_default: Some(true),
        };

        let changes = validate_update(payload).unwrap();
        assert_eq!(changes.is_default, Some(true));
        assert!(changes.line1.is_none());
    }
}
