//! Profile route handlers.
//!
//! Role-scoped read and multipart update of the requester's profile. The
//! customer and dealer endpoints share one implementation; a requester whose
//! role does not match the endpoint gets 403 regardless of what exists in
//! the database.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Multipart, State},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

use kabaditech_core::{AccountRole, ProfileKind};

use crate::db::ProfileRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAccount;
use crate::models::{CurrentAccount, Profile};
use crate::state::AppState;

/// Accepted picture upload extensions.
const ALLOWED_PICTURE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// Profile response body.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub kt_id: String,
    pub account_type: AccountRole,
    pub profile_type: String,
    pub picture: String,
    pub qr_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Profile> for ProfileResponse {
    fn from(profile: &Profile) -> Self {
        Self {
            kt_id: profile.kt_id.to_string(),
            account_type: profile.role(),
            profile_type: profile.kind.to_string(),
            picture: profile.picture.clone(),
            qr_code: profile.qr_code.clone(),
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

/// `GET /customer-profile`
#[instrument(skip(state, account))]
pub async fn show_customer(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
) -> Result<Json<ProfileResponse>> {
    show(state, account, AccountRole::Customer).await
}

/// `GET /dealer-profile`
#[instrument(skip(state, account))]
pub async fn show_dealer(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
) -> Result<Json<ProfileResponse>> {
    show(state, account, AccountRole::Dealer).await
}

/// `PUT /customer-profile`
#[instrument(skip(state, account, multipart))]
pub async fn update_customer(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    multipart: Multipart,
) -> Result<Json<ProfileResponse>> {
    update(state, account, AccountRole::Customer, multipart).await
}

/// `PUT /dealer-profile`
#[instrument(skip(state, account, multipart))]
pub async fn update_dealer(
    State(state): State<AppState>,
    RequireAccount(account): RequireAccount,
    multipart: Multipart,
) -> Result<Json<ProfileResponse>> {
    update(state, account, AccountRole::Dealer, multipart).await
}

async fn show(
    state: AppState,
    requester: CurrentAccount,
    role: AccountRole,
) -> Result<Json<ProfileResponse>> {
    require_role(&requester, role)?;

    let profile = ProfileRepository::new(state.pool())
        .get_by_account(requester.id, role)
        .await?
        .ok_or_else(|| AppError::NotFound("profile not found".to_owned()))?;

    Ok(Json(ProfileResponse::from(&profile)))
}

async fn update(
    state: AppState,
    requester: CurrentAccount,
    role: AccountRole,
    mut multipart: Multipart,
) -> Result<Json<ProfileResponse>> {
    require_role(&requester, role)?;

    let profiles = ProfileRepository::new(state.pool());
    let mut profile = profiles
        .get_by_account(requester.id, role)
        .await?
        .ok_or_else(|| AppError::NotFound("profile not found".to_owned()))?;

    let mut new_subtype: Option<String> = None;
    let mut picture: Option<(String, Vec<u8>)> = None;
    let mut regenerate_qr = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("profile_type") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?;
                new_subtype = Some(value);
            }
            Some("picture") => {
                let extension = picture_extension(field.file_name())?;
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?;
                picture = Some((extension, data.to_vec()));
            }
            Some("regenerate_qr") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?;
                regenerate_qr = value == "true";
            }
            _ => {}
        }
    }

    if let Some(subtype) = new_subtype {
        // The KT id keeps its originally allocated prefix; only the subtype
        // label changes.
        let kind = ProfileKind::from_parts(role, &subtype).map_err(|e| {
            let mut field_errors = HashMap::new();
            field_errors.insert("profile_type".to_owned(), e);
            AppError::validation("Validation failed", field_errors)
        })?;
        profile = profiles.update_kind(requester.id, kind).await?;
    }

    if let Some((extension, data)) = picture {
        let relative = format!("profile_pictures/{}.{extension}", profile.kt_id);
        let target = state.config().media_root.join(&relative);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("media write failed: {e}")))?;
        }
        tokio::fs::write(&target, &data)
            .await
            .map_err(|e| AppError::Internal(format!("media write failed: {e}")))?;

        profile = profiles
            .update_picture(requester.id, role, &relative)
            .await?;
    }

    if regenerate_qr {
        let path = state
            .qr()
            .generate_profile_qr(&profile.kt_id, &requester.email)
            .map_err(|e| AppError::Internal(format!("QR generation failed: {e}")))?;
        profiles.set_qr_code(requester.id, role, &path).await?;
        profile.qr_code = Some(path);
    }

    Ok(Json(ProfileResponse::from(&profile)))
}

/// Reject requesters whose role does not match the endpoint.
fn require_role(requester: &CurrentAccount, role: AccountRole) -> Result<()> {
    if requester.role != role {
        return Err(AppError::Forbidden(format!(
            "this endpoint serves {role} profiles"
        )));
    }
    Ok(())
}

/// Validate and extract the picture file extension.
fn picture_extension(file_name: Option<&str>) -> Result<String> {
    let extension = file_name
        .and_then(|name| name.rsplit('.').next())
        .map(str::to_ascii_lowercase)
        .filter(|ext| ALLOWED_PICTURE_EXTENSIONS.contains(&ext.as_str()));

    extension.ok_or_else(|| {
        let mut field_errors = HashMap::new();
        field_errors.insert(
            "picture".to_owned(),
            format!(
                "unsupported image type, expected one of: {}",
                ALLOWED_PICTURE_EXTENSIONS.join(", ")
            ),
        );
        AppError::validation("Validation failed", field_errors)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use kabaditech_core::{AccountId, Email};

    fn requester(role: AccountRole) -> CurrentAccount {
        CurrentAccount {
            id: AccountId::new(1),
            email: Email::parse("user@example.com").unwrap(),
            role,
        }
    }

    #[test]
    fn test_require_role_matches() {
        assert!(require_role(&requester(AccountRole::Dealer), AccountRole::Dealer).is_ok());
    }

    #[test]
    fn test_require_role_mismatch_is_forbidden() {
        let err = require_role(&requester(AccountRole::Customer), AccountRole::Dealer).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn test_picture_extension_accepted() {
        assert_eq!(picture_extension(Some("me.PNG")).unwrap(), "png");
        assert_eq!(picture_extension(Some("a.b.jpeg")).unwrap(), "jpeg");
    }

    #[test]
    fn test_picture_extension_rejected() {
        assert!(picture_extension(Some("script.svg")).is_err());
        assert!(picture_extension(Some("noextension")).is_err());
        assert!(picture_extension(None).is_err());
    }
}
