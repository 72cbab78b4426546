use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::response::IntoResponse;
use tracing::warn;

use cliptube_types::api::{ApiEnvelope, ChangePasswordRequest, UpdateAccountRequest};

use crate::assets::{AssetKind, MAX_IMAGE_SIZE, stage_upload};
use crate::auth::{AppState, hash_password, password_matches};
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::multipart::FormData;
use crate::blocking;

pub async fn current_user(CurrentUser(user): CurrentUser) -> impl IntoResponse {
    Json(ApiEnvelope::ok(user, "current user fetched successfully"))
}

pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.old_password.is_empty() || req.new_password.is_empty() || req.confirm_password.is_empty()
    {
        return Err(ApiError::validation("all password fields are required"));
    }
    if req.new_password != req.confirm_password {
        return Err(ApiError::validation(
            "new password and confirm password do not match",
        ));
    }
    if req.new_password.len() < 8 {
        return Err(ApiError::validation(
            "password must be at least 8 characters",
        ));
    }

    let row = blocking(&state, move |db| db.get_user_by_id(user.id))
        .await?
        .ok_or_else(|| ApiError::not_found("user does not exist"))?;

    if !password_matches(&req.old_password, &row.password)? {
        return Err(ApiError::validation("invalid old password"));
    }

    let new_hash = hash_password(&req.new_password)?;
    blocking(&state, move |db| db.update_password(row.id, &new_hash)).await?;

    Ok(Json(ApiEnvelope::ok(
        serde_json::json!({}),
        "password changed successfully",
    )))
}

pub async fn update_account(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.full_name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(ApiError::validation("fullName and email are required"));
    }
    if !req.email.contains('@') {
        return Err(ApiError::validation("email is not valid"));
    }

    let updated = blocking(&state, move |db| {
        db.update_account(user.id, req.full_name.trim(), req.email.trim())?;
        db.get_user_by_id(user.id)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("user does not exist"))?;

    Ok(Json(ApiEnvelope::ok(
        updated.into_user(),
        "account details updated successfully",
    )))
}

pub async fn update_avatar(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    replace_image(state, user.id, multipart, "avatar").await
}

pub async fn update_cover_image(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    replace_image(state, user.id, multipart, "coverImage").await
}

/// Shared avatar/cover replacement: upload the new image first, swap the row,
/// then delete the old asset. A failed delete only leaves an orphan at the
/// host, so it is logged rather than failing the request.
async fn replace_image(
    state: AppState,
    user_id: uuid::Uuid,
    multipart: Multipart,
    field: &'static str,
) -> Result<impl IntoResponse, ApiError> {
    let form = FormData::read(multipart).await?;
    let bytes = form.require_file(field)?;
    if bytes.len() > MAX_IMAGE_SIZE {
        return Err(ApiError::validation(format!("{field} file is too large")));
    }

    let row = blocking(&state, move |db| db.get_user_by_id(user_id))
        .await?
        .ok_or_else(|| ApiError::not_found("user does not exist"))?;

    let staged = stage_upload(&state.upload_dir, bytes).await?;
    let uploaded = state.assets.upload(&staged, AssetKind::Image).await?;

    let old_asset_id = if field == "avatar" {
        Some(row.avatar_asset_id.clone())
    } else {
        row.cover_image_asset_id.clone()
    };

    let updated = {
        let (url, asset_id) = (uploaded.url.clone(), uploaded.asset_id.clone());
        blocking(&state, move |db| {
            if field == "avatar" {
                db.update_avatar(user_id, &url, &asset_id)?;
            } else {
                db.update_cover_image(user_id, &url, &asset_id)?;
            }
            db.get_user_by_id(user_id)
        })
        .await?
        .ok_or_else(|| ApiError::not_found("user does not exist"))?
    };

    if let Some(asset_id) = old_asset_id {
        if let Err(e) = state.assets.delete(&asset_id).await {
            warn!("failed to delete replaced asset {}: {:#}", asset_id, e);
        }
    }

    Ok(Json(ApiEnvelope::ok(
        updated.into_user(),
        format!("{field} updated successfully"),
    )))
}

/// Public channel page for a username, with subscriber counts and whether the
/// viewer subscribes to it.
pub async fn channel_profile(
    State(state): State<AppState>,
    CurrentUser(viewer): CurrentUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let username = username.trim().to_lowercase();
    if username.is_empty() {
        return Err(ApiError::validation("username is required"));
    }

    let profile = blocking(&state, move |db| db.channel_profile(&username, viewer.id))
        .await?
        .ok_or_else(|| ApiError::not_found("channel does not exist"))?;

    Ok(Json(ApiEnvelope::ok(
        profile,
        "channel profile fetched successfully",
    )))
}

/// The viewer's watch history, oldest watch first; rewatching moves a video
/// to the end.
pub async fn watch_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<impl IntoResponse, ApiError> {
    let videos = blocking(&state, move |db| db.watch_history(user.id)).await?;
    Ok(Json(ApiEnvelope::ok(
        videos,
        "watch history fetched successfully",
    )))
}
