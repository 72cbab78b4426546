use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use uuid::Uuid;

use cliptube_types::api::{ApiEnvelope, CreatePlaylistRequest, UpdatePlaylistRequest};
use cliptube_types::models::Playlist;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::ownership::ensure_owner;
use crate::blocking;

pub async fn create_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(req): Json<CreatePlaylistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::validation("name is required"));
    }

    let playlist_id = Uuid::new_v4();
    let (name, description) = (req.name.trim().to_string(), req.description);
    {
        let (name, description) = (name.clone(), description.clone());
        blocking(&state, move |db| {
            db.create_playlist(playlist_id, user.id, &name, &description)
        })
        .await?;
    }

    let playlist = Playlist {
        id: playlist_id,
        owner_id: user.id,
        name,
        description,
        created_at: Utc::now(),
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::created(
            playlist,
            "playlist created successfully",
        )),
    ))
}

pub async fn get_playlist_by_id(
    State(state): State<AppState>,
    Path(playlist_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let playlist = blocking(&state, move |db| db.get_playlist(playlist_id))
        .await?
        .ok_or_else(|| ApiError::not_found("playlist does not exist"))?;
    Ok(Json(ApiEnvelope::ok(
        playlist,
        "playlist fetched successfully",
    )))
}

/// All of a user's playlists, each expanded with its videos in playlist
/// order.
pub async fn get_user_playlists(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let playlists = blocking(&state, move |db| {
        if db.get_user_by_id(user_id)?.is_none() {
            return Ok(None);
        }
        db.playlists_by_owner(user_id).map(Some)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("user does not exist"))?;

    Ok(Json(ApiEnvelope::ok(
        playlists,
        "playlists fetched successfully",
    )))
}

pub async fn add_video_to_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((playlist_id, video_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let playlist = blocking(&state, move |db| db.get_playlist(playlist_id))
        .await?
        .ok_or_else(|| ApiError::not_found("playlist does not exist"))?;
    ensure_owner(&playlist, user.id, "modify this playlist")?;

    if blocking(&state, move |db| db.get_video(video_id)).await?.is_none() {
        return Err(ApiError::not_found("video does not exist"));
    }

    if blocking(&state, move |db| db.playlist_contains(playlist_id, video_id)).await? {
        return Err(ApiError::conflict("video is already in the playlist"));
    }

    blocking(&state, move |db| {
        db.add_video_to_playlist(playlist_id, video_id)
    })
    .await?;

    Ok(Json(ApiEnvelope::ok(
        serde_json::json!({}),
        "video added to playlist successfully",
    )))
}

pub async fn remove_video_from_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((playlist_id, video_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let playlist = blocking(&state, move |db| db.get_playlist(playlist_id))
        .await?
        .ok_or_else(|| ApiError::not_found("playlist does not exist"))?;
    ensure_owner(&playlist, user.id, "modify this playlist")?;

    let removed = blocking(&state, move |db| {
        db.remove_video_from_playlist(playlist_id, video_id)
    })
    .await?;
    if removed == 0 {
        return Err(ApiError::not_found("video is not in the playlist"));
    }

    Ok(Json(ApiEnvelope::ok(
        serde_json::json!({}),
        "video removed from playlist successfully",
    )))
}

pub async fn update_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(playlist_id): Path<Uuid>,
    Json(req): Json<UpdatePlaylistRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.new_name.trim().is_empty() || req.new_description.trim().is_empty() {
        return Err(ApiError::validation(
            "newName and newDescription are required",
        ));
    }

    let playlist = blocking(&state, move |db| db.get_playlist(playlist_id))
        .await?
        .ok_or_else(|| ApiError::not_found("playlist does not exist"))?;
    ensure_owner(&playlist, user.id, "update this playlist")?;

    let updated = blocking(&state, move |db| {
        db.update_playlist(playlist_id, req.new_name.trim(), req.new_description.trim())?;
        db.get_playlist(playlist_id)
    })
    .await?
    .ok_or_else(|| ApiError::not_found("playlist does not exist"))?;

    Ok(Json(ApiEnvelope::ok(
        updated,
        "playlist updated successfully",
    )))
}

pub async fn delete_playlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(playlist_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let playlist = blocking(&state, move |db| db.get_playlist(playlist_id))
        .await?
        .ok_or_else(|| ApiError::not_found("playlist does not exist"))?;
    ensure_owner(&playlist, user.id, "delete this playlist")?;

    blocking(&state, move |db| db.delete_playlist(playlist_id)).await?;

    Ok(Json(ApiEnvelope::ok(
        serde_json::json!({}),
        "playlist deleted successfully",
    )))
}
