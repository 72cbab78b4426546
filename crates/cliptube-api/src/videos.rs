use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use cliptube_db::queries::videos::NewVideo;
use cliptube_types::api::{ApiEnvelope, Paginated, VideoListQuery};
use cliptube_types::models::Video;

use crate::assets::{AssetKind, MAX_IMAGE_SIZE, MAX_VIDEO_SIZE, stage_upload};
use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::multipart::FormData;
use crate::ownership::ensure_owner;
use crate::blocking;

/// Pages are capped so a single request can never drain the table.
const MAX_PAGE_SIZE: u32 = 100;

/// Paginated, filtered, sorted video listing. Without an explicit userId the
/// listing scopes to the caller's own channel, published or not.
pub async fn get_all_videos(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(params): Query<VideoListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let owner = params.user_id.unwrap_or(user.id);
    if owner != user.id
        && blocking(&state, move |db| db.get_user_by_id(owner))
            .await?
            .is_none()
    {
        return Err(ApiError::not_found("user does not exist"));
    }
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, MAX_PAGE_SIZE);
    let ascending = params.sort_type != Some(-1);

    let (videos, total) = blocking(&state, move |db| {
        db.search_videos(
            Some(owner),
            params.query.as_deref(),
            params.sort_by.as_deref(),
            ascending,
            page,
            limit,
        )
    })
    .await?;

    Ok(Json(ApiEnvelope::ok(
        Paginated::new(videos, total, page, limit),
        "videos fetched successfully",
    )))
}

/// Upload and publish a video. Multipart form: title and description text
/// fields, videoFile and thumbnail file parts. The asset host measures the
/// duration.
pub async fn publish_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = FormData::read(multipart).await?;
    let title = form.require_text("title")?.trim().to_string();
    let description = form.require_text("description")?.trim().to_string();
    let is_published = match form.text("isPublished") {
        Some(raw) => raw
            .parse::<bool>()
            .map_err(|_| ApiError::validation("isPublished must be true or false"))?,
        None => true,
    };

    let video_bytes = form.require_file("videoFile")?;
    if video_bytes.len() > MAX_VIDEO_SIZE {
        return Err(ApiError::validation("video file is too large"));
    }
    let thumb_bytes = form.require_file("thumbnail")?;
    if thumb_bytes.len() > MAX_IMAGE_SIZE {
        return Err(ApiError::validation("thumbnail file is too large"));
    }

    let video_path = stage_upload(&state.upload_dir, video_bytes).await?;
    let video_asset = state.assets.upload(&video_path, AssetKind::Video).await?;
    let thumb_path = stage_upload(&state.upload_dir, thumb_bytes).await?;
    let thumb_asset = state.assets.upload(&thumb_path, AssetKind::Image).await?;

    let duration = video_asset.duration.unwrap_or_default();
    let video_id = Uuid::new_v4();

    {
        let (title, description) = (title.clone(), description.clone());
        let (video_asset, thumb_asset) = (video_asset.clone(), thumb_asset.clone());
        blocking(&state, move |db| {
            db.insert_video(&NewVideo {
                id: video_id,
                owner_id: user.id,
                title: &title,
                description: &description,
                video_url: &video_asset.url,
                video_asset_id: &video_asset.asset_id,
                thumbnail_url: &thumb_asset.url,
                thumbnail_asset_id: &thumb_asset.asset_id,
                duration,
                is_published,
            })
        })
        .await?;
    }

    info!("user {} published video {}", user.username, video_id);
    let video = Video {
        id: video_id,
        owner_id: user.id,
        title,
        description,
        video_file: video_asset.url,
        thumbnail: thumb_asset.url,
        duration,
        views: 0,
        is_published,
        created_at: Utc::now(),
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::created(video, "video published successfully")),
    ))
}

/// Fetch one video. Counts the view and records it in the viewer's watch
/// history as a side effect.
pub async fn get_video_by_id(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let video = blocking(&state, move |db| {
        let Some(row) = db.get_video(video_id)? else {
            return Ok(None);
        };
        db.increment_views(video_id)?;
        db.record_watch(user.id, video_id)?;
        Ok(Some(row))
    })
    .await?
    .ok_or_else(|| ApiError::not_found("video does not exist"))?;

    let mut video = video.into_video();
    video.views += 1;
    Ok(Json(ApiEnvelope::ok(video, "video fetched successfully")))
}

/// Partial update of title, description, and/or thumbnail. At least one field
/// must be present.
pub async fn update_video_details(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = FormData::read(multipart).await?;
    let title = form.text("title").map(str::trim).filter(|t| !t.is_empty());
    let description = form
        .text("description")
        .map(str::trim)
        .filter(|d| !d.is_empty());
    let thumb_bytes = form.file("thumbnail");

    if title.is_none() && description.is_none() && thumb_bytes.is_none() {
        return Err(ApiError::validation(
            "at least one of title, description, or thumbnail is required",
        ));
    }

    let row = blocking(&state, move |db| db.get_video(video_id))
        .await?
        .ok_or_else(|| ApiError::not_found("video does not exist"))?;
    ensure_owner(&row, user.id, "update this video")?;

    let new_thumbnail = match thumb_bytes {
        Some(bytes) => {
            if bytes.len() > MAX_IMAGE_SIZE {
                return Err(ApiError::validation("thumbnail file is too large"));
            }
            let staged = stage_upload(&state.upload_dir, bytes).await?;
            Some(state.assets.upload(&staged, AssetKind::Image).await?)
        }
        None => None,
    };

    let updated = {
        let (title, description) = (title.map(String::from), description.map(String::from));
        let new_thumbnail = new_thumbnail.clone();
        blocking(&state, move |db| {
            db.update_video_details(
                video_id,
                title.as_deref(),
                description.as_deref(),
                new_thumbnail
                    .as_ref()
                    .map(|t| (t.url.as_str(), t.asset_id.as_str())),
            )?;
            db.get_video(video_id)
        })
        .await?
        .ok_or_else(|| ApiError::not_found("video does not exist"))?
    };

    if new_thumbnail.is_some() {
        if let Err(e) = state.assets.delete(&row.thumbnail_asset_id).await {
            warn!(
                "failed to delete replaced thumbnail {}: {:#}",
                row.thumbnail_asset_id, e
            );
        }
    }

    Ok(Json(ApiEnvelope::ok(
        updated.into_video(),
        "video details updated successfully",
    )))
}

/// Delete a video with its assets. Dependent comments, likes, playlist
/// entries, and history rows cascade in storage.
pub async fn delete_video(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = blocking(&state, move |db| db.get_video(video_id))
        .await?
        .ok_or_else(|| ApiError::not_found("video does not exist"))?;
    ensure_owner(&row, user.id, "delete this video")?;

    for asset_id in [&row.video_asset_id, &row.thumbnail_asset_id] {
        if let Err(e) = state.assets.delete(asset_id).await {
            warn!("failed to delete asset {}: {:#}", asset_id, e);
        }
    }

    let deleted = blocking(&state, move |db| db.delete_video(video_id)).await?;
    if deleted == 0 {
        return Err(ApiError::not_found("video does not exist"));
    }

    info!("user {} deleted video {}", user.username, video_id);
    Ok(Json(ApiEnvelope::ok(
        serde_json::json!({}),
        "video deleted successfully",
    )))
}

pub async fn toggle_publish_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(video_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let row = blocking(&state, move |db| db.get_video(video_id))
        .await?
        .ok_or_else(|| ApiError::not_found("video does not exist"))?;
    ensure_owner(&row, user.id, "change this video's publish status")?;

    let next = !row.is_published;
    blocking(&state, move |db| db.set_publish_status(video_id, next)).await?;

    Ok(Json(ApiEnvelope::ok(
        serde_json::json!({ "isPublished": next }),
        "publish status toggled successfully",
    )))
}
