use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, patch, post};
use axum::Router;
use chrono::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use cliptube_api::assets::{AssetStore, MAX_VIDEO_SIZE};
use cliptube_api::auth::{self, AppState, AppStateInner};
use cliptube_api::middleware::require_auth;
use cliptube_api::tokens::TokenKeys;
use cliptube_api::{comments, dashboard, health, likes, playlists, subscriptions, tweets, users, videos};
use cliptube_db::Database;

/// Runtime configuration, read from the environment with dev defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub asset_host_url: String,
    pub upload_dir: PathBuf,
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env_or("CLIPTUBE_HOST", "0.0.0.0"),
            port: env_or("CLIPTUBE_PORT", "8000").parse()?,
            db_path: PathBuf::from(env_or("CLIPTUBE_DB_PATH", "cliptube.db")),
            asset_host_url: env_or("CLIPTUBE_ASSET_HOST_URL", "http://127.0.0.1:9000"),
            upload_dir: PathBuf::from(env_or("CLIPTUBE_UPLOAD_DIR", "./public/temp")),
            access_secret: env_or("CLIPTUBE_ACCESS_TOKEN_SECRET", "dev-access-secret"),
            refresh_secret: env_or("CLIPTUBE_REFRESH_TOKEN_SECRET", "dev-refresh-secret"),
            access_ttl_minutes: env_or("CLIPTUBE_ACCESS_TOKEN_TTL_MINUTES", "15").parse()?,
            refresh_ttl_days: env_or("CLIPTUBE_REFRESH_TOKEN_TTL_DAYS", "10").parse()?,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

pub fn build_state(config: &Config, db: Database) -> AppState {
    Arc::new(AppStateInner {
        db,
        keys: TokenKeys {
            access_secret: config.access_secret.clone(),
            refresh_secret: config.refresh_secret.clone(),
            access_ttl: Duration::minutes(config.access_ttl_minutes),
            refresh_ttl: Duration::days(config.refresh_ttl_days),
        },
        assets: AssetStore::new(config.asset_host_url.clone()),
        upload_dir: config.upload_dir.clone(),
        started_at: Instant::now(),
    })
}

/// The full application router under `/api/v1`.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/healthcheck", get(health::healthcheck))
        .route("/users/register", post(auth::register))
        .route("/users/login", post(auth::login))
        .route("/users/refresh-token", post(auth::refresh_token))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/users/logout", post(auth::logout))
        .route("/users/current-user", get(users::current_user))
        .route("/users/change-password", post(users::change_password))
        .route("/users/update-account", patch(users::update_account))
        .route("/users/avatar", patch(users::update_avatar))
        .route("/users/cover-image", patch(users::update_cover_image))
        .route("/users/c/{username}", get(users::channel_profile))
        .route("/users/history", get(users::watch_history))
        .route(
            "/videos",
            get(videos::get_all_videos).post(videos::publish_video),
        )
        .route(
            "/videos/{video_id}",
            get(videos::get_video_by_id)
                .patch(videos::update_video_details)
                .delete(videos::delete_video),
        )
        .route(
            "/videos/toggle/publish/{video_id}",
            patch(videos::toggle_publish_status),
        )
        .route("/playlist", post(playlists::create_playlist))
        .route(
            "/playlist/{playlist_id}",
            get(playlists::get_playlist_by_id)
                .patch(playlists::update_playlist)
                .delete(playlists::delete_playlist),
        )
        .route(
            "/playlist/add/{playlist_id}/{video_id}",
            patch(playlists::add_video_to_playlist),
        )
        .route(
            "/playlist/remove/{playlist_id}/{video_id}",
            patch(playlists::remove_video_from_playlist),
        )
        .route("/playlist/user/{user_id}", get(playlists::get_user_playlists))
        .route(
            "/subscriptions/c/{channel_id}",
            post(subscriptions::toggle_subscription).get(subscriptions::get_channel_subscribers),
        )
        .route(
            "/subscriptions/u/{subscriber_id}",
            get(subscriptions::get_subscribed_channels),
        )
        .route("/tweets", post(tweets::create_tweet))
        .route("/tweets/user/{user_id}", get(tweets::get_user_tweets))
        .route(
            "/tweets/{tweet_id}",
            patch(tweets::update_tweet).delete(tweets::delete_tweet),
        )
        .route(
            "/comments/video/{video_id}",
            get(comments::get_video_comments).post(comments::add_video_comment),
        )
        .route(
            "/comments/tweet/{tweet_id}",
            get(comments::get_tweet_comments).post(comments::add_tweet_comment),
        )
        .route(
            "/comments/{comment_id}",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
        .route("/likes/toggle/v/{video_id}", post(likes::toggle_video_like))
        .route(
            "/likes/toggle/c/{comment_id}",
            post(likes::toggle_comment_like),
        )
        .route("/likes/toggle/t/{tweet_id}", post(likes::toggle_tweet_like))
        .route("/likes/videos", get(likes::get_liked_videos))
        .route("/dashboard/stats", get(dashboard::get_channel_stats))
        .route("/dashboard/videos", get(dashboard::get_channel_videos))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    Router::new()
        .nest("/api/v1", public.merge(protected))
        // Raised from axum's 2 MB default so video uploads fit.
        .layer(DefaultBodyLimit::max(MAX_VIDEO_SIZE + 1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
