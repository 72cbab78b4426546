pub mod assets;
pub mod auth;
pub mod comments;
pub mod dashboard;
pub mod error;
pub mod health;
pub mod likes;
pub mod middleware;
pub mod multipart;
pub mod ownership;
pub mod playlists;
pub mod subscriptions;
pub mod tokens;
pub mod tweets;
pub mod users;
pub mod videos;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;

use cliptube_db::Database;
use tracing::error;

/// Run a blocking database closure off the async runtime.
/// All rusqlite work goes through here.
pub async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::internal("background task failed")
        })?
        .map_err(ApiError::from)
}
