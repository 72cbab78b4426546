use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::User;

// -- JWT claims --

/// Access-token claims. Canonical definition lives here so the REST middleware
/// and the token issuer agree on the shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub exp: usize,
}

/// Refresh-token claims carry only the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: Uuid,
    pub exp: usize,
}

// -- Response envelope --

/// Every success body is `{statuscode, message, data, success}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub statuscode: u16,
    pub message: String,
    pub data: T,
    pub success: bool,
}

impl<T> ApiEnvelope<T> {
    pub fn new(statuscode: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            statuscode,
            message: message.into(),
            data,
            success: statuscode < 400,
        }
    }

    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(200, message, data)
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(201, message, data)
    }
}

/// Paginated list body. `total_pages` rounds up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub docs: Vec<T>,
    pub total_docs: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl<T> Paginated<T> {
    pub fn new(docs: Vec<T>, total_docs: u64, page: u32, limit: u32) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total_docs.div_ceil(limit as u64) as u32
        };
        Self {
            docs,
            total_docs,
            page,
            limit,
            total_pages,
        }
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// Body fallback for clients that do not hold the refresh cookie.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateAccountRequest {
    pub full_name: String,
    pub email: String,
}

// -- Tweets --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateTweetRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateTweetRequest {
    pub new_content: String,
}

// -- Playlists --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePlaylistRequest {
    pub new_name: String,
    pub new_description: String,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddCommentRequest {
    pub comment: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateCommentRequest {
    pub new_content: String,
}

// -- List queries --

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

/// Query parameters for the paginated video search.
/// `sort_type` follows the original API: 1 ascending, -1 descending.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<i32>,
    pub user_id: Option<Uuid>,
}

// -- Health --

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub uptime_secs: u64,
    pub message: String,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_success_tracks_statuscode() {
        let ok = ApiEnvelope::ok((), "fine");
        assert!(ok.success);
        let err = ApiEnvelope::new(404, "missing", ());
        assert!(!err.success);
    }

    #[test]
    fn paginated_rounds_pages_up() {
        let page = Paginated::new(vec![1, 2, 3], 31, 1, 10);
        assert_eq!(page.total_pages, 4);
        let exact = Paginated::<i32>::new(vec![], 30, 1, 10);
        assert_eq!(exact.total_pages, 3);
    }
}
