use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use uuid::Uuid;

use cliptube_types::models::{Comment, OwnerSummary, Playlist, Tweet, User, Video};

/// Internal user row: carries the password hash and stored refresh token,
/// which never leave the db/api boundary.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub avatar_url: String,
    pub avatar_asset_id: String,
    pub cover_image_url: Option<String>,
    pub cover_image_asset_id: Option<String>,
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub const USER_COLS: &str = "id, username, email, full_name, password, avatar_url, \
     avatar_asset_id, cover_image_url, cover_image_asset_id, refresh_token, created_at";

impl UserRow {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: uuid_col(row, 0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            full_name: row.get(3)?,
            password: row.get(4)?,
            avatar_url: row.get(5)?,
            avatar_asset_id: row.get(6)?,
            cover_image_url: row.get(7)?,
            cover_image_asset_id: row.get(8)?,
            refresh_token: row.get(9)?,
            created_at: time_col(row, 10)?,
        })
    }

    /// Sanitized wire view: no password, no refresh token, no asset ids.
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            full_name: self.full_name,
            avatar: self.avatar_url,
            cover_image: self.cover_image_url,
            created_at: self.created_at,
        }
    }
}

/// Internal video row: keeps the asset ids needed for deletion at the host.
#[derive(Debug, Clone)]
pub struct VideoRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub video_asset_id: String,
    pub thumbnail_url: String,
    pub thumbnail_asset_id: String,
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

pub const VIDEO_COLS: &str = "id, owner_id, title, description, video_url, video_asset_id, \
     thumbnail_url, thumbnail_asset_id, duration, views, is_published, created_at";

impl VideoRow {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Self::at(row, 0)
    }

    pub fn at(row: &Row, base: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: uuid_col(row, base)?,
            owner_id: uuid_col(row, base + 1)?,
            title: row.get(base + 2)?,
            description: row.get(base + 3)?,
            video_url: row.get(base + 4)?,
            video_asset_id: row.get(base + 5)?,
            thumbnail_url: row.get(base + 6)?,
            thumbnail_asset_id: row.get(base + 7)?,
            duration: row.get(base + 8)?,
            views: row.get(base + 9)?,
            is_published: row.get(base + 10)?,
            created_at: time_col(row, base + 11)?,
        })
    }

    pub fn into_video(self) -> Video {
        Video {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            video_file: self.video_url,
            thumbnail: self.thumbnail_url,
            duration: self.duration,
            views: self.views,
            is_published: self.is_published,
            created_at: self.created_at,
        }
    }
}

// Wire-type row mappers for joined reads. Column order must match the SELECT
// lists in the query modules.

pub const OWNER_COLS: &str = "id, username, full_name, avatar_url";

pub fn owner_at(row: &Row, base: usize) -> rusqlite::Result<OwnerSummary> {
    Ok(OwnerSummary {
        id: uuid_col(row, base)?,
        username: row.get(base + 1)?,
        full_name: row.get(base + 2)?,
        avatar: row.get(base + 3)?,
    })
}

pub const COMMENT_COLS: &str = "id, owner_id, content, video_id, tweet_id, created_at";

pub fn comment_at(row: &Row, base: usize) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: uuid_col(row, base)?,
        owner_id: uuid_col(row, base + 1)?,
        content: row.get(base + 2)?,
        video_id: opt_uuid_col(row, base + 3)?,
        tweet_id: opt_uuid_col(row, base + 4)?,
        created_at: time_col(row, base + 5)?,
    })
}

pub const TWEET_COLS: &str = "id, owner_id, content, created_at";

pub fn tweet_from_row(row: &Row) -> rusqlite::Result<Tweet> {
    Ok(Tweet {
        id: uuid_col(row, 0)?,
        owner_id: uuid_col(row, 1)?,
        content: row.get(2)?,
        created_at: time_col(row, 3)?,
    })
}

pub const PLAYLIST_COLS: &str = "id, owner_id, name, description, created_at";

pub fn playlist_from_row(row: &Row) -> rusqlite::Result<Playlist> {
    Ok(Playlist {
        id: uuid_col(row, 0)?,
        owner_id: uuid_col(row, 1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: time_col(row, 4)?,
    })
}

// -- Column helpers --

pub(crate) fn uuid_col(row: &Row, idx: usize) -> rusqlite::Result<Uuid> {
    let s: String = row.get(idx)?;
    s.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn opt_uuid_col(row: &Row, idx: usize) -> rusqlite::Result<Option<Uuid>> {
    let s: Option<String> = row.get(idx)?;
    match s {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))),
    }
}

/// SQLite's datetime('now') stores "YYYY-MM-DD HH:MM:SS" without a timezone;
/// parse as naive UTC, with RFC 3339 as a fallback.
pub(crate) fn time_col(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .or_else(|_| s.parse::<DateTime<Utc>>())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
