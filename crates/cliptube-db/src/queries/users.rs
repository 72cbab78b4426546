use anyhow::Result;
use rusqlite::params;
use uuid::Uuid;

use cliptube_types::models::{ChannelProfile, VideoWithOwner};

use crate::Database;
use crate::models::{self, OWNER_COLS, USER_COLS, UserRow, VIDEO_COLS, VideoRow};

/// Everything needed to create a user record. The password is already hashed
/// and the asset ids come back from the asset host at upload time.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub full_name: &'a str,
    pub password_hash: &'a str,
    pub avatar_url: &'a str,
    pub avatar_asset_id: &'a str,
    pub cover_image: Option<(&'a str, &'a str)>,
}

impl Database {
    pub fn create_user(&self, new: &NewUser) -> Result<()> {
        self.with_conn(|conn| {
            let (cover_url, cover_asset_id) = match new.cover_image {
                Some((url, asset_id)) => (Some(url), Some(asset_id)),
                None => (None, None),
            };
            conn.execute(
                "INSERT INTO users (id, username, email, full_name, password, avatar_url, \
                 avatar_asset_id, cover_image_url, cover_image_asset_id) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    new.id.to_string(),
                    new.username,
                    new.email,
                    new.full_name,
                    new.password_hash,
                    new.avatar_url,
                    new.avatar_asset_id,
                    cover_url,
                    cover_asset_id,
                ],
            )?;
            Ok(())
        })
    }

    pub fn identity_taken(&self, username: &str, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM users WHERE username = ?1 OR email = ?2",
                params![username, email],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        })
    }

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLS} FROM users WHERE id = ?1"))?;
            let row = stmt
                .query_row([id.to_string()], UserRow::from_row)
                .optional()?;
            Ok(row)
        })
    }

    /// Login lookup: either identifier may be absent; a NULL bind never
    /// matches.
    pub fn get_user_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLS} FROM users WHERE username = ?1 OR email = ?2"
            ))?;
            let row = stmt
                .query_row(params![username, email], UserRow::from_row)
                .optional()?;
            Ok(row)
        })
    }

    /// Persist (or clear, with None) the single active refresh token.
    pub fn set_refresh_token(&self, user_id: Uuid, token: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE users SET refresh_token = ?2 WHERE id = ?1",
                params![user_id.to_string(), token],
            )?;
            Ok(())
        })
    }

    pub fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET password = ?2 WHERE id = ?1",
                params![user_id.to_string(), password_hash],
            )?;
            Ok(n)
        })
    }

    pub fn update_account(&self, user_id: Uuid, full_name: &str, email: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET full_name = ?2, email = ?3 WHERE id = ?1",
                params![user_id.to_string(), full_name, email],
            )?;
            Ok(n)
        })
    }

    pub fn update_avatar(&self, user_id: Uuid, url: &str, asset_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET avatar_url = ?2, avatar_asset_id = ?3 WHERE id = ?1",
                params![user_id.to_string(), url, asset_id],
            )?;
            Ok(n)
        })
    }

    pub fn update_cover_image(&self, user_id: Uuid, url: &str, asset_id: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE users SET cover_image_url = ?2, cover_image_asset_id = ?3 WHERE id = ?1",
                params![user_id.to_string(), url, asset_id],
            )?;
            Ok(n)
        })
    }

    /// Channel view of a user: subscriber counts plus whether the viewer
    /// subscribes to this channel, in one query.
    pub fn channel_profile(&self, username: &str, viewer: Uuid) -> Result<Option<ChannelProfile>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.username, u.full_name, u.email, u.avatar_url, u.cover_image_url, \
                    (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id), \
                    (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id), \
                    EXISTS(SELECT 1 FROM subscriptions s \
                           WHERE s.channel_id = u.id AND s.subscriber_id = ?2) \
                 FROM users u WHERE u.username = ?1",
            )?;
            let profile = stmt
                .query_row(params![username, viewer.to_string()], |row| {
                    Ok(ChannelProfile {
                        id: models::uuid_col(row, 0)?,
                        username: row.get(1)?,
                        full_name: row.get(2)?,
                        email: row.get(3)?,
                        avatar: row.get(4)?,
                        cover_image: row.get(5)?,
                        subscribers_count: row.get(6)?,
                        channel_subscribed_to_count: row.get(7)?,
                        is_subscribed: row.get(8)?,
                    })
                })
                .optional()?;
            Ok(profile)
        })
    }

    /// Re-watching replaces the row, which pushes the video to the end of the
    /// history.
    pub fn record_watch(&self, user_id: Uuid, video_id: Uuid) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO watch_history (user_id, video_id) VALUES (?1, ?2)",
                params![user_id.to_string(), video_id.to_string()],
            )?;
            Ok(())
        })
    }

    /// Watch history in watch order, each entry joined with its owner summary.
    pub fn watch_history(&self, user_id: Uuid) -> Result<Vec<VideoWithOwner>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {}, {} \
                 FROM watch_history wh \
                 JOIN videos v ON v.id = wh.video_id \
                 JOIN users u ON u.id = v.owner_id \
                 WHERE wh.user_id = ?1 \
                 ORDER BY wh.seq",
                prefixed(VIDEO_COLS, "v"),
                prefixed(OWNER_COLS, "u"),
            ))?;
            let rows = stmt
                .query_map([user_id.to_string()], |row| {
                    Ok(VideoWithOwner {
                        video: VideoRow::at(row, 0)?.into_video(),
                        owner: models::owner_at(row, 12)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

/// Prefix each column in a comma-separated list with a table alias.
pub(crate) fn prefixed(cols: &str, alias: &str) -> String {
    cols.split(',')
        .map(|c| format!("{}.{}", alias, c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
