use anyhow::Result;
use rusqlite::params;
use uuid::Uuid;

use cliptube_types::models::VideoWithOwner;

use crate::models::{self, OWNER_COLS, VIDEO_COLS, VideoRow};
use crate::queries::users::{OptionalExt, prefixed};
use crate::{Database, LikeTarget};

impl Database {
    /// Toggle a like: removes the row if present, inserts it otherwise.
    /// Returns true when the like was added. The check and the branch run in
    /// one transaction; the partial unique index on (liked_by, target) is the
    /// arbiter if two toggles race.
    pub fn toggle_like(&self, id: Uuid, user_id: Uuid, target: LikeTarget) -> Result<bool> {
        let (col, target_id) = match target {
            LikeTarget::Video(v) => ("video_id", v.to_string()),
            LikeTarget::Comment(c) => ("comment_id", c.to_string()),
            LikeTarget::Tweet(t) => ("tweet_id", t.to_string()),
        };
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let existing: Option<String> = tx
                .query_row(
                    &format!("SELECT id FROM likes WHERE liked_by = ?1 AND {col} = ?2"),
                    params![user_id.to_string(), target_id],
                    |row| row.get(0),
                )
                .optional()?;

            let added = match existing {
                Some(existing_id) => {
                    tx.execute("DELETE FROM likes WHERE id = ?1", [&existing_id])?;
                    false
                }
                None => {
                    tx.execute(
                        &format!("INSERT INTO likes (id, liked_by, {col}) VALUES (?1, ?2, ?3)"),
                        params![id.to_string(), user_id.to_string(), target_id],
                    )?;
                    true
                }
            };

            tx.commit()?;
            Ok(added)
        })
    }

    /// All videos the user has liked, flattened to video documents with the
    /// owner summary inlined.
    pub fn liked_videos(&self, user_id: Uuid) -> Result<Vec<VideoWithOwner>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {}, {} \
                 FROM likes l \
                 JOIN videos v ON v.id = l.video_id \
                 JOIN users u ON u.id = v.owner_id \
                 WHERE l.liked_by = ?1 AND l.video_id IS NOT NULL \
                 ORDER BY l.created_at DESC, l.id",
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

    pub fn like_count_for_video(&self, video_id: Uuid) -> Result<i64> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM likes WHERE video_id = ?1",
                [video_id.to_string()],
                |row| row.get(0),
            )?;
            Ok(n)
        })
    }
}
