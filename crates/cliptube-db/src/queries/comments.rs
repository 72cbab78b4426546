use anyhow::Result;
use rusqlite::{Connection, params};
use uuid::Uuid;

use cliptube_types::models::{Comment, CommentWithAuthor};

use crate::models::{self, COMMENT_COLS, OWNER_COLS};
use crate::queries::users::{OptionalExt, prefixed};
use crate::{CommentTarget, Database};

impl Database {
    pub fn insert_comment(
        &self,
        id: Uuid,
        owner_id: Uuid,
        content: &str,
        target: CommentTarget,
    ) -> Result<()> {
        let (video_id, tweet_id) = match target {
            CommentTarget::Video(v) => (Some(v.to_string()), None),
            CommentTarget::Tweet(t) => (None, Some(t.to_string())),
        };
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, owner_id, content, video_id, tweet_id) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id.to_string(), owner_id.to_string(), content, video_id, tweet_id],
            )?;
            Ok(())
        })
    }

    pub fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {COMMENT_COLS} FROM comments WHERE id = ?1"))?;
            let row = stmt
                .query_row([id.to_string()], |row| models::comment_at(row, 0))
                .optional()?;
            Ok(row)
        })
    }

    pub fn update_comment(&self, id: Uuid, content: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE comments SET content = ?2 WHERE id = ?1",
                params![id.to_string(), content],
            )?;
            Ok(n)
        })
    }

    pub fn delete_comment(&self, id: Uuid) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM comments WHERE id = ?1", [id.to_string()])?;
            Ok(n)
        })
    }

    pub fn comments_for_video(
        &self,
        video_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<CommentWithAuthor>, u64)> {
        self.with_conn(|conn| comments_for(conn, "video_id", video_id, page, limit))
    }

    pub fn comments_for_tweet(
        &self,
        tweet_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<CommentWithAuthor>, u64)> {
        self.with_conn(|conn| comments_for(conn, "tweet_id", tweet_id, page, limit))
    }
}

/// Paginated comment listing for one parent entity, each comment joined with
/// its author summary. `parent_col` is a compile-time constant, never input.
fn comments_for(
    conn: &Connection,
    parent_col: &str,
    parent_id: Uuid,
    page: u32,
    limit: u32,
) -> Result<(Vec<CommentWithAuthor>, u64)> {
    let parent = parent_id.to_string();

    let total: u64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM comments WHERE {parent_col} = ?1"),
        [&parent],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {}, {} \
         FROM comments c \
         JOIN users u ON u.id = c.owner_id \
         WHERE c.{parent_col} = ?1 \
         ORDER BY c.created_at DESC, c.id \
         LIMIT ?2 OFFSET ?3",
        prefixed(COMMENT_COLS, "c"),
        prefixed(OWNER_COLS, "u"),
    ))?;
    let offset = (page.max(1) - 1) as i64 * limit as i64;
    let rows = stmt
        .query_map(params![parent, limit as i64, offset], |row| {
            Ok(CommentWithAuthor {
                comment: models::comment_at(row, 0)?,
                owner: models::owner_at(row, 6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok((rows, total))
}
