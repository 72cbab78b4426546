use anyhow::Result;
use rusqlite::params;
use uuid::Uuid;

use cliptube_types::models::Video;

use crate::Database;
use crate::models::{VIDEO_COLS, VideoRow};
use crate::queries::users::OptionalExt;

#[derive(Debug)]
pub struct NewVideo<'a> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub video_url: &'a str,
    pub video_asset_id: &'a str,
    pub thumbnail_url: &'a str,
    pub thumbnail_asset_id: &'a str,
    pub duration: f64,
    pub is_published: bool,
}

/// Sort columns accepted by the paginated search. Anything else falls back to
/// creation time, so the column name is never interpolated from user input.
fn sort_column(requested: Option<&str>) -> &'static str {
    match requested {
        Some("views") => "views",
        Some("duration") => "duration",
        Some("title") => "title",
        _ => "created_at",
    }
}

impl Database {
    pub fn insert_video(&self, new: &NewVideo) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO videos (id, owner_id, title, description, video_url, \
                 video_asset_id, thumbnail_url, thumbnail_asset_id, duration, is_published) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    new.id.to_string(),
                    new.owner_id.to_string(),
                    new.title,
                    new.description,
                    new.video_url,
                    new.video_asset_id,
                    new.thumbnail_url,
                    new.thumbnail_asset_id,
                    new.duration,
                    new.is_published,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_video(&self, id: Uuid) -> Result<Option<VideoRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {VIDEO_COLS} FROM videos WHERE id = ?1"))?;
            let row = stmt
                .query_row([id.to_string()], VideoRow::from_row)
                .optional()?;
            Ok(row)
        })
    }

    pub fn increment_views(&self, id: Uuid) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE videos SET views = views + 1 WHERE id = ?1",
                [id.to_string()],
            )?;
            Ok(())
        })
    }

    /// Partial update: absent fields keep their stored value.
    pub fn update_video_details(
        &self,
        id: Uuid,
        title: Option<&str>,
        description: Option<&str>,
        thumbnail: Option<(&str, &str)>,
    ) -> Result<usize> {
        self.with_conn(|conn| {
            let (thumb_url, thumb_asset_id) = match thumbnail {
                Some((url, asset_id)) => (Some(url), Some(asset_id)),
                None => (None, None),
            };
            let n = conn.execute(
                "UPDATE videos SET \
                    title = COALESCE(?2, title), \
                    description = COALESCE(?3, description), \
                    thumbnail_url = COALESCE(?4, thumbnail_url), \
                    thumbnail_asset_id = COALESCE(?5, thumbnail_asset_id) \
                 WHERE id = ?1",
                params![id.to_string(), title, description, thumb_url, thumb_asset_id],
            )?;
            Ok(n)
        })
    }

    pub fn set_publish_status(&self, id: Uuid, published: bool) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE videos SET is_published = ?2 WHERE id = ?1",
                params![id.to_string(), published],
            )?;
            Ok(n)
        })
    }

    pub fn delete_video(&self, id: Uuid) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM videos WHERE id = ?1", [id.to_string()])?;
            Ok(n)
        })
    }

    /// Paginated search: optional owner filter, case-insensitive substring
    /// match on title or description, whitelisted sort column. LIMIT/OFFSET
    /// are part of the query itself, so only one page is ever materialized.
    pub fn search_videos(
        &self,
        owner: Option<Uuid>,
        query: Option<&str>,
        sort_by: Option<&str>,
        ascending: bool,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Video>, u64)> {
        self.with_conn(|conn| {
            let owner = owner.map(|o| o.to_string());
            let filter = "WHERE (?1 IS NULL OR owner_id = ?1) \
                 AND (?2 IS NULL OR title LIKE '%' || ?2 || '%' \
                      OR description LIKE '%' || ?2 || '%')";

            let total: u64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM videos {filter}"),
                params![owner, query],
                |row| row.get(0),
            )?;

            let direction = if ascending { "ASC" } else { "DESC" };
            let mut stmt = conn.prepare(&format!(
                "SELECT {VIDEO_COLS} FROM videos {filter} \
                 ORDER BY {} {} LIMIT ?3 OFFSET ?4",
                sort_column(sort_by),
                direction,
            ))?;
            let offset = (page.max(1) - 1) as i64 * limit as i64;
            let rows = stmt
                .query_map(params![owner, query, limit as i64, offset], |row| {
                    Ok(VideoRow::from_row(row)?.into_video())
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total))
        })
    }

    pub fn videos_by_owner(&self, owner: Uuid) -> Result<Vec<Video>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {VIDEO_COLS} FROM videos WHERE owner_id = ?1 ORDER BY created_at DESC"
            ))?;
            let rows = stmt
                .query_map([owner.to_string()], |row| {
                    Ok(VideoRow::from_row(row)?.into_video())
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
