use anyhow::Result;
use rusqlite::params;
use uuid::Uuid;

use cliptube_types::models::{Playlist, PlaylistWithVideos, Video};

use crate::Database;
use crate::models::{PLAYLIST_COLS, VIDEO_COLS, VideoRow, playlist_from_row};
use crate::queries::users::{OptionalExt, prefixed};

impl Database {
    pub fn create_playlist(
        &self,
        id: Uuid,
        owner_id: Uuid,
        name: &str,
        description: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO playlists (id, owner_id, name, description) VALUES (?1, ?2, ?3, ?4)",
                params![id.to_string(), owner_id.to_string(), name, description],
            )?;
            Ok(())
        })
    }

    pub fn get_playlist(&self, id: Uuid) -> Result<Option<Playlist>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {PLAYLIST_COLS} FROM playlists WHERE id = ?1"))?;
            let row = stmt
                .query_row([id.to_string()], playlist_from_row)
                .optional()?;
            Ok(row)
        })
    }

    /// All of a user's playlists with their member videos inlined in playlist
    /// order.
    pub fn playlists_by_owner(&self, owner_id: Uuid) -> Result<Vec<PlaylistWithVideos>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PLAYLIST_COLS} FROM playlists WHERE owner_id = ?1 ORDER BY created_at"
            ))?;
            let playlists = stmt
                .query_map([owner_id.to_string()], playlist_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            let mut videos_stmt = conn.prepare(&format!(
                "SELECT {} \
                 FROM playlist_videos pv \
                 JOIN videos v ON v.id = pv.video_id \
                 WHERE pv.playlist_id = ?1 \
                 ORDER BY pv.position",
                prefixed(VIDEO_COLS, "v"),
            ))?;

            let mut out = Vec::with_capacity(playlists.len());
            for playlist in playlists {
                let videos = videos_stmt
                    .query_map([playlist.id.to_string()], |row| {
                        Ok(VideoRow::from_row(row)?.into_video())
                    })?
                    .collect::<std::result::Result<Vec<Video>, _>>()?;
                out.push(PlaylistWithVideos { playlist, videos });
            }
            Ok(out)
        })
    }

    pub fn playlist_contains(&self, playlist_id: Uuid, video_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM playlist_videos WHERE playlist_id = ?1 AND video_id = ?2",
                params![playlist_id.to_string(), video_id.to_string()],
                |row| row.get(0),
            )?;
            Ok(n > 0)
        })
    }

    /// Appends at the end of the playlist. The primary key rejects duplicate
    /// membership.
    pub fn add_video_to_playlist(&self, playlist_id: Uuid, video_id: Uuid) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO playlist_videos (playlist_id, video_id, position) \
                 VALUES (?1, ?2, \
                    COALESCE((SELECT MAX(position) + 1 FROM playlist_videos \
                              WHERE playlist_id = ?1), 0))",
                params![playlist_id.to_string(), video_id.to_string()],
            )?;
            Ok(())
        })
    }

    pub fn remove_video_from_playlist(&self, playlist_id: Uuid, video_id: Uuid) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM playlist_videos WHERE playlist_id = ?1 AND video_id = ?2",
                params![playlist_id.to_string(), video_id.to_string()],
            )?;
            Ok(n)
        })
    }

    pub fn update_playlist(&self, id: Uuid, name: &str, description: &str) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE playlists SET name = ?2, description = ?3 WHERE id = ?1",
                params![id.to_string(), name, description],
            )?;
            Ok(n)
        })
    }

    pub fn delete_playlist(&self, id: Uuid) -> Result<usize> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM playlists WHERE id = ?1", [id.to_string()])?;
            Ok(n)
        })
    }
}
