use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

/// 10 MB cap for avatar/cover/thumbnail images.
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;
/// 200 MB cap for video files.
pub const MAX_VIDEO_SIZE: usize = 200 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Video,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

/// What the asset host hands back at upload time. The asset id is stored
/// first-class and reused verbatim for deletion; it is never re-derived from
/// the URL.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub asset_id: String,
    pub url: String,
    /// Seconds; the host derives this for videos.
    pub duration: Option<f64>,
}

/// Bridge to the external media host. Uploads block the request that
/// triggered them; failures surface immediately, no retries.
#[derive(Debug, Clone)]
pub struct AssetStore {
    client: reqwest::Client,
    base_url: String,
}

impl AssetStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Upload a staged file; the staging file is removed on success and on
    /// failure, mirroring the hand-off contract of the upload middleware.
    pub async fn upload(&self, local_path: &Path, kind: AssetKind) -> Result<UploadedAsset> {
        let bytes = tokio::fs::read(local_path).await?;
        let result = self.send_upload(bytes, kind).await;

        if let Err(e) = tokio::fs::remove_file(local_path).await {
            warn!("failed to remove staging file {}: {}", local_path.display(), e);
        }

        result
    }

    async fn send_upload(&self, bytes: Vec<u8>, kind: AssetKind) -> Result<UploadedAsset> {
        let response = self
            .client
            .post(format!("{}/upload?kind={}", self.base_url, kind.as_str()))
            .header("content-type", "application/octet-stream")
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            bail!("asset host rejected upload: {}", response.status());
        }

        let asset: UploadedAsset = response.json().await?;
        info!("uploaded {} asset {}", kind.as_str(), asset.asset_id);
        Ok(asset)
    }

    /// Delete by the stored asset id. A missing asset is not an error; the
    /// host may have cleaned it up already.
    pub async fn delete(&self, asset_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(format!("{}/assets/{}", self.base_url, asset_id))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            warn!("asset {} already gone at host", asset_id);
            return Ok(());
        }
        if !response.status().is_success() {
            bail!("asset host rejected delete: {}", response.status());
        }
        Ok(())
    }
}

/// Stage an uploaded blob on local disk before handing it to the asset host.
pub async fn stage_upload(dir: &Path, data: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(Uuid::new_v4().to_string());
    tokio::fs::write(&path, data).await?;
    Ok(path)
}
