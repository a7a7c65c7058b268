use crate::batch::VideoDownloader;
use crate::error::ApiError;
use crate::log::Log;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Downloads generated videos into a local directory.
pub struct VideoFetcher {
    http: Client,
    output_dir: PathBuf,
    log: Log,
}

impl VideoFetcher {
    pub fn new(output_dir: impl Into<PathBuf>, log: Log) -> Self {
        Self {
            http: Client::new(),
            output_dir: output_dir.into(),
            log,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub async fn download(&self, url: &str, video_id: &str) -> Result<PathBuf, ApiError> {
        self.log.info(format!("Downloading {}...", video_id));
        match self.fetch_to_disk(url, video_id).await {
            Ok(path) => Ok(path),
            Err(err) => {
                self.log.warn(format!("Download of {} failed: {}", video_id, err));
                Err(err)
            }
        }
    }

    async fn fetch_to_disk(&self, url: &str, video_id: &str) -> Result<PathBuf, ApiError> {
        let resp = self.http.get(url).timeout(DOWNLOAD_TIMEOUT).send().await?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let bytes = resp.bytes().await?;

        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = self.output_dir.join(format!("{}_{}.mp4", video_id, stamp));
        fs::create_dir_all(&self.output_dir).await?;
        if let Err(err) = fs::write(&path, &bytes).await {
            let _ = fs::remove_file(&path).await;
            return Err(err.into());
        }

        let size_mb = bytes.len() as f64 / (1024.0 * 1024.0);
        self.log.ok(format!("Saved to: {}", path.display()));
        self.log.info(format!("Size: {:.2} MB", size_mb));
        Ok(path)
    }
}

#[async_trait]
impl VideoDownloader for VideoFetcher {
    async fn download(&self, url: &str, video_id: &str) -> Result<PathBuf, ApiError> {
        VideoFetcher::download(self, url, video_id).await
    }
}
