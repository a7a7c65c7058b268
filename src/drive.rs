//! Google Drive transfers against a single configured folder.
//!
//! Both directions authenticate with a service account taken from
//! `GOOGLE_CREDENTIALS`; the credential is validated when the client is built,
//! so a bad configuration fails before any request goes out.

use crate::config::Config;
use crate::error::{ConfigError, DriveError};
use crate::log::Log;
use crate::media::list_with_extension;
use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const VIDEO_MIME: &str = "video/mp4";
const PAGE_SIZE: &str = "100";
const BODY_SNIPPET_CHARS: usize = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveScope {
    ReadOnly,
    File,
}

impl DriveScope {
    pub fn url(self) -> &'static str {
        match self {
            DriveScope::ReadOnly => "https://www.googleapis.com/auth/drive.readonly",
            DriveScope::File => "https://www.googleapis.com/auth/drive.file",
        }
    }
}

#[async_trait]
pub trait AccessToken: Send + Sync {
    async fn bearer(&self) -> Result<String, DriveError>;
}

pub struct ServiceAccountToken {
    account: CustomServiceAccount,
    scope: DriveScope,
}

impl ServiceAccountToken {
    pub fn from_json(json: &str, scope: DriveScope) -> Result<Self, ConfigError> {
        if json.trim().is_empty() {
            return Err(ConfigError::missing(crate::config::GOOGLE_CREDENTIALS));
        }
        let account = CustomServiceAccount::from_json(json)
            .map_err(|e| ConfigError::InvalidCredential(e.to_string()))?;
        Ok(Self { account, scope })
    }
}

#[async_trait]
impl AccessToken for ServiceAccountToken {
    async fn bearer(&self) -> Result<String, DriveError> {
        let token = self
            .account
            .token(&[self.scope.url()])
            .await
            .map_err(|e| DriveError::Auth(e.to_string()))?;
        Ok(token.as_str().to_string())
    }
}

/// A pre-issued bearer token.
pub struct StaticToken(pub String);

#[async_trait]
impl AccessToken for StaticToken {
    async fn bearer(&self) -> Result<String, DriveError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileList {
    #[serde(default)]
    files: Vec<RemoteFile>,
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct UploadMetadata<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    parents: Vec<&'a str>,
}

async fn ensure_success(resp: Response) -> Result<Response, DriveError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(DriveError::Status {
        status: status.as_u16(),
        body: body.chars().take(BODY_SNIPPET_CHARS).collect(),
    })
}

/// Thin REST client over the Drive v3 endpoints the pipeline uses.
pub struct DriveClient {
    http: Client,
    base_url: String,
    token: Box<dyn AccessToken>,
}

impl DriveClient {
    pub fn new(cfg: &Config, scope: DriveScope) -> Result<Self, ConfigError> {
        let token = ServiceAccountToken::from_json(cfg.credentials()?, scope)?;
        Ok(Self::with_token(cfg, Box::new(token)))
    }

    pub fn with_token(cfg: &Config, token: Box<dyn AccessToken>) -> Self {
        Self {
            http: Client::new(),
            base_url: cfg.drive_base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub async fn list_videos(&self, folder_id: &str) -> Result<Vec<RemoteFile>, DriveError> {
        let query = format!("'{}' in parents and mimeType='{}'", folder_id, VIDEO_MIME);
        let url = format!("{}/drive/v3/files", self.base_url);

        let mut files = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let bearer = self.token.bearer().await?;
            let mut req = self.http.get(&url).bearer_auth(&bearer).query(&[
                ("q", query.as_str()),
                ("fields", "nextPageToken,files(id,name)"),
                ("pageSize", PAGE_SIZE),
            ]);
            if let Some(token) = &page_token {
                req = req.query(&[("pageToken", token.as_str())]);
            }

            let resp = ensure_success(req.send().await?).await?;
            let page: FileList = serde_json::from_str(&resp.text().await?)?;
            files.extend(page.files);

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }
        Ok(files)
    }

    /// Streams the file's content into `target`. A request that fails before
    /// any bytes arrive leaves `target` untouched; a partially written file
    /// is removed.
    pub async fn download_to(&self, file: &RemoteFile, target: &Path) -> Result<u64, DriveError> {
        let bearer = self.token.bearer().await?;
        let req = self
            .http
            .get(format!("{}/drive/v3/files/{}", self.base_url, file.id))
            .query(&[("alt", "media")])
            .bearer_auth(&bearer);
        let resp = ensure_success(req.send().await?).await?;

        let out = fs::File::create(target).await?;
        let result = stream_to(resp, out).await;
        if result.is_err() {
            let _ = fs::remove_file(target).await;
        }
        result
    }

    pub async fn upload(
        &self,
        local: &Path,
        folder_id: Option<&str>,
    ) -> Result<RemoteFile, DriveError> {
        let name = local
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let metadata = UploadMetadata {
            name: &name,
            parents: folder_id.into_iter().collect(),
        };
        let content = fs::read(local).await?;

        let boundary = format!("reel-pipeline-{:016x}", rand::random::<u64>());
        let body = multipart_related(&boundary, &serde_json::to_vec(&metadata)?, &content);

        let bearer = self.token.bearer().await?;
        let req = self
            .http
            .post(format!("{}/upload/drive/v3/files", self.base_url))
            .query(&[("uploadType", "multipart"), ("fields", "id,name,webViewLink")])
            .bearer_auth(&bearer)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body);

        let resp = ensure_success(req.send().await?).await?;
        Ok(serde_json::from_str(&resp.text().await?)?)
    }
}

async fn stream_to(mut resp: Response, mut out: fs::File) -> Result<u64, DriveError> {
    let mut written = 0u64;
    while let Some(chunk) = resp.chunk().await? {
        out.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    out.flush().await?;
    Ok(written)
}

fn multipart_related(boundary: &str, metadata: &[u8], media: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + media.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata);
    body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", VIDEO_MIME).as_bytes());
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

/// Drive names may contain separators; only the final component is used locally.
fn local_name(file: &RemoteFile) -> String {
    Path::new(&file.name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.id.clone())
}

pub struct DriveDownloader {
    client: DriveClient,
    folder_id: String,
    log: Log,
}

impl DriveDownloader {
    pub fn new(cfg: &Config, log: Log) -> Result<Self, ConfigError> {
        let client = DriveClient::new(cfg, DriveScope::ReadOnly)?;
        Self::from_client(cfg, client, log)
    }

    pub fn from_client(cfg: &Config, client: DriveClient, log: Log) -> Result<Self, ConfigError> {
        let folder_id = cfg.folder_id()?.to_string();
        log.ok("DriveDownloader initialised");
        Ok(Self {
            client,
            folder_id,
            log,
        })
    }

    /// Returns the names of the files that were written.
    pub async fn download_videos(&self, output_dir: &Path) -> anyhow::Result<Vec<String>> {
        fs::create_dir_all(output_dir).await?;

        let files = self.client.list_videos(&self.folder_id).await?;
        if files.is_empty() {
            self.log.warn("No videos to download");
            return Ok(Vec::new());
        }

        self.log.info(format!("Downloading {} videos...", files.len()));
        let mut downloaded = Vec::new();
        for file in &files {
            let name = local_name(file);
            let target = output_dir.join(&name);
            match self.client.download_to(file, &target).await {
                Ok(_) => {
                    self.log.ok(format!("Downloaded: {}", name));
                    downloaded.push(name);
                }
                Err(err) => self.log.error(format!("Error downloading {}: {}", file.name, err)),
            }
        }

        self.log.ok(format!("Total downloaded: {}/{}", downloaded.len(), files.len()));
        Ok(downloaded)
    }
}

pub struct DriveUploader {
    client: DriveClient,
    folder_id: Option<String>,
    log: Log,
}

impl DriveUploader {
    pub fn new(cfg: &Config, log: Log) -> Result<Self, ConfigError> {
        let client = DriveClient::new(cfg, DriveScope::File)?;
        Ok(Self::from_client(cfg, client, log))
    }

    pub fn from_client(cfg: &Config, client: DriveClient, log: Log) -> Self {
        log.ok("DriveUploader initialised");
        Self {
            client,
            folder_id: cfg.drive_folder_id.clone(),
            log,
        }
    }

    pub async fn upload_videos(&self, dir: &Path) -> Vec<RemoteFile> {
        let videos: Vec<PathBuf> = list_with_extension(dir, "mp4");
        if videos.is_empty() {
            self.log.warn(format!("No videos in {}", dir.display()));
            return Vec::new();
        }

        self.log.info(format!("Uploading {} videos...", videos.len()));
        let mut uploaded = Vec::new();
        for video in &videos {
            match self.client.upload(video, self.folder_id.as_deref()).await {
                Ok(file) => {
                    self.log.ok(format!("Uploaded: {} (ID: {})", file.name, file.id));
                    uploaded.push(file);
                }
                Err(err) => {
                    let name = video.file_name().unwrap_or(video.as_os_str()).to_string_lossy();
                    self.log.error(format!("Error uploading {}: {}", name, err));
                }
            }
        }

        self.log.ok(format!("Total uploaded: {}/{}", uploaded.len(), videos.len()));
        uploaded
    }
}
