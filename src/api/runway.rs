use crate::batch::VideoGenerator;
use crate::config::Config;
use crate::error::{ApiError, ConfigError};
use crate::log::Log;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const GENERATE_TIMEOUT: Duration = Duration::from_secs(60);
const VIDEO_DURATION_SECS: u32 = 20;
const BODY_SNIPPET_CHARS: usize = 800;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    High,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest<'a> {
    pub prompt: &'a str,
    pub duration: u32,
    pub format: &'a str,
    pub quality: Quality,
}

impl<'a> GenerationRequest<'a> {
    pub fn new(prompt: &'a str) -> Self {
        Self {
            prompt,
            duration: VIDEO_DURATION_SECS,
            format: "mp4",
            quality: Quality::High,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub video_url: Option<String>,
}

pub struct RunwayClient {
    http: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
    log: Log,
}

impl RunwayClient {
    pub fn new(cfg: &Config, log: Log) -> Result<Self, ConfigError> {
        let api_key = cfg.runway_key()?.to_string();
        Ok(Self {
            http: Client::new(),
            api_key,
            base_url: cfg.runway_base_url.trim_end_matches('/').to_string(),
            timeout: GENERATE_TIMEOUT,
            log,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn generate(&self, prompt: &str, video_id: &str) -> Result<String, ApiError> {
        self.log.info(format!("Generating video {}...", video_id));

        let result = self.send(prompt).await;
        match &result {
            Ok(url) => {
                self.log.ok("Video generated");
                self.log.info(format!("URL: {}", url));
            }
            Err(ApiError::Status { status, body }) => {
                self.log.warn(format!("Generation API returned HTTP {}", status));
                if !body.is_empty() {
                    self.log.warn(format!("Response body: {}", body));
                }
            }
            Err(ApiError::Timeout) => {
                self.log.warn("Timed out waiting for the generation API");
            }
            Err(ApiError::Connection(reason)) => {
                self.log.warn(format!("Could not connect to the generation API: {}", reason));
            }
            Err(err) => self.log.warn(format!("Generation failed: {}", err)),
        }
        result
    }

    async fn send(&self, prompt: &str) -> Result<String, ApiError> {
        let resp = self
            .http
            .post(format!("{}/generate", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&GenerationRequest::new(prompt))
            .timeout(self.timeout)
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let raw = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: raw.chars().take(BODY_SNIPPET_CHARS).collect(),
            });
        }

        let raw = resp.text().await?;
        let parsed: GenerationResponse =
            serde_json::from_str(&raw).map_err(|e| ApiError::Decode(e.to_string()))?;
        parsed.video_url.ok_or(ApiError::MissingVideoUrl)
    }
}

#[async_trait]
impl VideoGenerator for RunwayClient {
    async fn generate(&self, prompt: &str, video_id: &str) -> Result<String, ApiError> {
        RunwayClient::generate(self, prompt, video_id).await
    }
}
