use crate::error::ApiError;
use crate::log::Log;
use crate::pacing::{Pacer, uniform_delay};
use crate::prompts::pick_prompt;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const DEFAULT_BATCH_SIZE: usize = 5;
const MIN_DELAY_SECS: f64 = 15.0;
const MAX_DELAY_SECS: f64 = 30.0;

#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Returns the URL of the generated video.
    async fn generate(&self, prompt: &str, video_id: &str) -> Result<String, ApiError>;
}

#[async_trait]
pub trait VideoDownloader: Send + Sync {
    /// Returns the local path the video was written to.
    async fn download(&self, url: &str, video_id: &str) -> Result<PathBuf, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub video_id: String,
    pub prompt: String,
    #[serde(rename = "path")]
    pub local_path: Option<PathBuf>,
    pub url: Option<String>,
    #[serde(rename = "timestamp")]
    pub created_at: DateTime<Local>,
}

impl GenerationResult {
    pub fn generated(video_id: String, prompt: String, url: String) -> Self {
        Self {
            video_id,
            prompt,
            local_path: None,
            url: Some(url),
            created_at: Local::now(),
        }
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.local_path = Some(path);
        self
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<GenerationResult>,
    pub summary_path: Option<PathBuf>,
}

pub fn video_id_for(date: &DateTime<Local>, idx: usize) -> String {
    format!("vid_{}_{:02}", date.format("%Y%m%d"), idx)
}

pub struct BatchRunner<'a> {
    generator: &'a dyn VideoGenerator,
    downloader: &'a dyn VideoDownloader,
    pacer: &'a dyn Pacer,
    logs_dir: PathBuf,
    delay_secs: RangeInclusive<f64>,
    rng: StdRng,
    log: Log,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        generator: &'a dyn VideoGenerator,
        downloader: &'a dyn VideoDownloader,
        pacer: &'a dyn Pacer,
        logs_dir: impl Into<PathBuf>,
        rng: StdRng,
        log: Log,
    ) -> Self {
        Self {
            generator,
            downloader,
            pacer,
            logs_dir: logs_dir.into(),
            delay_secs: MIN_DELAY_SECS..=MAX_DELAY_SECS,
            rng,
            log,
        }
    }

    pub fn with_delay_secs(mut self, range: RangeInclusive<f64>) -> Self {
        self.delay_secs = range;
        self
    }

    pub async fn run(&mut self, count: usize) -> Result<BatchReport> {
        self.log.info(format!("Starting batch: {} videos", count));

        let mut generated = Vec::new();
        for idx in 0..count {
            let video_id = video_id_for(&Local::now(), idx);
            self.log.info(format!("VIDEO {}/{} - ID: {}", idx + 1, count, video_id));

            if let Some(result) = self.produce_one(&video_id).await {
                generated.push(result);
                self.log.ok(format!("Video {} completed", idx + 1));
            }

            if idx + 1 < count {
                let delay = uniform_delay(
                    &mut self.rng,
                    *self.delay_secs.start(),
                    *self.delay_secs.end(),
                );
                self.log.info(format!(
                    "Waiting {:.0}s before the next video...",
                    delay.as_secs_f64()
                ));
                self.pacer.pause(delay).await;
            }
        }

        self.log
            .banner(format!("BATCH COMPLETE: {}/{} succeeded", generated.len(), count));

        let summary_path = if generated.is_empty() {
            None
        } else {
            let path = write_summary(&self.logs_dir, &generated).await?;
            self.log.info(format!("Summary saved to: {}", path.display()));
            Some(path)
        };

        Ok(BatchReport {
            results: generated,
            summary_path,
        })
    }

    async fn produce_one(&mut self, video_id: &str) -> Option<GenerationResult> {
        let prompt = pick_prompt(&mut self.rng, &self.log);

        let url = match self.generator.generate(prompt, video_id).await {
            Ok(url) => url,
            Err(_) => {
                self.log.warn(format!("{} failed during generation", video_id));
                return None;
            }
        };

        let result = GenerationResult::generated(video_id.to_string(), prompt.to_string(), url);
        let url = result.url.as_deref().unwrap_or_default();
        match self.downloader.download(url, video_id).await {
            Ok(path) => Some(result.with_path(path)),
            Err(_) => {
                self.log.warn(format!("{} generated but not downloaded", video_id));
                None
            }
        }
    }
}

pub async fn write_summary(logs_dir: &Path, results: &[GenerationResult]) -> Result<PathBuf> {
    fs::create_dir_all(logs_dir)
        .await
        .with_context(|| format!("Failed to create dir {}", logs_dir.display()))?;
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = logs_dir.join(format!("batch_{}.json", stamp));
    let json = serde_json::to_string_pretty(results).context("Failed to serialize batch summary")?;
    fs::write(&path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}
