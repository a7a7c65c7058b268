use crate::config::Config;
use crate::log::Log;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use tokio::process::Command;

pub async fn ensure_directories(cfg: &Config, log: &Log) -> Result<()> {
    for dir in [&cfg.generated_dir, &cfg.edited_dir, &cfg.logs_dir] {
        if !Path::new(dir).exists() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
            log.info(format!("Created directory: {}", dir.display()));
        }
    }
    Ok(())
}

pub async fn check_ffmpeg(ffmpeg_bin: &str) -> bool {
    match Command::new(ffmpeg_bin).arg("-version").output().await {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}
