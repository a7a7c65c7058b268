use crate::error::MediaError;
use crate::log::Log;
use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use walkdir::WalkDir;

const EDIT_TIMEOUT: Duration = Duration::from_secs(300);
const STDERR_TAIL_CHARS: usize = 400;

const VIDEO_FILTER: &str = concat!(
    "scale=1080:1920:force_original_aspect_ratio=increase,",
    "crop=1080:1920,",
    "eq=contrast=1.4:brightness=-0.15:saturation=0.8,",
    "colorchannelmixer=rr=1:gg=0.8:bb=1.3"
);

/// Outcome of one completed tool run. The exit code is reported, not judged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    pub output: PathBuf,
    pub exit_code: Option<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditSummary {
    pub found: usize,
    pub invoked: usize,
    pub failed: usize,
}

pub fn edit_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-i".to_string(),
        input.display().to_string(),
        "-vf".to_string(),
        VIDEO_FILTER.to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "faster".to_string(),
        "-crf".to_string(),
        "23".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-y".to_string(),
        output.display().to_string(),
    ]
}

pub fn edited_name(input: &Path) -> String {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("edited_{}", name)
}

/// Non-recursive, sorted listing of files with the given extension.
pub fn list_with_extension(dir: &Path, ext: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(OsStr::to_str)
                .map(|e| e.eq_ignore_ascii_case(ext))
                == Some(true)
        })
        .collect();
    files.sort();
    files
}

pub struct MediaEditor {
    ffmpeg_bin: String,
    input_dir: PathBuf,
    output_dir: PathBuf,
    timeout: Duration,
    log: Log,
}

impl MediaEditor {
    pub fn new(
        ffmpeg_bin: impl Into<String>,
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        log: Log,
    ) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            timeout: EDIT_TIMEOUT,
            log,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn apply_filters(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<EditOutcome, MediaError> {
        let name = input.file_name().unwrap_or(input.as_os_str()).to_string_lossy();
        self.log.info(format!("Editing: {}", name));

        let mut cmd = Command::new(&self.ffmpeg_bin);
        cmd.args(edit_args(input, output))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let run = cmd.output();
        let out = match tokio::time::timeout(self.timeout, run).await {
            Ok(Ok(out)) => out,
            Ok(Err(source)) => {
                return Err(MediaError::Spawn {
                    program: self.ffmpeg_bin.clone(),
                    source,
                });
            }
            Err(_) => return Err(MediaError::Timeout(self.timeout)),
        };

        let exit_code = out.status.code();
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let tail: String = {
                let chars: Vec<char> = stderr.trim_end().chars().collect();
                chars[chars.len().saturating_sub(STDERR_TAIL_CHARS)..].iter().collect()
            };
            self.log.warn(format!(
                "{} exited with status {:?}: {}",
                self.ffmpeg_bin, exit_code, tail
            ));
        }

        let out_name = output.file_name().unwrap_or(output.as_os_str()).to_string_lossy();
        self.log.ok(format!("Video edited: {}", out_name));
        Ok(EditOutcome {
            output: output.to_path_buf(),
            exit_code,
        })
    }

    pub async fn process_all(&self) -> Result<EditSummary> {
        self.log.banner("BATCH_EDIT - starting");

        let videos = list_with_extension(&self.input_dir, "mp4");
        let mut summary = EditSummary {
            found: videos.len(),
            ..Default::default()
        };
        if videos.is_empty() {
            self.log.warn(format!("No videos to edit in {}", self.input_dir.display()));
            return Ok(summary);
        }

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .with_context(|| format!("Failed to create dir {}", self.output_dir.display()))?;
        self.log.info(format!("Found {} videos", videos.len()));

        for video in &videos {
            let output = self.output_dir.join(edited_name(video));
            summary.invoked += 1;
            if let Err(err) = self.apply_filters(video, &output).await {
                self.log.error(format!("Error: {}", err));
                summary.failed += 1;
            }
        }

        self.log.ok("Editing complete");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::memory_hook;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn args_follow_fixed_chain() {
        let args = edit_args(Path::new("in/a.mp4"), Path::new("out/edited_a.mp4"));
        assert_eq!(args.first().map(String::as_str), Some("-i"));
        assert_eq!(args[1], "in/a.mp4");
        assert_eq!(args[2], "-vf");
        assert_eq!(
            args[3],
            "scale=1080:1920:force_original_aspect_ratio=increase,crop=1080:1920,\
             eq=contrast=1.4:brightness=-0.15:saturation=0.8,\
             colorchannelmixer=rr=1:gg=0.8:bb=1.3"
        );
        let tail: Vec<&str> = args[4..].iter().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec![
                "-c:v", "libx264", "-preset", "faster", "-crf", "23", "-c:a", "aac", "-y",
                "out/edited_a.mp4"
            ]
        );
    }

    #[test]
    fn output_name_is_prefixed() {
        assert_eq!(edited_name(Path::new("media/x/vid_01.mp4")), "edited_vid_01.mp4");
    }

    #[test]
    fn lists_only_matching_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.mp4");
        touch(dir.path(), "a.MP4");
        touch(dir.path(), "notes.txt");
        std::fs::create_dir(dir.path().join("sub.mp4")).unwrap();

        let names: Vec<String> = list_with_extension(dir.path(), "mp4")
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.MP4", "b.mp4"]);
    }

    #[tokio::test]
    async fn empty_input_runs_nothing() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let (hook, lines) = memory_hook();
        let editor = MediaEditor::new(
            "/definitely/not/ffmpeg",
            input.path(),
            output.path().join("edited"),
            Log::new().with_hook(hook),
        );

        let summary = editor.process_all().await.unwrap();
        assert_eq!(summary, EditSummary::default());
        assert!(!output.path().join("edited").exists());
        assert!(lines.lock().unwrap().iter().any(|l| l.starts_with("[WARN] No videos")));
    }

    #[tokio::test]
    async fn missing_input_dir_is_treated_as_empty() {
        let root = tempfile::tempdir().unwrap();
        let editor = MediaEditor::new("ffmpeg", root.path().join("nope"), root.path(), Log::new());
        assert_eq!(editor.process_all().await.unwrap().invoked, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn invokes_tool_once_per_file() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        touch(input.path(), "one.mp4");
        touch(input.path(), "two.mp4");

        let editor = MediaEditor::new("true", input.path(), output.path(), Log::new());
        let summary = editor.process_all().await.unwrap();
        assert_eq!(
            summary,
            EditSummary {
                found: 2,
                invoked: 2,
                failed: 0
            }
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_reported_but_not_failed() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let video = touch(input.path(), "clip.mp4");
        let (hook, lines) = memory_hook();
        let log = Log::new().with_hook(hook);
        let editor = MediaEditor::new("false", input.path(), output.path(), log);

        let target = output.path().join("edited_clip.mp4");
        let outcome = editor.apply_filters(&video, &target).await.unwrap();
        assert_eq!(outcome.exit_code, Some(1));
        assert_eq!(outcome.output, target);

        let lines = lines.lock().unwrap();
        assert!(lines.iter().any(|l| l.starts_with("[WARN] false exited with status")));
        assert!(lines.iter().any(|l| l == "[OK] Video edited: edited_clip.mp4"));
    }

    #[tokio::test]
    async fn missing_tool_counts_as_failure() {
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        touch(input.path(), "one.mp4");

        let editor = MediaEditor::new(
            "/definitely/not/ffmpeg",
            input.path(),
            output.path(),
            Log::new(),
        );
        let summary = editor.process_all().await.unwrap();
        assert_eq!(summary.invoked, 1);
        assert_eq!(summary.failed, 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hung_tool_is_killed_and_counted_as_failure() {
        use std::os::unix::fs::PermissionsExt;

        let bin = tempfile::tempdir().unwrap();
        let input = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        touch(input.path(), "slow.mp4");

        let script = bin.path().join("fake-ffmpeg");
        std::fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let (hook, lines) = memory_hook();
        let editor = MediaEditor::new(
            script.display().to_string(),
            input.path(),
            output.path(),
            Log::new().with_hook(hook),
        )
        .with_timeout(Duration::from_millis(200));

        let started = std::time::Instant::now();
        let summary = editor.process_all().await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(
            summary,
            EditSummary {
                found: 1,
                invoked: 1,
                failed: 1
            }
        );

        let lines = lines.lock().unwrap();
        assert!(lines.iter().any(|l| l.starts_with("[ERROR] Error: timed out")));
        assert!(!lines.iter().any(|l| l.starts_with("[OK] Video edited")));
    }
}
