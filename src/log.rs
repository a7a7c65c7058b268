use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

pub type LogHook = Arc<dyn Fn(&str) + Send + Sync + 'static>;

/// Log handle handed to each component. Lines go to `tracing` and to every hook.
#[derive(Clone, Default)]
pub struct Log {
    hooks: Vec<LogHook>,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hook(mut self, hook: LogHook) -> Self {
        self.hooks.push(hook);
        self
    }

    fn emit(&self, tag: &str, message: &str) {
        match tag {
            "WARN" => tracing::warn!("{}", message),
            "ERROR" => tracing::error!("{}", message),
            _ => tracing::info!("{}", message),
        }

        if self.hooks.is_empty() {
            return;
        }
        let line = format!("[{}] {}", tag, message);
        for hook in &self.hooks {
            hook(&line);
        }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.emit("INFO", message.as_ref());
    }

    pub fn ok(&self, message: impl AsRef<str>) {
        self.emit("OK", message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.emit("WARN", message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.emit("ERROR", message.as_ref());
    }

    pub fn banner(&self, title: impl AsRef<str>) {
        let rule = "=".repeat(60);
        self.info(&rule);
        self.info(title);
        self.info(&rule);
    }
}

/// Appends each line, prefixed with the local time, to `path`.
pub fn file_hook(path: &Path) -> Result<LogHook> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create dir {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;
    let file = Mutex::new(file);

    Ok(Arc::new(move |line: &str| {
        let stamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        let mut guard = file.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writeln!(guard, "{} {}", stamp, line);
    }))
}

/// Hook that keeps every line in memory.
pub fn memory_hook() -> (LogHook, Arc<Mutex<Vec<String>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    let hook: LogHook = Arc::new(move |line: &str| {
        sink.lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line.to_string());
    });
    (hook, lines)
}
