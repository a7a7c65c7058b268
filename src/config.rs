use crate::error::ConfigError;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

pub const RUNWAY_API_KEY: &str = "RUNWAY_API_KEY";
pub const GOOGLE_CREDENTIALS: &str = "GOOGLE_CREDENTIALS";
pub const GOOGLE_DRIVE_FOLDER_ID: &str = "GOOGLE_DRIVE_FOLDER_ID";
pub const FANPAGE_KEY_PREFIX: &str = "TIKTOK_API_KEY_FANPAGE_";

const DEFAULT_RUNWAY_URL: &str = "https://api.runwayml.com/v1";
const DEFAULT_DRIVE_URL: &str = "https://www.googleapis.com";

/// Everything the pipeline commands need, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub runway_api_key: Option<String>,
    pub runway_base_url: String,
    pub google_credentials: Option<String>,
    pub drive_folder_id: Option<String>,
    pub drive_base_url: String,
    pub generated_dir: PathBuf,
    pub edited_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub ffmpeg_bin: String,
    pub fanpage_keys: BTreeMap<u32, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_vars(std::iter::empty::<(String, String)>())
    }
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        // Empty values are treated the same as unset ones.
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.trim().is_empty())
            .collect();

        let text = |key: &str, default: &str| -> String {
            vars.get(key).cloned().unwrap_or_else(|| default.to_string())
        };

        let fanpage_keys = vars
            .iter()
            .filter_map(|(k, v)| {
                let n = k.strip_prefix(FANPAGE_KEY_PREFIX)?.parse::<u32>().ok()?;
                Some((n, v.clone()))
            })
            .collect();

        Self {
            runway_api_key: vars.get(RUNWAY_API_KEY).cloned(),
            runway_base_url: text("RUNWAY_API_URL", DEFAULT_RUNWAY_URL),
            google_credentials: vars.get(GOOGLE_CREDENTIALS).cloned(),
            drive_folder_id: vars.get(GOOGLE_DRIVE_FOLDER_ID).cloned(),
            drive_base_url: text("GOOGLE_DRIVE_API_URL", DEFAULT_DRIVE_URL),
            generated_dir: PathBuf::from(text("GENERATED_VIDEOS_DIR", "media/GeneratedVideos")),
            edited_dir: PathBuf::from(text("EDITED_VIDEOS_DIR", "media/EditedVideos")),
            logs_dir: PathBuf::from(text("LOGS_DIR", "logs")),
            ffmpeg_bin: text("FFMPEG_BIN", "ffmpeg"),
            fanpage_keys,
        }
    }

    pub fn runway_key(&self) -> Result<&str, ConfigError> {
        self.runway_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::missing(RUNWAY_API_KEY))
    }

    pub fn credentials(&self) -> Result<&str, ConfigError> {
        self.google_credentials
            .as_deref()
            .ok_or_else(|| ConfigError::missing(GOOGLE_CREDENTIALS))
    }

    pub fn folder_id(&self) -> Result<&str, ConfigError> {
        self.drive_folder_id
            .as_deref()
            .ok_or_else(|| ConfigError::missing(GOOGLE_DRIVE_FOLDER_ID))
    }

    pub fn fanpage_key(&self, fanpage: u32) -> Result<&str, ConfigError> {
        self.fanpage_keys
            .get(&fanpage)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::missing(format!("{FANPAGE_KEY_PREFIX}{fanpage}")))
    }
}
