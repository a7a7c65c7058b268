use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not configured")]
    Missing(String),

    #[error("invalid service credential: {0}")]
    InvalidCredential(String),
}

impl ConfigError {
    pub fn missing(key: impl Into<String>) -> Self {
        Self::Missing(key.into())
    }
}

/// Failures of the generation API call and the follow-up download.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response did not contain a video_url")]
    MissingVideoUrl,

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("request failed: {0}")]
    Request(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum DriveError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_names_the_key() {
        let err = ConfigError::missing("RUNWAY_API_KEY");
        assert_eq!(err.to_string(), "RUNWAY_API_KEY is not configured");
    }

    #[test]
    fn status_error_shows_code() {
        let err = ApiError::Status {
            status: 429,
            body: "slow down".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 429: slow down");
    }
}
