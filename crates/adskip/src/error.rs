use std::time::Duration;

use reqwest::StatusCode;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, AdSkipError>;

#[derive(Debug, thiserror::Error)]
pub enum AdSkipError {
    #[error("HTTP request failed: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("request failed with HTTP {status} for {url}")]
    HttpStatus { status: StatusCode, url: String },

    #[error("fetch of {url} timed out after {}ms", .after.as_millis())]
    Timeout { url: String, after: Duration },

    #[error("invalid playlist from {url}: {reason}")]
    InvalidPlaylist { url: String, reason: String },

    #[error("cleaned playlist from {url} is empty")]
    EmptyPlaylist { url: String },

    #[error("activation store error: {reason}")]
    Store { reason: String },

    #[error("proxy error: {reason}")]
    Proxy { reason: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("playback error: {reason}")]
    Playback { reason: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl AdSkipError {
    pub fn http_status(status: StatusCode, url: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            url: url.into(),
        }
    }

    pub fn invalid_playlist(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPlaylist {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn store(reason: impl Into<String>) -> Self {
        Self::Store {
            reason: reason.into(),
        }
    }

    pub fn proxy(reason: impl Into<String>) -> Self {
        Self::Proxy {
            reason: reason.into(),
        }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    pub fn playback(reason: impl Into<String>) -> Self {
        Self::Playback {
            reason: reason.into(),
        }
    }

    /// Transport failures: the playlist never arrived.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Network { .. } | Self::HttpStatus { .. } | Self::Timeout { .. }
        )
    }

    /// Format failures: a body arrived but is not usable as a playlist.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            Self::InvalidPlaylist { .. } | Self::EmptyPlaylist { .. }
        )
    }
}
