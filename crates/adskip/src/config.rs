use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AdSkipError, Result};
use crate::pac::PacRules;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// Media type used for cleaned playlist bodies.
pub const PLAYLIST_MIME_TYPE: &str = "application/vnd.apple.mpegurl";

/// Header marker every media playlist must carry.
pub const PLAYLIST_HEADER: &str = "#EXTM3U";

fn default_ad_keywords() -> Vec<String> {
    [
        "stitched",
        "preroll",
        "midroll",
        "ad_segment",
        "dmc-ad",
        "/ads/",
        "/ad/",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_ad_daterange_classes() -> Vec<String> {
    vec!["ad".to_string(), "twitch-stitched-ad".to_string()]
}

fn default_overlay_keywords() -> Vec<String> {
    ["ad", "advert", "sponsored", "commercial"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_overlay_selectors() -> Vec<String> {
    [
        ".ad-banner",
        ".video-player__ad-overlay",
        ".tw-overlay",
        ".player-ad",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Bounds for the seek-forward fallback used when no playlist swap is possible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkipConfig {
    /// Lower bound of the forward seek, in seconds
    pub min_secs: f64,
    /// Upper bound of the forward seek, in seconds
    pub max_secs: f64,
    /// Share of the media duration to skip before clamping
    pub duration_ratio: f64,
    /// Nominal duration assumed when the player reports none
    pub fallback_duration_secs: f64,
}

impl Default for SkipConfig {
    fn default() -> Self {
        Self {
            min_secs: 5.0,
            max_secs: 30.0,
            duration_ratio: 0.15,
            fallback_duration_secs: 60.0,
        }
    }
}

/// Engine configuration.
///
/// Durations are stored in milliseconds so the whole struct maps onto a flat
/// TOML table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdSkipConfig {
    /// Substrings marking a URL or URI line as ad content
    pub ad_keywords: Vec<String>,
    /// `CLASS` values of `#EXT-X-DATERANGE` tags that mark ad ranges
    pub ad_daterange_classes: Vec<String>,
    /// Substrings of overlay text that signal an ad is playing
    pub overlay_keywords: Vec<String>,
    /// Selectors checked by the periodic overlay scanner
    pub overlay_selectors: Vec<String>,

    /// Hard timeout for a playlist fetch
    pub fetch_timeout_ms: u64,
    /// Minimum time between two playlist swap attempts
    pub swap_debounce_ms: u64,
    /// Quiet window of the trailing-edge playlist detector
    pub detection_quiet_ms: u64,
    /// Delay between reloading a swapped source and resuming playback
    pub swap_resume_delay_ms: u64,
    /// Same as `swap_resume_delay_ms`, for the detector's broadcast swap
    pub broadcast_resume_delay_ms: u64,
    /// Period of the fallback overlay scan
    pub periodic_scan_interval_ms: u64,
    /// Period of the video source poll
    pub video_poll_interval_ms: u64,

    pub skip: SkipConfig,

    /// User agent sent with playlist fetches
    pub user_agent: String,

    /// Blackhole ruleset rendered into the PAC script
    pub pac: PacRules,
}

impl Default for AdSkipConfig {
    fn default() -> Self {
        Self {
            ad_keywords: default_ad_keywords(),
            ad_daterange_classes: default_ad_daterange_classes(),
            overlay_keywords: default_overlay_keywords(),
            overlay_selectors: default_overlay_selectors(),
            fetch_timeout_ms: 3_000,
            swap_debounce_ms: 500,
            detection_quiet_ms: 500,
            swap_resume_delay_ms: 250,
            broadcast_resume_delay_ms: 200,
            periodic_scan_interval_ms: 1_500,
            video_poll_interval_ms: 700,
            skip: SkipConfig::default(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            pac: PacRules::default(),
        }
    }
}

impl SkipConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("min_secs", self.min_secs),
            ("max_secs", self.max_secs),
            ("duration_ratio", self.duration_ratio),
            ("fallback_duration_secs", self.fallback_duration_secs),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AdSkipError::invalid_config(format!(
                    "skip.{name} must be a finite, non-negative number (got {value})"
                )));
            }
        }
        if self.min_secs > self.max_secs {
            return Err(AdSkipError::invalid_config(format!(
                "skip.min_secs ({}) is greater than skip.max_secs ({})",
                self.min_secs, self.max_secs
            )));
        }
        Ok(())
    }
}

impl AdSkipConfig {
    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("fetch_timeout_ms", self.fetch_timeout_ms),
            ("periodic_scan_interval_ms", self.periodic_scan_interval_ms),
            ("video_poll_interval_ms", self.video_poll_interval_ms),
        ] {
            if value == 0 {
                return Err(AdSkipError::invalid_config(format!(
                    "{name} must be greater than zero"
                )));
            }
        }
        self.skip.validate()
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn swap_debounce(&self) -> Duration {
        Duration::from_millis(self.swap_debounce_ms)
    }

    pub fn detection_quiet(&self) -> Duration {
        Duration::from_millis(self.detection_quiet_ms)
    }

    pub fn swap_resume_delay(&self) -> Duration {
        Duration::from_millis(self.swap_resume_delay_ms)
    }

    pub fn broadcast_resume_delay(&self) -> Duration {
        Duration::from_millis(self.broadcast_resume_delay_ms)
    }

    pub fn periodic_scan_interval(&self) -> Duration {
        Duration::from_millis(self.periodic_scan_interval_ms)
    }

    pub fn video_poll_interval(&self) -> Duration {
        Duration::from_millis(self.video_poll_interval_ms)
    }
}
