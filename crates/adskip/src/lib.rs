//! # adskip-engine
//!
//! Heuristic ad suppression for HLS live streams.
//!
//! The engine watches what a page does (relayed playlist requests, inserted
//! DOM nodes, video source changes) and reacts by rewriting ad segments out of
//! playlists, swapping the cleaned playlist into the video, or seeking past an
//! ad it cannot remove. A PAC script that blackholes known ad hosts is managed
//! alongside it by [`control::ControlService`].
//!
//! The page itself is abstracted behind the traits in [`dom`], so a browser
//! binding, a headless player or a test fake can drive the same logic.
//!
//! ## Core Types
//!
//! - [`AdSkipEngine`] - Per-page controller routing every page event
//! - [`AdClassifier`] - Keyword classifier for ad-likely URLs
//! - [`hls::AdSegmentStripper`] - Removes ad segments from playlist text
//! - [`hls::CleanPipeline`] - Fetch, clean and serve a playlist as a local handle
//! - [`mitigation::SourceSwapController`] - Debounced playlist swap with rollback
//! - [`pac::PacRules`] - Blackhole ruleset and PAC script renderer

pub mod classifier;
pub mod config;
pub mod control;
pub mod detection;
pub mod dom;
mod engine;
pub mod error;
pub mod hls;
pub mod mitigation;
pub mod pac;

#[cfg(test)]
mod test_support;

pub use classifier::{AdClassifier, is_playlist_url};
pub use config::{AdSkipConfig, SkipConfig};
pub use engine::{AdSkipEngine, EngineSnapshot};
pub use error::{AdSkipError, Result};
pub use hls::strip_ad_segments;
