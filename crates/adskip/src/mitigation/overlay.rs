// Overlay Mitigation Decision: swap the playlist when possible, otherwise
// seek past the ad.

use std::sync::Arc;

use tracing::{debug, info};

use crate::classifier::is_playlist_url;
use crate::config::SkipConfig;
use crate::dom::Document;
use crate::mitigation::swap::SourceSwapController;

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayOutcome {
    /// The page has no video element.
    NoVideo,
    /// The video's playlist was replaced.
    Swapped,
    /// Playback position moved forward.
    Skipped { from: f64, to: f64 },
}

pub struct OverlayMitigator {
    swap: Arc<SourceSwapController>,
    skip: SkipConfig,
}

impl OverlayMitigator {
    pub fn new(swap: Arc<SourceSwapController>, skip: SkipConfig) -> Self {
        Self { swap, skip }
    }

    /// React to a probable ad overlay on `document`.
    ///
    /// Only the first video in document order is considered.
    pub async fn on_overlay_detected(&self, document: &dyn Document) -> OverlayOutcome {
        let Some(video) = document.first_video() else {
            debug!("Overlay detected but the page has no video");
            return OverlayOutcome::NoVideo;
        };

        if let Some(source) = video.current_source().filter(|s| is_playlist_url(s)) {
            debug!(video = %video.id(), url = %source, "Video is using a playlist");
            if self.swap.handle_candidate_source(&video, &source).await {
                return OverlayOutcome::Swapped;
            }
        }

        let from = video.current_time();
        let to = skip_target(&self.skip, video.duration(), from);
        info!(
            video = %video.id(),
            skip_secs = to - sanitize(from),
            target = to,
            "Skipping ahead past ad"
        );
        video.set_current_time(to);
        OverlayOutcome::Skipped { from, to }
    }
}

fn sanitize(secs: f64) -> f64 {
    if secs.is_finite() && secs > 0.0 { secs } else { 0.0 }
}

/// Forward seek amount: a share of the duration, clamped to the configured
/// bounds. Unknown durations use the nominal fallback; live media (infinite
/// duration) gets the upper bound. The upper bound wins if the bounds cross.
pub fn skip_amount(skip: &SkipConfig, duration: f64) -> f64 {
    let nominal = if duration.is_nan() || duration <= 0.0 {
        skip.fallback_duration_secs
    } else {
        duration
    };
    (nominal * skip.duration_ratio)
        .floor()
        .max(skip.min_secs)
        .min(skip.max_secs)
}

/// Seek target for a forward skip from `current`, kept one second short of
/// the end of finite media and never behind `current`.
pub fn skip_target(skip: &SkipConfig, duration: f64, current: f64) -> f64 {
    let current = sanitize(current);
    let mut target = current + skip_amount(skip, duration);
    if duration.is_finite() && duration > 0.0 {
        target = target.min(duration - 1.0);
    }
    target.max(current)
}
