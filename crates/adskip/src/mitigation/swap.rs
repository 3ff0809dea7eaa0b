// Source-Swap Controller: decides whether a candidate playlist is kept,
// replaced by a cleaned copy, or rolled back to the last good playlist.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::classifier::AdClassifier;
use crate::dom::VideoElement;
use crate::hls::handle::CleanedResourceHandle;
use crate::hls::pipeline::CleanPipeline;

#[derive(Debug, Default)]
struct SwapState {
    last_good: Option<String>,
    last_attempt: Option<Instant>,
}

pub struct SourceSwapController {
    classifier: AdClassifier,
    pipeline: Arc<CleanPipeline>,
    state: Mutex<SwapState>,
    debounce: Duration,
    resume_delay: Duration,
}

impl SourceSwapController {
    pub fn new(
        classifier: AdClassifier,
        pipeline: Arc<CleanPipeline>,
        debounce: Duration,
        resume_delay: Duration,
    ) -> Self {
        Self {
            classifier,
            pipeline,
            state: Mutex::new(SwapState::default()),
            debounce,
            resume_delay,
        }
    }

    pub fn classifier(&self) -> &AdClassifier {
        &self.classifier
    }

    pub fn pipeline(&self) -> &Arc<CleanPipeline> {
        &self.pipeline
    }

    pub fn last_good(&self) -> Option<String> {
        self.state.lock().last_good.clone()
    }

    /// Remember `url` as the rollback target.
    ///
    /// Handle URLs are skipped: they are revoked as soon as the next cleaned
    /// playlist is installed.
    pub fn record_last_good(&self, url: &str) {
        if url.is_empty() || CleanedResourceHandle::is_handle_url(url) {
            return;
        }
        let mut state = self.state.lock();
        if state.last_good.as_deref() != Some(url) {
            debug!(url, "Updated last good playlist");
            state.last_good = Some(url.to_string());
        }
    }

    /// Stamp the debounce clock unless an attempt happened within the window.
    ///
    /// The check and the write share one lock acquisition.
    pub fn try_begin_attempt(&self) -> bool {
        let now = Instant::now();
        let mut state = self.state.lock();
        if let Some(last) = state.last_attempt
            && now.saturating_duration_since(last) < self.debounce
        {
            return false;
        }
        state.last_attempt = Some(now);
        true
    }

    /// Route a candidate playlist source for `video`.
    ///
    /// Returns `true` if the video's source was replaced.
    pub async fn handle_candidate_source(
        &self,
        video: &Arc<dyn VideoElement>,
        candidate_url: &str,
    ) -> bool {
        if !self.classifier.is_ad_likely(candidate_url) {
            self.record_last_good(candidate_url);
            return false;
        }

        if !self.try_begin_attempt() {
            debug!(url = candidate_url, "Swap attempt debounced");
            return false;
        }

        if let Some(handle) = self.pipeline.fetch_and_clean(candidate_url).await {
            info!(video = %video.id(), handle = %handle, "Swapping to cleaned playlist");
            swap_source(video, handle.url(), self.resume_delay);
            return true;
        }

        match self.last_good() {
            Some(last_good) => {
                info!(
                    video = %video.id(),
                    url = %last_good,
                    "Cleaning failed; rolling back to last good playlist"
                );
                swap_source(video, &last_good, self.resume_delay);
                true
            }
            None => {
                debug!(
                    url = candidate_url,
                    "Cleaning failed and no last good playlist is known"
                );
                false
            }
        }
    }
}

/// Pause, point `video` at `url` and reload, then resume playback once the
/// media pipeline had `resume_delay` to settle. A failed resume is ignored.
pub fn swap_source(video: &Arc<dyn VideoElement>, url: &str, resume_delay: Duration) {
    video.pause();
    video.set_source(url);
    video.load();

    let video = Arc::clone(video);
    tokio::spawn(async move {
        tokio::time::sleep(resume_delay).await;
        if let Err(e) = video.play().await {
            debug!(video = %video.id(), error = %e, "Resume after swap was refused");
        }
    });
}
