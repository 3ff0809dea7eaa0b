// Video element watcher: one polling task per video that routes source
// changes through the swap controller.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::control::local::ActivationFlag;
use crate::detection::MIN_TICK;
use crate::dom::VideoElement;
use crate::mitigation::swap::SourceSwapController;

pub struct VideoWatcher {
    swap: Arc<SourceSwapController>,
    period: Duration,
    active: ActivationFlag,
    watched: Mutex<HashSet<String>>,
}

impl VideoWatcher {
    pub fn new(swap: Arc<SourceSwapController>, period: Duration, active: ActivationFlag) -> Self {
        Self {
            swap,
            period: period.max(MIN_TICK),
            active,
            watched: Mutex::new(HashSet::new()),
        }
    }

    /// Number of videos with a live polling task.
    pub fn watched_count(&self) -> usize {
        self.watched.lock().len()
    }

    /// Start polling `video` unless it is already watched.
    ///
    /// The task ends when the video leaves its document or `token` fires.
    pub fn watch(self: &Arc<Self>, video: Arc<dyn VideoElement>, token: CancellationToken) -> bool {
        let id = video.id();
        if !self.watched.lock().insert(id.clone()) {
            trace!(video = %id, "Video is already watched");
            return false;
        }
        debug!(video = %id, "Watching video source");

        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.poll(&video, token).await;
            this.watched.lock().remove(&id);
        });
        true
    }

    async fn poll(&self, video: &Arc<dyn VideoElement>, token: CancellationToken) {
        let mut last_seen = video.current_source().unwrap_or_default();
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => return,
                _ = ticker.tick() => {}
            }

            if !video.is_attached() {
                debug!(video = %video.id(), "Video detached; stopped watching");
                return;
            }

            let current = video.current_source().unwrap_or_default();
            if current.is_empty() || current == last_seen {
                continue;
            }
            debug!(video = %video.id(), url = %current, "Video source changed");
            last_seen = current;

            if self.active.is_active() {
                self.swap.handle_candidate_source(video, &last_seen).await;
            } else if !self.swap.classifier().is_ad_likely(last_seen.as_str()) {
                self.swap.record_last_good(&last_seen);
            }
        }
    }
}
