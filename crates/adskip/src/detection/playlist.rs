// Debounced playlist detector: trailing-edge reaction to relayed playlist
// fetches. Only the last detection inside a quiet window is acted on.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::dom::Document;
use crate::mitigation::swap::{SourceSwapController, swap_source};

/// What a fired detection ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionOutcome {
    /// The URL looked clean and became the rollback target.
    RecordedLastGood,
    /// A swap attempt happened too recently.
    Debounced,
    /// Fetch-and-clean failed; nothing was touched.
    CleanFailed,
    /// The cleaned handle was pushed to this many videos.
    Broadcast(usize),
}

pub struct PlaylistDetector {
    swap: Arc<SourceSwapController>,
    quiet: Duration,
    resume_delay: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl PlaylistDetector {
    pub fn new(swap: Arc<SourceSwapController>, quiet: Duration, resume_delay: Duration) -> Self {
        Self {
            swap,
            quiet,
            resume_delay,
            pending: Mutex::new(None),
        }
    }

    /// Schedule a detection for `url`, superseding any pending one.
    pub fn on_playlist_detected(self: &Arc<Self>, url: String, document: Arc<dyn Document>) {
        let token = CancellationToken::new();
        if let Some(previous) = self.pending.lock().replace(token.clone()) {
            previous.cancel();
        }

        let this = Arc::clone(self);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    trace!(url = %url, "Playlist detection superseded");
                }
                _ = tokio::time::sleep(this.quiet) => {
                    this.run_detection(&url, document.as_ref()).await;
                }
            }
        });
    }

    /// Cancel the pending detection, if any.
    pub fn cancel_pending(&self) {
        if let Some(token) = self.pending.lock().take() {
            token.cancel();
        }
    }

    /// Act on a detection immediately, without the quiet window.
    pub async fn run_detection(&self, url: &str, document: &dyn Document) -> DetectionOutcome {
        if !self.swap.classifier().is_ad_likely(url) {
            self.swap.record_last_good(url);
            return DetectionOutcome::RecordedLastGood;
        }

        if !self.swap.try_begin_attempt() {
            debug!(url, "Detected ad playlist, but a swap ran recently");
            return DetectionOutcome::Debounced;
        }

        let Some(handle) = self.swap.pipeline().fetch_and_clean(url).await else {
            return DetectionOutcome::CleanFailed;
        };

        let mut swapped = 0;
        for video in document.videos() {
            if !video.is_attached() {
                continue;
            }
            swap_source(&video, handle.url(), self.resume_delay);
            swapped += 1;
        }
        info!(url, handle = %handle, videos = swapped, "Broadcast cleaned playlist");
        DetectionOutcome::Broadcast(swapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::AdClassifier;
    use crate::dom::VideoElement;
    use crate::hls::pipeline::CleanPipeline;
    use crate::hls::rewriter::AdSegmentStripper;
    use crate::test_support::{FakeDocument, FakeVideo, StaticFetcher, VideoCall};
    use reqwest::StatusCode;

    const AD_PLAYLIST: &str = "#EXTM3U\n#EXTINF:2,\nstitched-1.ts\n#EXTINF:2,\nlive-1.ts";

    fn detector(fetcher: StaticFetcher) -> Arc<PlaylistDetector> {
        let pipeline = Arc::new(CleanPipeline::new(
            Arc::new(fetcher),
            AdSegmentStripper::default(),
        ));
        let swap = Arc::new(SourceSwapController::new(
            AdClassifier::default(),
            pipeline,
            Duration::from_millis(500),
            Duration::from_millis(250),
        ));
        Arc::new(PlaylistDetector::new(
            swap,
            Duration::from_millis(500),
            Duration::from_millis(200),
        ))
    }

    #[tokio::test(start_paused = true)]
    async fn clean_url_becomes_last_good() {
        let detector = detector(StaticFetcher::ok(AD_PLAYLIST));
        let document = FakeDocument::with_videos(Vec::new());
        assert_eq!(
            detector.run_detection("https://cdn/live/index.m3u8", &document).await,
            DetectionOutcome::RecordedLastGood
        );
        assert_eq!(
            detector.swap.last_good().as_deref(),
            Some("https://cdn/live/index.m3u8")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn broadcasts_to_every_attached_video() {
        let fetcher = StaticFetcher::ok(AD_PLAYLIST);
        let detector = detector(fetcher);
        let first = FakeVideo::new("v1", "https://cdn/stitched/a.m3u8");
        let second = FakeVideo::new("v2", "https://cdn/stitched/a.m3u8");
        let gone = FakeVideo::new("v3", "https://cdn/stitched/a.m3u8");
        gone.detach();
        let videos: Vec<Arc<dyn VideoElement>> = vec![first.clone(), second.clone(), gone.clone()];
        let document = FakeDocument::with_videos(videos);

        assert_eq!(
            detector.run_detection("https://cdn/stitched/a.m3u8", &document).await,
            DetectionOutcome::Broadcast(2)
        );
        let handle = detector.swap.pipeline().slot().current().unwrap();
        assert_eq!(first.source().as_deref(), Some(handle.url()));
        assert_eq!(second.source().as_deref(), Some(handle.url()));
        assert!(gone.calls().is_empty());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_ne!(first.calls().last(), Some(&VideoCall::Play));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(first.calls().last(), Some(&VideoCall::Play));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_clean_leaves_videos_alone() {
        let detector = detector(StaticFetcher::status(StatusCode::INTERNAL_SERVER_ERROR));
        let video = FakeVideo::new("v1", "https://cdn/stitched/a.m3u8");
        let document = FakeDocument::with_videos(vec![video.clone() as Arc<dyn VideoElement>]);

        assert_eq!(
            detector.run_detection("https://cdn/stitched/a.m3u8", &document).await,
            DetectionOutcome::CleanFailed
        );
        assert!(video.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn only_the_last_detection_in_a_burst_fires() {
        let fetcher = StaticFetcher::ok(AD_PLAYLIST);
        let detector = detector(fetcher.clone());
        let video = FakeVideo::new("v1", "https://cdn/stitched/a.m3u8");
        let document: Arc<dyn Document> =
            Arc::new(FakeDocument::with_videos(vec![video.clone() as Arc<dyn VideoElement>]));

        detector.on_playlist_detected("https://cdn/stitched/a.m3u8".into(), Arc::clone(&document));
        tokio::time::sleep(Duration::from_millis(300)).await;
        detector.on_playlist_detected("https://cdn/stitched/b.m3u8".into(), Arc::clone(&document));
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(fetcher.requests().is_empty());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(fetcher.requests(), vec!["https://cdn/stitched/b.m3u8".to_string()]);
        assert_eq!(
            video.calls().iter().filter(|c| **c == VideoCall::Load).count(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_detection_never_fires() {
        let fetcher = StaticFetcher::ok(AD_PLAYLIST);
        let detector = detector(fetcher.clone());
        let document: Arc<dyn Document> = Arc::new(FakeDocument::with_videos(Vec::new()));

        detector.on_playlist_detected("https://cdn/stitched/a.m3u8".into(), document);
        detector.cancel_pending();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(fetcher.requests().is_empty());
    }
}
