//! Per-page controller.
//!
//! One [`AdSkipEngine`] is built for each content context. It owns every
//! piece of mutable state (activation mirror, last good playlist, debounce
//! clock, live handle) and is the single entry point for page events.

use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::classifier::AdClassifier;
use crate::config::AdSkipConfig;
use crate::control::local::ActivationFlag;
use crate::control::protocol::{ControlAction, ControlResponse};
use crate::detection::overlay_scan::{OverlayScanner, ScanOutcome};
use crate::detection::periodic::PeriodicScanner;
use crate::detection::playlist::PlaylistDetector;
use crate::detection::relay::{self, RelayMessage, RelayRoute};
use crate::detection::video_watch::VideoWatcher;
use crate::dom::{Document, DomNode, VideoElement, videos_within};
use crate::error::Result;
use crate::hls::fetcher::{HttpPlaylistFetcher, PlaylistFetcher};
use crate::hls::pipeline::CleanPipeline;
use crate::hls::rewriter::AdSegmentStripper;
use crate::mitigation::overlay::{OverlayMitigator, OverlayOutcome};
use crate::mitigation::swap::SourceSwapController;

/// Point-in-time view of the engine state, for debugging hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineSnapshot {
    pub active: bool,
    pub last_good_playlist: Option<String>,
    pub cleaned_handle: Option<String>,
    pub watched_videos: usize,
}

pub struct AdSkipEngine {
    classifier: AdClassifier,
    document: Arc<dyn Document>,
    active: ActivationFlag,
    pipeline: Arc<CleanPipeline>,
    swap: Arc<SourceSwapController>,
    mitigator: Arc<OverlayMitigator>,
    scanner: OverlayScanner,
    detector: Arc<PlaylistDetector>,
    watcher: Arc<VideoWatcher>,
    periodic: Arc<PeriodicScanner>,
    token: CancellationToken,
}

impl AdSkipEngine {
    pub fn new(
        config: &AdSkipConfig,
        fetcher: Arc<dyn PlaylistFetcher>,
        document: Arc<dyn Document>,
        active: ActivationFlag,
    ) -> Self {
        let classifier = AdClassifier::from_config(config);
        let pipeline = Arc::new(CleanPipeline::new(
            fetcher,
            AdSegmentStripper::from_config(config),
        ));
        let swap = Arc::new(SourceSwapController::new(
            classifier.clone(),
            Arc::clone(&pipeline),
            config.swap_debounce(),
            config.swap_resume_delay(),
        ));
        let mitigator = Arc::new(OverlayMitigator::new(Arc::clone(&swap), config.skip.clone()));
        let scanner = OverlayScanner::from_config(config);
        let detector = Arc::new(PlaylistDetector::new(
            Arc::clone(&swap),
            config.detection_quiet(),
            config.broadcast_resume_delay(),
        ));
        let watcher = Arc::new(VideoWatcher::new(
            Arc::clone(&swap),
            config.video_poll_interval(),
            active.clone(),
        ));
        let periodic = Arc::new(PeriodicScanner::new(
            scanner.clone(),
            config.overlay_selectors.clone(),
            config.periodic_scan_interval(),
            Arc::clone(&mitigator),
            active.clone(),
        ));

        Self {
            classifier,
            document,
            active,
            pipeline,
            swap,
            mitigator,
            scanner,
            detector,
            watcher,
            periodic,
            token: CancellationToken::new(),
        }
    }

    /// Build an engine that fetches playlists over HTTP.
    pub fn with_http(
        config: &AdSkipConfig,
        document: Arc<dyn Document>,
        active: ActivationFlag,
    ) -> Result<Self> {
        let fetcher = Arc::new(HttpPlaylistFetcher::from_config(config)?);
        Ok(Self::new(config, fetcher, document, active))
    }

    pub fn activation(&self) -> &ActivationFlag {
        &self.active
    }

    /// Watch the videos already on the page and start the periodic scan.
    pub fn start(&self) {
        let videos = self.document.videos();
        debug!(videos = videos.len(), "Starting ad skip engine");
        for video in videos {
            self.watch_video(video);
        }

        let periodic = Arc::clone(&self.periodic);
        let document = Arc::clone(&self.document);
        let token = self.token.child_token();
        tokio::spawn(async move { periodic.run(document, token).await });
        info!(active = self.active.is_active(), "Ad skip engine started");
    }

    pub fn watch_video(&self, video: Arc<dyn VideoElement>) -> bool {
        self.watcher.watch(video, self.token.child_token())
    }

    /// Handle a message posted on the page's message bus.
    pub fn on_relay_message(&self, message: &Value) -> RelayRoute {
        let Some(message) = RelayMessage::decode(message) else {
            return RelayRoute::Ignore;
        };
        if !self.active.is_active() {
            trace!(url = %message.url, "Ignoring relayed request while inactive");
            return RelayRoute::Ignore;
        }

        let route = relay::route(&self.classifier, &message);
        match &route {
            RelayRoute::Playlist(url) => {
                debug!(url = %url, kind = ?message.kind, "Relayed playlist request");
                self.detector
                    .on_playlist_detected(url.clone(), Arc::clone(&self.document));
            }
            RelayRoute::AdRequest(url) => {
                debug!(url = %url, kind = ?message.kind, "Relayed ad request");
            }
            RelayRoute::Ignore => {}
        }
        route
    }

    /// Handle a batch of nodes inserted into the page.
    ///
    /// New videos are watched regardless of activation. The returned outcome
    /// lists embedded documents the host should observe too.
    pub async fn on_nodes_added(&self, nodes: &[Arc<dyn DomNode>]) -> ScanOutcome {
        for node in nodes {
            for video in videos_within(node) {
                self.watch_video(video);
            }
        }

        if !self.active.is_active() {
            return ScanOutcome::default();
        }

        let outcome = self.scanner.scan_added(nodes);
        if outcome.overlay_found {
            info!("Ad overlay inserted into the page");
            self.mitigator.on_overlay_detected(self.document.as_ref()).await;
        }
        outcome
    }

    /// Run overlay mitigation now. `None` while inactive.
    pub async fn on_overlay_detected(&self) -> Option<OverlayOutcome> {
        if !self.active.is_active() {
            return None;
        }
        Some(self.mitigator.on_overlay_detected(self.document.as_ref()).await)
    }

    /// Apply a control request to this content context.
    ///
    /// Malformed requests are left for the background service to answer.
    pub fn handle_control(&self, request: &Value) -> Option<ControlResponse> {
        match ControlAction::decode(request) {
            Ok(action) => Some(self.active.apply(action)),
            Err(code) => {
                trace!(code, "Control request not for the content context");
                None
            }
        }
    }

    /// Body behind a cleaned playlist URL handed to a video.
    pub fn resolve_handle(&self, url: &str) -> Option<Bytes> {
        self.pipeline.resolve(url)
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            active: self.active.is_active(),
            last_good_playlist: self.swap.last_good(),
            cleaned_handle: self.pipeline.slot().current().map(|h| h.url().to_owned()),
            watched_videos: self.watcher.watched_count(),
        }
    }

    /// Stop every background task and free the live handle.
    pub fn shutdown(&self) {
        self.token.cancel();
        self.detector.cancel_pending();
        self.pipeline.slot().release();
        info!("Ad skip engine stopped");
    }
}

impl Drop for AdSkipEngine {
    fn drop(&mut self) {
        self.token.cancel();
        self.detector.cancel_pending();
    }
}
