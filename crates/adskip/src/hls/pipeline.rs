// Fetch-and-Clean Pipeline: fetch, validate, rewrite and install a playlist
// as a local handle. Every failure is logged and collapses to `None`.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info};

use crate::config::PLAYLIST_HEADER;
use crate::error::{AdSkipError, Result};
use crate::hls::fetcher::PlaylistFetcher;
use crate::hls::handle::{CleanedResourceHandle, HandleSlot};
use crate::hls::rewriter::AdSegmentStripper;

pub struct CleanPipeline {
    fetcher: Arc<dyn PlaylistFetcher>,
    stripper: AdSegmentStripper,
    slot: HandleSlot,
}

impl CleanPipeline {
    pub fn new(fetcher: Arc<dyn PlaylistFetcher>, stripper: AdSegmentStripper) -> Self {
        Self {
            fetcher,
            stripper,
            slot: HandleSlot::new(),
        }
    }

    pub fn stripper(&self) -> &AdSegmentStripper {
        &self.stripper
    }

    /// Handle store backing the URLs this pipeline hands out.
    pub fn slot(&self) -> &HandleSlot {
        &self.slot
    }

    /// Body behind a handle URL returned by [`Self::fetch_and_clean`].
    pub fn resolve(&self, url: &str) -> Option<Bytes> {
        self.slot.resolve(url)
    }

    /// Fetch `url` and install its cleaned body as the live handle.
    ///
    /// Returns `None` on any transport or format failure; the live handle is
    /// left untouched in that case.
    pub async fn fetch_and_clean(&self, url: &str) -> Option<CleanedResourceHandle> {
        debug!(url, "Fetching playlist for cleaning");
        match self.try_fetch_and_clean(url).await {
            Ok(handle) => Some(handle),
            Err(e) => {
                debug!(url, error = %e, "Fetch-and-clean failed");
                None
            }
        }
    }

    async fn try_fetch_and_clean(&self, url: &str) -> Result<CleanedResourceHandle> {
        let body = self.fetcher.fetch(url).await?;
        if body.is_empty() {
            return Err(AdSkipError::invalid_playlist(url, "empty body"));
        }
        if !body.contains(PLAYLIST_HEADER) {
            return Err(AdSkipError::invalid_playlist(
                url,
                format!("missing {PLAYLIST_HEADER} header"),
            ));
        }

        if !self.stripper.classifier().contains_ad_marker(&body) {
            // Serve even a clean body locally so the player stops re-fetching
            // the remote playlist.
            debug!(url, "Playlist appears clean already");
            return Ok(self.slot.install(body));
        }

        let stripped = self.stripper.strip(&body);
        if stripped.body.trim().is_empty() {
            return Err(AdSkipError::EmptyPlaylist {
                url: url.to_string(),
            });
        }

        let handle = self.slot.install(stripped.body);
        info!(
            url,
            handle = %handle,
            dropped_segments = stripped.report.dropped_uris,
            dropped_dateranges = stripped.report.dropped_dateranges,
            "Created cleaned playlist"
        );
        Ok(handle)
    }
}
