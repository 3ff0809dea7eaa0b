// Playlist handling: fetch, rewrite and serve cleaned HLS playlists

pub mod fetcher;
pub mod handle;
pub mod pipeline;
pub mod rewriter;

pub use fetcher::{HttpPlaylistFetcher, PlaylistFetcher};
pub use handle::{CleanedResourceHandle, HandleSlot};
pub use pipeline::CleanPipeline;
pub use rewriter::{
    AdSegmentStripper, LineKind, PlaylistDocument, PlaylistSummary, StripReport, StrippedPlaylist,
    strip_ad_segments,
};
