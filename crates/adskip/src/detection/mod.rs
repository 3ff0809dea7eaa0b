// Detection sources: page signals that feed the mitigation paths.

pub mod overlay_scan;
pub mod periodic;
pub mod playlist;
pub mod relay;
pub mod video_watch;

use std::time::Duration;

/// Shortest tick the polling loops accept; `interval_at` rejects zero.
const MIN_TICK: Duration = Duration::from_millis(1);

pub use overlay_scan::{OverlayScanner, ScanOutcome};
pub use periodic::PeriodicScanner;
pub use playlist::{DetectionOutcome, PlaylistDetector};
pub use relay::{RELAY_MARKER, RelayMessage, RelayRoute, RequestKind};
pub use video_watch::VideoWatcher;
