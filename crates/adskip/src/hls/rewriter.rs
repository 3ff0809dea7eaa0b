// Playlist Rewriter: removes ad segments from a media playlist in a single pass.
//
// Untouched lines are copied byte for byte; only the line separator is
// normalized to "\n".

use m3u8_rs::{Playlist, parse_playlist_res};

use crate::classifier::AdClassifier;
use crate::config::{AdSkipConfig, PLAYLIST_HEADER};

const SEGMENT_INFO_TAG: &str = "#EXTINF";
const DATERANGE_TAG: &str = "#EXT-X-DATERANGE";

/// Classification of a single playlist line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `#EXTM3U`
    Header,
    /// `#EXTINF`, the per-segment metadata preceding a URI
    SegmentInfo,
    /// `#EXT-X-DATERANGE`
    DateRange,
    /// Any other `#`-prefixed tag or comment
    Tag,
    /// Segment or variant URI
    Uri,
    Blank,
}

impl LineKind {
    pub fn of(line: &str) -> Self {
        if line.starts_with(PLAYLIST_HEADER) {
            LineKind::Header
        } else if line.starts_with(SEGMENT_INFO_TAG) {
            LineKind::SegmentInfo
        } else if line.starts_with(DATERANGE_TAG) {
            LineKind::DateRange
        } else if line.starts_with('#') {
            LineKind::Tag
        } else if line.is_empty() {
            LineKind::Blank
        } else {
            LineKind::Uri
        }
    }
}

/// A playlist body split into lines, with `\r\n` and `\n` both accepted.
#[derive(Debug, Clone)]
pub struct PlaylistDocument<'a> {
    lines: Vec<&'a str>,
}

impl<'a> PlaylistDocument<'a> {
    pub fn parse(text: &'a str) -> Self {
        let lines = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> impl Iterator<Item = (LineKind, &'a str)> + '_ {
        self.lines.iter().map(|line| (LineKind::of(line), *line))
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Reassemble with `\n` separators.
    pub fn to_normalized(&self) -> String {
        self.lines.join("\n")
    }
}

/// What a rewrite pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StripReport {
    pub dropped_uris: usize,
    pub dropped_segment_infos: usize,
    pub dropped_dateranges: usize,
}

impl StripReport {
    pub fn is_unchanged(&self) -> bool {
        self.dropped_uris == 0 && self.dropped_segment_infos == 0 && self.dropped_dateranges == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedPlaylist {
    pub body: String,
    pub report: StripReport,
}

#[derive(Debug, Clone)]
pub struct AdSegmentStripper {
    classifier: AdClassifier,
    /// Lower-cased `class="..."` attributes marking ad date ranges
    daterange_markers: Vec<String>,
}

impl Default for AdSegmentStripper {
    fn default() -> Self {
        Self::from_config(&AdSkipConfig::default())
    }
}

impl AdSegmentStripper {
    pub fn new<I, S>(classifier: AdClassifier, daterange_classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let daterange_markers = daterange_classes
            .into_iter()
            .map(|class| format!("class=\"{}\"", class.as_ref().to_lowercase()))
            .collect();
        Self {
            classifier,
            daterange_markers,
        }
    }

    pub fn from_config(config: &AdSkipConfig) -> Self {
        Self::new(
            AdClassifier::from_config(config),
            &config.ad_daterange_classes,
        )
    }

    pub fn classifier(&self) -> &AdClassifier {
        &self.classifier
    }

    fn is_ad_daterange(&self, line: &str) -> bool {
        let lowered = line.to_lowercase();
        self.daterange_markers
            .iter()
            .any(|marker| lowered.contains(marker.as_str()))
    }

    /// Drop ad URI lines together with the `#EXTINF` line retained right
    /// before them, and drop ad-classed `#EXT-X-DATERANGE` tags.
    pub fn strip(&self, text: &str) -> StrippedPlaylist {
        let document = PlaylistDocument::parse(text);
        let mut out: Vec<&str> = Vec::with_capacity(document.len());
        let mut report = StripReport::default();

        for (kind, line) in document.lines() {
            match kind {
                LineKind::Uri if self.classifier.contains_ad_marker(line) => {
                    report.dropped_uris += 1;
                    if out
                        .last()
                        .is_some_and(|prev| prev.starts_with(SEGMENT_INFO_TAG))
                    {
                        out.pop();
                        report.dropped_segment_infos += 1;
                    }
                }
                LineKind::DateRange if self.is_ad_daterange(line) => {
                    report.dropped_dateranges += 1;
                }
                _ => out.push(line),
            }
        }

        StrippedPlaylist {
            body: out.join("\n"),
            report,
        }
    }
}

/// Strip ad segments using the default keyword set.
pub fn strip_ad_segments(text: &str) -> String {
    AdSegmentStripper::default().strip(text).body
}

/// Segment-level view of a playlist body, for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaylistSummary {
    Master {
        variants: usize,
    },
    Media {
        segments: usize,
        target_duration: f64,
        total_duration: f64,
        ended: bool,
    },
}

impl PlaylistSummary {
    pub fn parse(body: &str) -> Option<Self> {
        match parse_playlist_res(body.as_bytes()) {
            Ok(Playlist::MasterPlaylist(pl)) => Some(PlaylistSummary::Master {
                variants: pl.variants.len(),
            }),
            Ok(Playlist::MediaPlaylist(pl)) => Some(PlaylistSummary::Media {
                segments: pl.segments.len(),
                target_duration: pl.target_duration as f64,
                total_duration: pl.segments.iter().map(|s| s.duration as f64).sum(),
                ended: pl.end_list,
            }),
            Err(_) => None,
        }
    }
}
