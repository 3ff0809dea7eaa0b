//! Messages relayed from the page-context network shim.
//!
//! The shim hooks outbound fetch/XHR calls and posts
//! `{"__adskip_relay": true, "type": "fetch", "url": "..."}` onto the page's
//! message bus. Anything without the marker belongs to the page and is
//! ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classifier::{AdClassifier, is_playlist_url};

/// Field that tags a page message as coming from the shim.
pub const RELAY_MARKER: &str = "__adskip_relay";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Fetch,
    Xhr,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMessage {
    #[serde(rename = "__adskip_relay")]
    pub marker: bool,
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub url: String,
}

impl RelayMessage {
    pub fn new(kind: RequestKind, url: impl Into<String>) -> Self {
        Self {
            marker: true,
            kind,
            url: url.into(),
        }
    }

    /// Decode a page message, returning `None` for anything that is not a
    /// well-formed relay event.
    pub fn decode(value: &Value) -> Option<Self> {
        if value.get(RELAY_MARKER).and_then(Value::as_bool) != Some(true) {
            return None;
        }
        serde_json::from_value::<RelayMessage>(value.clone())
            .ok()
            .filter(|message| !message.url.is_empty())
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Shim-side filter: which observed calls are worth relaying.
///
/// The engine never calls this; it is exported for page-context bindings that
/// wrap `fetch`/XHR and decide what to post back as a [`RelayMessage`].
pub fn should_relay(classifier: &AdClassifier, url: &str) -> bool {
    !url.is_empty()
        && (classifier.is_ad_likely(url)
            || url.to_lowercase().contains("/ad")
            || is_playlist_url(url))
}

/// Where a relayed URL goes inside the content context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayRoute {
    /// Playlist fetch: hand to the debounced detector.
    Playlist(String),
    /// Ad-related request that is not a playlist; only logged.
    AdRequest(String),
    Ignore,
}

pub fn route(classifier: &AdClassifier, message: &RelayMessage) -> RelayRoute {
    if is_playlist_url(&message.url) {
        RelayRoute::Playlist(message.url.clone())
    } else if classifier.is_ad_likely(message.url.as_str()) {
        RelayRoute::AdRequest(message.url.clone())
    } else {
        RelayRoute::Ignore
    }
}
