//! Keyword-based URL classification.
//!
//! Matching is plain substring containment over the lower-cased input. There
//! is no word-boundary logic, so short keywords also match inside unrelated
//! words.

use crate::config::AdSkipConfig;

const PLAYLIST_EXTENSION: &str = ".m3u8";

#[derive(Debug, Clone)]
pub struct AdClassifier {
    keywords: Vec<String>,
}

impl Default for AdClassifier {
    fn default() -> Self {
        Self::from_config(&AdSkipConfig::default())
    }
}

impl AdClassifier {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &AdSkipConfig) -> Self {
        Self::new(&config.ad_keywords)
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Returns `true` if the URL contains any configured ad keyword.
    ///
    /// Missing and empty URLs are never ad-likely.
    pub fn is_ad_likely<'a>(&self, url: impl Into<Option<&'a str>>) -> bool {
        match url.into() {
            Some(url) if !url.is_empty() => self.contains_ad_marker(url),
            _ => false,
        }
    }

    /// Keyword test over arbitrary text, e.g. a whole playlist body.
    pub fn contains_ad_marker(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// Returns `true` if the URL points at an HLS playlist.
#[inline]
pub fn is_playlist_url(url: &str) -> bool {
    url.to_lowercase().contains(PLAYLIST_EXTENSION)
}
