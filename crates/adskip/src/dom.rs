//! Host page abstractions.
//!
//! The engine never touches a real page. A browser binding (or a test fake)
//! implements these traits and forwards page events to
//! [`crate::AdSkipEngine`].

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// A media element playing the stream.
#[async_trait]
pub trait VideoElement: Send + Sync {
    /// Stable identity of the element for the lifetime of the page.
    fn id(&self) -> String;

    /// The resolved source, falling back to the declared one.
    fn current_source(&self) -> Option<String>;

    fn set_source(&self, url: &str);

    fn pause(&self);

    /// Restart the media pipeline after a source change.
    fn load(&self);

    /// Resume playback. May fail when the page requires a user gesture.
    async fn play(&self) -> Result<()>;

    /// Media duration in seconds. `NaN` when unknown, infinite for live media.
    fn duration(&self) -> f64;

    fn current_time(&self) -> f64;

    fn set_current_time(&self, secs: f64);

    /// Whether the element is still part of its document.
    fn is_attached(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
    /// Documents, shadow roots and other fragments
    Fragment,
    Other,
}

/// Result of trying to enter a nested document.
pub enum SubtreeAccess {
    Accessible(Arc<dyn DomNode>),
    /// The document exists but lies behind an origin boundary.
    Restricted,
    /// The node does not embed a document.
    Absent,
}

pub trait DomNode: Send + Sync {
    fn kind(&self) -> NodeKind;

    /// Upper-case tag name for elements.
    fn tag_name(&self) -> Option<String> {
        None
    }

    /// Rendered text of the node and its descendants.
    fn rendered_text(&self) -> Option<String> {
        None
    }

    fn class_name(&self) -> Option<String> {
        None
    }

    fn children(&self) -> Vec<Arc<dyn DomNode>>;

    fn shadow_root(&self) -> Option<Arc<dyn DomNode>> {
        None
    }

    fn embedded_document(&self) -> SubtreeAccess {
        SubtreeAccess::Absent
    }

    /// The media element behind this node, if it is a `<video>`.
    fn as_video(&self) -> Option<Arc<dyn VideoElement>> {
        None
    }

    fn is_embedding_frame(&self) -> bool {
        self.tag_name().as_deref() == Some("IFRAME")
    }
}

pub trait Document: Send + Sync {
    /// All video elements, in document order.
    fn videos(&self) -> Vec<Arc<dyn VideoElement>>;

    fn first_video(&self) -> Option<Arc<dyn VideoElement>> {
        self.videos().into_iter().next()
    }

    fn query_selector(&self, selector: &str) -> Option<Arc<dyn DomNode>>;
}

/// Collect `node` itself if it is a video, otherwise every video below it.
pub fn videos_within(node: &Arc<dyn DomNode>) -> Vec<Arc<dyn VideoElement>> {
    if let Some(video) = node.as_video() {
        return vec![video];
    }
    let mut found = Vec::new();
    let mut stack = node.children();
    stack.reverse();
    while let Some(current) = stack.pop() {
        if let Some(video) = current.as_video() {
            found.push(video);
        }
        let mut children = current.children();
        children.reverse();
        stack.extend(children);
    }
    found
}
