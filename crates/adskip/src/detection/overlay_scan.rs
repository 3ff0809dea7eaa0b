// DOM overlay scanner: recursive text/class heuristics over added nodes,
// descending into shadow roots and same-origin embedded documents.

use std::sync::Arc;

use tracing::debug;

use crate::config::AdSkipConfig;
use crate::dom::{DomNode, NodeKind, SubtreeAccess};

#[derive(Debug, Clone)]
pub struct OverlayScanner {
    text_keywords: Vec<String>,
}

/// Result of scanning one batch of added nodes.
#[derive(Default)]
pub struct ScanOutcome {
    pub overlay_found: bool,
    /// Embedded-document hosts seen before the first match, for the host to
    /// subscribe to.
    pub embedded_frames: Vec<Arc<dyn DomNode>>,
}

impl Default for OverlayScanner {
    fn default() -> Self {
        Self::from_config(&AdSkipConfig::default())
    }
}

impl OverlayScanner {
    pub fn new<I, S>(text_keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            text_keywords: text_keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn from_config(config: &AdSkipConfig) -> Self {
        Self::new(&config.overlay_keywords)
    }

    fn element_matches(&self, node: &dyn DomNode) -> bool {
        if let Some(text) = node.rendered_text() {
            let text = text.to_lowercase();
            if self.text_keywords.iter().any(|k| text.contains(k.as_str())) {
                return true;
            }
        }
        if let Some(class) = node.class_name() {
            let class = class.to_lowercase();
            if class.contains("ad") && !class.contains("container") {
                return true;
            }
            if class.contains("commercial") || class.contains("promo") {
                return true;
            }
        }
        false
    }

    /// Returns `true` if `node` or anything reachable below it looks like an
    /// ad overlay.
    pub fn check_node(&self, node: &Arc<dyn DomNode>) -> bool {
        if node.kind() == NodeKind::Element && self.element_matches(node.as_ref()) {
            return true;
        }
        if node.children().iter().any(|child| self.check_node(child)) {
            return true;
        }
        if let Some(shadow) = node.shadow_root()
            && self.check_node(&shadow)
        {
            return true;
        }
        match node.embedded_document() {
            SubtreeAccess::Accessible(document) => self.check_node(&document),
            SubtreeAccess::Restricted => {
                debug!("Skipping cross-origin embedded document");
                false
            }
            SubtreeAccess::Absent => false,
        }
    }

    /// Scan a batch of added nodes, stopping at the first overlay.
    pub fn scan_added(&self, nodes: &[Arc<dyn DomNode>]) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        for node in nodes {
            if self.check_node(node) {
                outcome.overlay_found = true;
                break;
            }
            if node.is_embedding_frame() {
                outcome.embedded_frames.push(Arc::clone(node));
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeNode;

    #[test]
    fn matches_text_and_class_signals() {
        let scanner = OverlayScanner::default();
        assert!(scanner.check_node(&FakeNode::element("DIV").text("Sponsored").build()));
        assert!(scanner.check_node(&FakeNode::element("DIV").class("player-ad-banner").build()));
        assert!(scanner.check_node(&FakeNode::element("DIV").class("promo-slot").build()));
        assert!(!scanner.check_node(&FakeNode::element("DIV").class("ad-container").build()));
        assert!(!scanner.check_node(&FakeNode::element("DIV").text("Welcome!").build()));
    }

    #[test]
    fn text_nodes_are_not_matched_directly() {
        let scanner = OverlayScanner::default();
        assert!(!scanner.check_node(&FakeNode::text_node("commercial break")));
    }

    #[test]
    fn descends_into_children_and_shadow_roots() {
        let scanner = OverlayScanner::default();
        let nested = FakeNode::element("DIV")
            .child(FakeNode::element("SPAN").class("commercial").build())
            .build();
        assert!(scanner.check_node(&nested));

        let shadow_host = FakeNode::element("TW-PLAYER")
            .shadow(FakeNode::fragment(vec![FakeNode::element("DIV").text("Advert").build()]))
            .build();
        assert!(scanner.check_node(&shadow_host));
    }

    #[test]
    fn enters_accessible_frames_and_skips_restricted_ones() {
        let scanner = OverlayScanner::default();
        let inner = FakeNode::fragment(vec![FakeNode::element("DIV").class("ad-overlay").build()]);
        let open_frame = FakeNode::element("IFRAME").frame(Some(inner)).build();
        assert!(scanner.check_node(&open_frame));

        let closed_frame = FakeNode::element("IFRAME").frame(None).build();
        assert!(!scanner.check_node(&closed_frame));
    }

    #[test]
    fn batch_stops_at_first_match_and_reports_frames() {
        let scanner = OverlayScanner::default();
        let frame = FakeNode::element("IFRAME").frame(None).build();
        let overlay = FakeNode::element("DIV").class("video-player__ad-overlay").build();
        let later_frame = FakeNode::element("IFRAME").frame(None).build();

        let outcome = scanner.scan_added(&[frame, overlay, later_frame]);
        assert!(outcome.overlay_found);
        assert_eq!(outcome.embedded_frames.len(), 1);

        let quiet = scanner.scan_added(&[FakeNode::element("P").text("hello").build()]);
        assert!(!quiet.overlay_found);
        assert!(quiet.embedded_frames.is_empty());
    }
}
