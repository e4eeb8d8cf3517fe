//! Host markup profile
//!
//! Which selectors identify posts, comments, their body text and the spot
//! next to which the control cluster goes. The default profile targets the
//! current reddit markup; every chain can be replaced from JSON.

use serde::{Deserialize, Serialize};

use crate::selector::{Selector, SelectorChain};
use crate::types::ElementKind;

/// Where a control cluster goes relative to the anchor that was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    /// Inserted as the anchor's next sibling
    After,
    /// Appended as the anchor's last child
    Inside,
}

/// Anchor lookup for one element kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRule {
    pub chain: SelectorChain,
    pub placement: Placement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostProfile {
    pub post: Selector,
    pub comment: Selector,
    /// Media overlay that hides the thread summarizer while open
    pub lightbox: Selector,
    /// Body text slot, shared by posts and comments
    pub body: SelectorChain,
    pub post_anchor: AnchorRule,
    pub comment_anchor: AnchorRule,
    /// Path fragment that marks a thread-detail page
    pub thread_path_marker: String,
}

impl Default for HostProfile {
    fn default() -> Self {
        Self {
            post: Selector::tag("shreddit-post"),
            comment: Selector::tag("shreddit-comment"),
            lightbox: Selector::tag("shreddit-media-lightbox"),
            body: SelectorChain::new(vec![
                Selector::attr("slot", "text-body"),
                Selector::class("usertext-body"),
                Selector::class("md"),
            ]),
            post_anchor: AnchorRule {
                chain: SelectorChain::new(vec![
                    Selector::attr("slot", "ssr-share-button"),
                    Selector::class("share-dropdown-menu"),
                ]),
                placement: Placement::After,
            },
            comment_anchor: AnchorRule {
                chain: SelectorChain::new(vec![
                    Selector::class("comment-actions"),
                    Selector::attr("slot", "comment-actions"),
                    Selector::class("comment-footer"),
                ]),
                placement: Placement::Inside,
            },
            thread_path_marker: "/comments/".to_string(),
        }
    }
}

impl HostProfile {
    pub fn selector_for(&self, kind: ElementKind) -> &Selector {
        match kind {
            ElementKind::Post => &self.post,
            ElementKind::Comment => &self.comment,
        }
    }

    pub fn anchor_for(&self, kind: ElementKind) -> &AnchorRule {
        match kind {
            ElementKind::Post => &self.post_anchor,
            ElementKind::Comment => &self.comment_anchor,
        }
    }

    /// True iff `path` denotes a thread-detail view.
    pub fn is_thread_path(&self, path: &str) -> bool {
        path.contains(&self.thread_path_marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_path() {
        let profile = HostProfile::default();
        assert!(profile.is_thread_path("/r/rust/comments/abc123/some_title/"));
        assert!(!profile.is_thread_path("/r/rust/"));
        assert!(!profile.is_thread_path("/"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let profile: HostProfile = serde_json::from_str(
            r#"{"post": "article", "body": [".post-body"], "threadPathMarker": "/t/"}"#,
        )
        .unwrap();

        assert_eq!(profile.post, Selector::tag("article"));
        assert_eq!(profile.body.selectors(), &[Selector::class("post-body")]);
        assert_eq!(profile.comment, Selector::tag("shreddit-comment"));
        assert_eq!(profile.comment_anchor.placement, Placement::Inside);
        assert!(profile.is_thread_path("/t/42"));
    }
}
