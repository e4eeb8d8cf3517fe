//! Page Observer
//!
//! Turns batches of inserted nodes into discovered posts and comments, and
//! tracks whether the media overlay is open. The host feeds it from a
//! subtree `MutationObserver` on the body; the observer itself keeps no
//! per-element state, attachment idempotency lives on the elements.

use crate::dom::Dom;
use crate::profile::HostProfile;
use crate::types::ElementKind;

/// A post or comment found on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Discovered<E> {
    pub element: E,
    pub kind: ElementKind,
}

#[derive(Debug, Default)]
pub struct PageObserver {
    overlay_open: Option<bool>,
}

impl PageObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every post, then every comment, under `root`.
    pub fn scan<D: Dom>(&self, dom: &D, profile: &HostProfile, root: &D::Element) -> Vec<Discovered<D::Element>> {
        let mut found = Vec::new();
        for kind in [ElementKind::Post, ElementKind::Comment] {
            for element in dom.query_all(root, profile.selector_for(kind)) {
                push_unique(&mut found, element, kind);
            }
        }
        found
    }

    /// Targets among a batch of added nodes and their descendants.
    ///
    /// Nodes nested inside another node of the same batch are not scanned
    /// again, and nodes already detached by the time the batch is delivered
    /// are ignored. A node whose match check fails is skipped on its own;
    /// its descendants and the rest of the batch are still processed.
    pub fn discover<D: Dom>(&self, dom: &D, profile: &HostProfile, added: &[D::Element]) -> Vec<Discovered<D::Element>> {
        let mut found = Vec::new();

        for node in added {
            if !dom.is_connected(node) || has_ancestor_in(dom, node, added) {
                continue;
            }

            for kind in [ElementKind::Post, ElementKind::Comment] {
                match dom.matches(node, profile.selector_for(kind)) {
                    Ok(true) => push_unique(&mut found, node.clone(), kind),
                    Ok(false) => {}
                    Err(e) => {
                        log::warn!("observer: skipping node {node:?}: {e}");
                        break;
                    }
                }
            }

            for discovered in self.scan(dom, profile, node) {
                push_unique(&mut found, discovered.element, discovered.kind);
            }
        }

        found
    }

    /// Re-evaluate the overlay. Returns the new state when it changed since
    /// the last call (the first call always reports).
    pub fn overlay_visibility<D: Dom>(&mut self, dom: &D, profile: &HostProfile) -> Option<bool> {
        let root = dom.document_element();
        let open = dom
            .query(&root, &profile.lightbox)
            .map(|lightbox| {
                !dom.is_hidden(&lightbox)
                    && (dom.has_class(&lightbox, "visible") || dom.is_rendered(&lightbox))
            })
            .unwrap_or(false);

        if self.overlay_open == Some(open) {
            return None;
        }
        self.overlay_open = Some(open);
        Some(open)
    }
}

/// One walk up from `node`; each ancestor is compared against the batch.
fn has_ancestor_in<D: Dom>(dom: &D, node: &D::Element, batch: &[D::Element]) -> bool {
    let mut current = dom.parent(node);
    while let Some(ancestor) = current {
        if batch.contains(&ancestor) {
            return true;
        }
        current = dom.parent(&ancestor);
    }
    false
}

fn push_unique<E: PartialEq>(found: &mut Vec<Discovered<E>>, element: E, kind: ElementKind) {
    if !found.iter().any(|d| d.element == element) {
        found.push(Discovered { element, kind });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;

    fn elements(found: &[Discovered<crate::dom::NodeId>]) -> Vec<crate::dom::NodeId> {
        found.iter().map(|d| d.element).collect()
    }

    #[test]
    fn test_discovers_self_and_descendants() {
        let mut dom = MemoryDom::default();
        let body = dom.body();
        let wrapper = dom.add(body, "div");
        let post = dom.add(wrapper, "shreddit-post");
        let comment = dom.add(wrapper, "shreddit-comment");
        let nested = dom.add(comment, "shreddit-comment");
        let observer = PageObserver::new();

        let found = observer.discover(&dom, &HostProfile::default(), &[wrapper]);
        assert_eq!(elements(&found), vec![post, comment, nested]);
        assert_eq!(found[0].kind, ElementKind::Post);
        assert_eq!(found[2].kind, ElementKind::Comment);

        let found = observer.discover(&dom, &HostProfile::default(), &[nested]);
        assert_eq!(elements(&found), vec![nested]);
    }

    #[test]
    fn test_nested_batch_members_reported_once() {
        let mut dom = MemoryDom::default();
        let body = dom.body();
        let comment = dom.add(body, "shreddit-comment");
        let child = dom.add(comment, "shreddit-comment");
        let observer = PageObserver::new();

        let found = observer.discover(&dom, &HostProfile::default(), &[comment, child, comment]);
        assert_eq!(elements(&found), vec![comment, child]);
    }

    #[test]
    fn test_large_batch_skips_only_nested_members() {
        let mut dom = MemoryDom::default();
        let body = dom.body();
        let mut batch = Vec::new();
        let mut expected = Vec::new();
        for _ in 0..200 {
            let wrapper = dom.add(body, "div");
            let comment = dom.add(wrapper, "shreddit-comment");
            let reply = dom.add(comment, "shreddit-comment");
            batch.extend([reply, comment, wrapper]);
            expected.extend([comment, reply]);
        }
        let observer = PageObserver::new();

        let found = observer.discover(&dom, &HostProfile::default(), &batch);
        let mut got = elements(&found);
        got.sort();
        expected.sort();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_detached_nodes_ignored() {
        let mut dom = MemoryDom::default();
        let body = dom.body();
        let post = dom.add(body, "shreddit-post");
        dom.remove(&post);
        let observer = PageObserver::new();
        assert!(observer.discover(&dom, &HostProfile::default(), &[post]).is_empty());
    }

    #[test]
    fn test_failing_match_is_isolated() {
        let mut dom = MemoryDom::default();
        let body = dom.body();
        let bad = dom.add(body, "shreddit-post");
        let inner = dom.add(bad, "shreddit-comment");
        let good = dom.add(body, "shreddit-comment");
        dom.poison(bad);
        let observer = PageObserver::new();

        let found = observer.discover(&dom, &HostProfile::default(), &[bad, good]);
        assert_eq!(elements(&found), vec![inner, good]);
    }

    #[test]
    fn test_overlay_visibility_reports_changes_only() {
        let mut dom = MemoryDom::default();
        let body = dom.body();
        let mut observer = PageObserver::new();
        let profile = HostProfile::default();

        assert_eq!(observer.overlay_visibility(&dom, &profile), Some(false));
        assert_eq!(observer.overlay_visibility(&dom, &profile), None);

        let lightbox = dom.add(body, "shreddit-media-lightbox");
        assert_eq!(observer.overlay_visibility(&dom, &profile), None);

        dom.set_rendered(lightbox, true);
        assert_eq!(observer.overlay_visibility(&dom, &profile), Some(true));

        dom.set_hidden(&lightbox, true);
        assert_eq!(observer.overlay_visibility(&dom, &profile), Some(false));

        dom.set_hidden(&lightbox, false);
        dom.set_rendered(lightbox, false);
        dom.with_class(lightbox, "visible");
        assert_eq!(observer.overlay_visibility(&dom, &profile), Some(true));
    }
}
