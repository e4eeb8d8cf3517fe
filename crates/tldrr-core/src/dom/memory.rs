//! In-memory DOM
//!
//! An arena tree with just enough behaviour to stand in for a document:
//! element and text nodes, attributes, classes, disabled / hidden flags and
//! click-listener registration. Detached nodes stay in the arena.

use std::collections::BTreeMap;

use super::{Dom, DomError};
use crate::selector::Selector;

/// Handle to a node in a [`MemoryDom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

const TEXT_TAG: &str = "#text";

#[derive(Debug, Clone, Default)]
struct Node {
    tag: String,
    text: String,
    attrs: BTreeMap<String, String>,
    classes: Vec<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    disabled: bool,
    hidden: bool,
    rendered: bool,
    background: String,
    listening: bool,
    /// Selector probes on this node fail (used to exercise error isolation)
    poisoned: bool,
}

impl Node {
    fn element(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    fn is_text(&self) -> bool {
        self.tag == TEXT_TAG
    }
}

/// Arena-backed document.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    nodes: Vec<Node>,
    html: NodeId,
    body: NodeId,
    path: String,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new("/")
    }
}

impl MemoryDom {
    /// Empty `<html><body></body></html>` document at `path`.
    pub fn new(path: &str) -> Self {
        let mut dom = Self {
            nodes: vec![Node::element("html")],
            html: NodeId(0),
            body: NodeId(0),
            path: path.to_string(),
        };
        let body = dom.push(Node::element("body"));
        dom.link(dom.html, body, None);
        dom.body = body;
        dom
    }

    pub fn set_location_path(&mut self, path: &str) {
        self.path = path.to_string();
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    /// Create `<tag>` and append it to `parent`.
    pub fn add(&mut self, parent: NodeId, tag: &str) -> NodeId {
        let id = self.push(Node::element(tag));
        self.link(parent, id, None);
        id
    }

    /// Append a text node to `parent`.
    pub fn add_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        let id = self.push(Node {
            tag: TEXT_TAG.to_string(),
            text: text.to_string(),
            ..Node::default()
        });
        self.link(parent, id, None);
        id
    }

    pub fn with_attr(&mut self, id: NodeId, name: &str, value: &str) -> NodeId {
        self.node_mut(id).attrs.insert(name.to_string(), value.to_string());
        id
    }

    pub fn with_class(&mut self, id: NodeId, class: &str) -> NodeId {
        self.set_class(&id, class, true);
        id
    }

    pub fn with_text(&mut self, id: NodeId, text: &str) -> NodeId {
        self.add_text(id, text);
        id
    }

    pub fn set_rendered(&mut self, id: NodeId, rendered: bool) {
        self.node_mut(id).rendered = rendered;
    }

    pub fn set_background(&mut self, id: NodeId, color: &str) {
        self.node_mut(id).background = color.to_string();
    }

    /// Make every selector probe on `id` fail.
    pub fn poison(&mut self, id: NodeId) {
        self.node_mut(id).poisoned = true;
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    pub fn tag(&self, id: NodeId) -> &str {
        &self.node(id).tag
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id).parent?;
        let siblings = &self.node(parent).children;
        let pos = siblings.iter().position(|&c| c == id)?;
        siblings.get(pos + 1).copied()
    }

    pub fn is_listening(&self, id: NodeId) -> bool {
        self.node(id).listening
    }

    /// Root that would receive a click on `target`: the nearest inclusive
    /// ancestor with a registered listener.
    pub fn click_root(&self, target: NodeId) -> Option<NodeId> {
        let mut current = Some(target);
        while let Some(id) = current {
            if self.node(id).listening {
                return Some(id);
            }
            current = self.node(id).parent;
        }
        None
    }

    /// Connected elements matching `selector` anywhere in the document.
    pub fn find_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.query_all(&self.html, selector)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn unlink(&mut self, id: NodeId) {
        if let Some(parent) = self.node_mut(id).parent.take() {
            self.node_mut(parent).children.retain(|&c| c != id);
        }
    }

    /// Attach `child` under `parent` at `index` (end when `None`).
    fn link(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) {
        self.unlink(child);
        self.node_mut(child).parent = Some(parent);
        let children = &mut self.node_mut(parent).children;
        match index {
            Some(i) if i <= children.len() => children.insert(i, child),
            _ => children.push(child),
        }
    }

    fn matches_node(&self, id: NodeId, selector: &Selector) -> bool {
        let node = self.node(id);
        if node.is_text() {
            return false;
        }
        match selector {
            Selector::Tag(tag) => node.tag.eq_ignore_ascii_case(tag),
            Selector::Class(class) => node.classes.iter().any(|c| c == class),
            Selector::Id(value) => node.attrs.get("id").is_some_and(|v| v == value),
            Selector::Attr { name, value } => node.attrs.get(name).is_some_and(|v| v == value),
        }
    }

    fn descendants(&self, scope: NodeId, out: &mut Vec<NodeId>) {
        for &child in &self.node(scope).children {
            out.push(child);
            self.descendants(child, out);
        }
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        if node.is_text() {
            out.push_str(&node.text);
            return;
        }
        for &child in &node.children {
            self.collect_text(child, out);
        }
    }
}

impl Dom for MemoryDom {
    type Element = NodeId;

    fn body(&self) -> NodeId {
        self.body
    }

    fn document_element(&self) -> NodeId {
        self.html
    }

    fn location_path(&self) -> String {
        self.path.clone()
    }

    fn create_element(&mut self, tag: &str) -> Result<NodeId, DomError> {
        if tag.is_empty() {
            return Err(DomError::CreateFailed(tag.to_string()));
        }
        Ok(self.push(Node::element(tag)))
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        if self.node(*parent).is_text() || self.contains(child, parent) {
            return Err(DomError::InsertFailed(format!("{parent:?} <- {child:?}")));
        }
        self.link(*parent, *child, None);
        Ok(())
    }

    fn insert_after(&mut self, reference: &NodeId, node: &NodeId) -> Result<(), DomError> {
        let parent = self.node(*reference).parent.ok_or(DomError::Detached)?;
        if self.contains(node, &parent) {
            return Err(DomError::InsertFailed(format!("{node:?} after {reference:?}")));
        }
        self.unlink(*node);
        let pos = self
            .node(parent)
            .children
            .iter()
            .position(|c| c == reference)
            .ok_or(DomError::Detached)?;
        self.link(parent, *node, Some(pos + 1));
        Ok(())
    }

    fn remove(&mut self, element: &NodeId) {
        self.unlink(*element);
    }

    fn parent(&self, element: &NodeId) -> Option<NodeId> {
        self.node(*element).parent
    }

    fn is_connected(&self, element: &NodeId) -> bool {
        self.contains(&self.html, element)
    }

    fn matches(&self, element: &NodeId, selector: &Selector) -> Result<bool, DomError> {
        if self.node(*element).poisoned {
            return Err(DomError::InvalidSelector(selector.to_string()));
        }
        Ok(self.matches_node(*element, selector))
    }

    fn query(&self, scope: &NodeId, selector: &Selector) -> Option<NodeId> {
        let mut all = Vec::new();
        self.descendants(*scope, &mut all);
        all.into_iter().find(|&id| self.matches_node(id, selector))
    }

    fn query_all(&self, scope: &NodeId, selector: &Selector) -> Vec<NodeId> {
        let mut all = Vec::new();
        self.descendants(*scope, &mut all);
        all.retain(|&id| self.matches_node(id, selector));
        all
    }

    fn text_content(&self, element: &NodeId) -> String {
        let mut out = String::new();
        self.collect_text(*element, &mut out);
        out
    }

    fn set_text(&mut self, element: &NodeId, text: &str) {
        let children = std::mem::take(&mut self.node_mut(*element).children);
        for child in children {
            self.node_mut(child).parent = None;
        }
        if !text.is_empty() {
            self.add_text(*element, text);
        }
    }

    fn attribute(&self, element: &NodeId, name: &str) -> Option<String> {
        let node = self.node(*element);
        if name == "class" {
            return (!node.classes.is_empty()).then(|| node.classes.join(" "));
        }
        node.attrs.get(name).cloned()
    }

    fn set_attribute(&mut self, element: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
        if name.is_empty() {
            return Err(DomError::InvalidSelector(name.to_string()));
        }
        let node = self.node_mut(*element);
        if name == "class" {
            node.classes = value.split_whitespace().map(str::to_string).collect();
        } else {
            node.attrs.insert(name.to_string(), value.to_string());
        }
        Ok(())
    }

    fn has_class(&self, element: &NodeId, class: &str) -> bool {
        self.node(*element).classes.iter().any(|c| c == class)
    }

    fn set_class(&mut self, element: &NodeId, class: &str, on: bool) {
        let classes = &mut self.node_mut(*element).classes;
        let present = classes.iter().any(|c| c == class);
        if on && !present {
            classes.push(class.to_string());
        } else if !on {
            classes.retain(|c| c != class);
        }
    }

    fn is_disabled(&self, element: &NodeId) -> bool {
        self.node(*element).disabled
    }

    fn set_disabled(&mut self, element: &NodeId, disabled: bool) {
        self.node_mut(*element).disabled = disabled;
    }

    fn is_hidden(&self, element: &NodeId) -> bool {
        self.node(*element).hidden
    }

    fn set_hidden(&mut self, element: &NodeId, hidden: bool) {
        self.node_mut(*element).hidden = hidden;
    }

    fn is_rendered(&self, element: &NodeId) -> bool {
        let node = self.node(*element);
        node.rendered && !node.hidden
    }

    fn background_color(&self, element: &NodeId) -> String {
        let background = &self.node(*element).background;
        if background.is_empty() {
            "rgba(0, 0, 0, 0)".to_string()
        } else {
            background.clone()
        }
    }

    fn listen_clicks(&mut self, root: &NodeId) {
        self.node_mut(*root).listening = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_document_order_and_excludes_scope() {
        let mut dom = MemoryDom::default();
        let body = dom.body();
        let outer = dom.add(body, "div");
        dom.with_class(outer, "md");
        let first = dom.add(outer, "p");
        dom.with_class(first, "md");
        let second = dom.add(body, "p");
        dom.with_class(second, "md");

        assert_eq!(dom.query(&outer, &Selector::class("md")), Some(first));
        assert_eq!(dom.query_all(&body, &Selector::class("md")), vec![outer, first, second]);
    }

    #[test]
    fn test_text_content_concatenates_in_order() {
        let mut dom = MemoryDom::default();
        let body = dom.body();
        let p = dom.add(body, "p");
        dom.add_text(p, "Hello ");
        let b = dom.add(p, "b");
        dom.add_text(b, "bold");
        dom.add_text(p, " world");
        assert_eq!(dom.text_content(&p), "Hello bold world");

        dom.set_text(&p, "replaced");
        assert_eq!(dom.text_content(&p), "replaced");
        assert!(!dom.is_connected(&b));
    }

    #[test]
    fn test_insert_after_and_remove() {
        let mut dom = MemoryDom::default();
        let body = dom.body();
        let a = dom.add(body, "a");
        let c = dom.add(body, "c");
        let b = dom.create_element("b").unwrap();
        dom.insert_after(&a, &b).unwrap();
        assert_eq!(dom.children(body), &[a, b, c]);
        assert_eq!(dom.next_sibling(b), Some(c));

        dom.remove(&b);
        assert!(!dom.is_connected(&b));
        dom.remove(&b);
        assert_eq!(dom.children(body), &[a, c]);
    }

    #[test]
    fn test_insert_after_detached_reference() {
        let mut dom = MemoryDom::default();
        let lonely = dom.create_element("div").unwrap();
        let node = dom.create_element("span").unwrap();
        assert_eq!(dom.insert_after(&lonely, &node), Err(DomError::Detached));
    }

    #[test]
    fn test_closest_and_click_root() {
        let mut dom = MemoryDom::default();
        let body = dom.body();
        let cluster = dom.add(body, "div");
        dom.with_class(cluster, "cluster");
        let button = dom.add(cluster, "button");
        let icon = dom.add(button, "span");
        dom.listen_clicks(&cluster);

        assert_eq!(dom.closest(&icon, &Selector::class("cluster")), Some(cluster));
        assert_eq!(dom.click_root(icon), Some(cluster));
        assert_eq!(dom.click_root(body), None);
    }

    #[test]
    fn test_get_element_by_id() {
        let mut dom = MemoryDom::default();
        let body = dom.body();
        let el = dom.add(body, "div");
        dom.with_attr(el, "id", "tdlrr-toolbar");
        assert_eq!(dom.get_element_by_id("tdlrr-toolbar"), Some(el));
        dom.remove(&el);
        assert_eq!(dom.get_element_by_id("tdlrr-toolbar"), None);
    }
}
