//! DOM abstraction
//!
//! The controller only ever touches the page through [`Dom`]. The wasm
//! crate implements it over `web-sys`; [`MemoryDom`] implements it over an
//! arena tree for tests and for the CLI's offline thread collection.

mod memory;

pub use memory::{MemoryDom, NodeId};

use std::fmt;

use crate::selector::Selector;

/// Error type for DOM operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Failed to create <{0}>")]
    CreateFailed(String),
    #[error("Failed to insert node: {0}")]
    InsertFailed(String),
    #[error("Selector rejected by host: {0}")]
    InvalidSelector(String),
    #[error("Node is detached")]
    Detached,
}

/// Operations the controller needs from a live document.
///
/// Element handles are cheap clones referring to the same physical node;
/// equality is node identity.
pub trait Dom {
    type Element: Clone + PartialEq + fmt::Debug;

    fn body(&self) -> Self::Element;
    fn document_element(&self) -> Self::Element;
    /// Path component of the current location.
    fn location_path(&self) -> String;

    fn create_element(&mut self, tag: &str) -> Result<Self::Element, DomError>;
    fn append_child(&mut self, parent: &Self::Element, child: &Self::Element) -> Result<(), DomError>;
    /// Insert `node` as the next sibling of `reference`.
    fn insert_after(&mut self, reference: &Self::Element, node: &Self::Element) -> Result<(), DomError>;
    /// Detach from the document. A no-op for nodes that are already detached.
    fn remove(&mut self, element: &Self::Element);

    fn parent(&self, element: &Self::Element) -> Option<Self::Element>;
    fn is_connected(&self, element: &Self::Element) -> bool;

    fn matches(&self, element: &Self::Element, selector: &Selector) -> Result<bool, DomError>;
    /// First descendant of `scope` (excluding `scope`) in document order.
    fn query(&self, scope: &Self::Element, selector: &Selector) -> Option<Self::Element>;
    /// All descendants of `scope` (excluding `scope`) in document order.
    fn query_all(&self, scope: &Self::Element, selector: &Selector) -> Vec<Self::Element>;

    fn text_content(&self, element: &Self::Element) -> String;
    /// Replace all children with a single text node.
    fn set_text(&mut self, element: &Self::Element, text: &str);

    fn attribute(&self, element: &Self::Element, name: &str) -> Option<String>;
    fn set_attribute(&mut self, element: &Self::Element, name: &str, value: &str) -> Result<(), DomError>;
    fn has_class(&self, element: &Self::Element, class: &str) -> bool;
    fn set_class(&mut self, element: &Self::Element, class: &str, on: bool);

    fn is_disabled(&self, element: &Self::Element) -> bool;
    fn set_disabled(&mut self, element: &Self::Element, disabled: bool);

    /// Inline `display: none`.
    fn is_hidden(&self, element: &Self::Element) -> bool;
    fn set_hidden(&mut self, element: &Self::Element, hidden: bool);
    /// Whether the element currently occupies layout space.
    fn is_rendered(&self, element: &Self::Element) -> bool;
    /// Computed background colour, e.g. `rgb(26, 26, 27)`.
    fn background_color(&self, element: &Self::Element) -> String;

    /// Route clicks on `root` and its descendants to the controller's
    /// delegated click handler.
    fn listen_clicks(&mut self, root: &Self::Element);

    fn get_element_by_id(&self, id: &str) -> Option<Self::Element> {
        let root = self.document_element();
        let selector = Selector::id(id);
        if self.matches(&root, &selector).unwrap_or(false) {
            return Some(root);
        }
        self.query(&root, &selector)
    }

    /// Nearest inclusive ancestor matching `selector`.
    fn closest(&self, element: &Self::Element, selector: &Selector) -> Option<Self::Element> {
        let mut current = Some(element.clone());
        while let Some(node) = current {
            if self.matches(&node, selector).unwrap_or(false) {
                return Some(node);
            }
            current = self.parent(&node);
        }
        None
    }

    /// Inclusive descendant test.
    fn contains(&self, ancestor: &Self::Element, element: &Self::Element) -> bool {
        let mut current = Some(element.clone());
        while let Some(node) = current {
            if &node == ancestor {
                return true;
            }
            current = self.parent(&node);
        }
        false
    }

    /// Create an element carrying one class.
    fn create_with_class(&mut self, tag: &str, class: &str) -> Result<Self::Element, DomError> {
        let element = self.create_element(tag)?;
        self.set_class(&element, class, true);
        Ok(element)
    }
}
