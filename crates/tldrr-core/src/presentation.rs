//! Presentation helpers
//!
//! Pure rendering over [`Dom`]: every function builds a detached subtree
//! (or flips classes on an existing one) and leaves insertion and event
//! routing to the controller. Class names and ids are shared with the
//! extension's stylesheet.

use crate::dom::{Dom, DomError};
use crate::settings::SettingName;
use crate::types::{Action, ActionSet, PanelKind};

pub const CLUSTER_CLASS: &str = "tdlrr-inline-controls";
pub const BUTTON_CLASS: &str = "tdlrr-inline-btn";
pub const ACTION_ATTR: &str = "data-action";
pub const BUSY_CLASS: &str = "loading";
pub const ACTIVE_CLASS: &str = "active";
pub const VISIBLE_CLASS: &str = "visible";
pub const DARK_CLASS: &str = "dark";

pub const PANEL_CLASS: &str = "tdlrr-result-box";
pub const PANEL_CLOSE_CLASS: &str = "tdlrr-result-close";
pub const PANEL_CONTENT_CLASS: &str = "tdlrr-result-content";

pub const MODAL_ID: &str = "tdlrr-thread-summary-modal";
pub const MODAL_CLOSE_CLASS: &str = "tdlrr-modal-close";
pub const MODAL_BODY_CLASS: &str = "tdlrr-modal-body";

pub const WIDGET_ID: &str = "tdlrr-thread-summarizer";
pub const WIDGET_BUTTON_ID: &str = "tdlrr-summarize-thread-btn";

pub const TOOLBAR_ID: &str = "tdlrr-toolbar";
pub const TOOLBAR_BUTTON_CLASS: &str = "tdlrr-btn";

fn child<D: Dom>(dom: &mut D, parent: &D::Element, tag: &str, class: &str) -> Result<D::Element, DomError> {
    let element = dom.create_with_class(tag, class)?;
    dom.append_child(parent, &element)?;
    Ok(element)
}

fn text_child<D: Dom>(dom: &mut D, parent: &D::Element, tag: &str, class: &str, text: &str) -> Result<D::Element, DomError> {
    let element = child(dom, parent, tag, class)?;
    dom.set_text(&element, text);
    Ok(element)
}

// =============================================================================
// Control Clusters
// =============================================================================

/// Detached control cluster with one button per action.
pub fn build_cluster<D: Dom>(dom: &mut D, actions: ActionSet) -> Result<D::Element, DomError> {
    let cluster = dom.create_with_class("div", CLUSTER_CLASS)?;
    for action in actions.actions() {
        let button = child(dom, &cluster, "button", BUTTON_CLASS)?;
        dom.set_attribute(&button, ACTION_ATTR, action.as_str())?;
        dom.set_attribute(&button, "title", action.title())?;
        text_child(dom, &button, "span", "tdlrr-icon", action.icon())?;
        text_child(dom, &button, "span", "tdlrr-label", action.button_label())?;
    }
    Ok(cluster)
}

/// Action declared by a cluster button.
pub fn button_action<D: Dom>(dom: &D, button: &D::Element) -> Option<Action> {
    dom.attribute(button, ACTION_ATTR)
        .and_then(|tag| Action::parse(&tag))
}

/// Busy state: disabled plus the spinner class.
pub fn set_busy<D: Dom>(dom: &mut D, button: &D::Element, busy: bool) {
    dom.set_class(button, BUSY_CLASS, busy);
    dom.set_disabled(button, busy);
}

// =============================================================================
// Result Panels
// =============================================================================

/// A rendered, still detached, result panel.
#[derive(Debug, Clone)]
pub struct PanelParts<E> {
    pub root: E,
    pub close: E,
}

pub fn build_panel<D: Dom>(dom: &mut D, kind: PanelKind, content: &str, dark: bool) -> Result<PanelParts<D::Element>, DomError> {
    let root = dom.create_with_class("div", PANEL_CLASS)?;
    dom.set_class(&root, &format!("tdlrr-result-{}", kind.class_suffix()), true);
    dom.set_class(&root, DARK_CLASS, dark);

    let header = child(dom, &root, "div", "tdlrr-result-header")?;
    text_child(dom, &header, "span", "tdlrr-result-type", kind.label())?;
    let close = text_child(dom, &header, "button", PANEL_CLOSE_CLASS, "✕")?;
    text_child(dom, &root, "div", PANEL_CONTENT_CLASS, content)?;

    Ok(PanelParts { root, close })
}

// =============================================================================
// Thread Summary Modal
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalContent<'a> {
    /// Request in flight
    Loading,
    Summary(&'a str),
}

pub fn build_modal<D: Dom>(dom: &mut D, content: ModalContent<'_>, dark: bool) -> Result<D::Element, DomError> {
    let modal = dom.create_with_class("div", "tdlrr-modal")?;
    dom.set_attribute(&modal, "id", MODAL_ID)?;
    dom.set_class(&modal, DARK_CLASS, dark);

    let frame = child(dom, &modal, "div", "tdlrr-modal-content")?;
    let header = child(dom, &frame, "div", "tdlrr-modal-header")?;
    let body = child(dom, &frame, "div", MODAL_BODY_CLASS)?;

    match content {
        ModalContent::Loading => {
            let title = dom.create_element("h3")?;
            dom.set_text(&title, "Thread Summary");
            dom.append_child(&header, &title)?;
            let loading = child(dom, &body, "div", "tdlrr-loading")?;
            child(dom, &loading, "div", "tdlrr-spinner")?;
            let note = dom.create_element("p")?;
            dom.set_text(&note, "Analyzing thread...");
            dom.append_child(&loading, &note)?;
        }
        ModalContent::Summary(summary) => {
            let title = dom.create_element("h3")?;
            dom.set_text(&title, "📊 Thread Summary");
            dom.append_child(&header, &title)?;
            text_child(dom, &header, "button", MODAL_CLOSE_CLASS, "✕")?;
            let text = dom.create_element("p")?;
            dom.set_text(&text, summary);
            dom.append_child(&body, &text)?;
        }
    }

    Ok(modal)
}

// =============================================================================
// Thread Summarizer Widget
// =============================================================================

pub fn build_widget<D: Dom>(dom: &mut D) -> Result<D::Element, DomError> {
    let widget = dom.create_element("div")?;
    dom.set_attribute(&widget, "id", WIDGET_ID)?;
    let button = child(dom, &widget, "button", "tdlrr-summarize-thread-btn")?;
    dom.set_attribute(&button, "id", WIDGET_BUTTON_ID)?;
    text_child(dom, &button, "span", "tdlrr-summarize-icon", "📊")?;
    text_child(dom, &button, "span", "tdlrr-summarize-text", "Summarize Thread")?;
    Ok(widget)
}

// =============================================================================
// Toolbar
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolbarButton {
    Tldr,
    Translate,
    Eli5,
    Format,
    SideBySide,
    Close,
}

impl ToolbarButton {
    pub const ALL: [ToolbarButton; 6] = [
        Self::Tldr,
        Self::Translate,
        Self::Eli5,
        Self::Format,
        Self::SideBySide,
        Self::Close,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Tldr => "tdlrr-tldr-btn",
            Self::Translate => "tdlrr-translate-btn",
            Self::Eli5 => "tdlrr-eli5-btn",
            Self::Format => "tdlrr-format-btn",
            Self::SideBySide => "tdlrr-side-by-side-btn",
            Self::Close => "tdlrr-close-btn",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|b| b.id() == id)
    }

    fn icon(self) -> &'static str {
        match self {
            Self::Tldr => "📝",
            Self::Translate => "🌐",
            Self::Eli5 => "🧒",
            Self::Format => "✨",
            Self::SideBySide => "⚡",
            Self::Close => "✕",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Tldr => "TL;DR Summary",
            Self::Translate => "Translate to English",
            Self::Eli5 => "Explain Like I'm 5",
            Self::Format => "Format & Clean Text",
            Self::SideBySide => "Toggle Side-by-Side View",
            Self::Close => "Close Toolbar",
        }
    }

    /// Setting this button toggles, if any.
    pub fn setting(self) -> Option<SettingName> {
        match self {
            Self::Tldr => Some(SettingName::ShowTldr),
            Self::Translate => Some(SettingName::AutoTranslate),
            Self::Eli5 => Some(SettingName::ShowEli5),
            _ => None,
        }
    }
}

pub fn build_toolbar<D: Dom>(dom: &mut D, dark: bool) -> Result<D::Element, DomError> {
    let toolbar = dom.create_with_class("div", "tdlrr-toolbar")?;
    dom.set_attribute(&toolbar, "id", TOOLBAR_ID)?;
    dom.set_class(&toolbar, DARK_CLASS, dark);

    let content = child(dom, &toolbar, "div", "tdlrr-toolbar-content")?;
    for button in ToolbarButton::ALL {
        let element = child(dom, &content, "button", TOOLBAR_BUTTON_CLASS)?;
        dom.set_attribute(&element, "id", button.id())?;
        dom.set_attribute(&element, "title", button.title())?;
        let icon = dom.create_element("span")?;
        dom.set_text(&icon, button.icon());
        dom.append_child(&element, &icon)?;
    }
    Ok(toolbar)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;
    use crate::selector::Selector;

    #[test]
    fn test_cluster_buttons() {
        let mut dom = MemoryDom::default();
        let cluster = build_cluster(&mut dom, ActionSet::COMMENT).unwrap();
        let buttons = dom.query_all(&cluster, &Selector::class(BUTTON_CLASS));
        let actions: Vec<_> = buttons.iter().filter_map(|b| button_action(&dom, b)).collect();
        assert_eq!(actions, vec![Action::Tldr, Action::Translate]);
        assert_eq!(dom.text_content(&buttons[0]), "📝TL;DR");
        assert!(!dom.is_connected(&cluster));
    }

    #[test]
    fn test_panel_content_is_text() {
        let mut dom = MemoryDom::default();
        let parts = build_panel(&mut dom, PanelKind::Error, "<b>nope</b>", true).unwrap();
        assert!(dom.has_class(&parts.root, "tdlrr-result-error"));
        assert!(dom.has_class(&parts.root, DARK_CLASS));
        assert!(!dom.has_class(&parts.root, VISIBLE_CLASS));
        let content = dom.query(&parts.root, &Selector::class(PANEL_CONTENT_CLASS)).unwrap();
        assert_eq!(dom.text_content(&content), "<b>nope</b>");
        assert!(dom.query(&content, &Selector::tag("b")).is_none());
    }

    #[test]
    fn test_busy_toggles_disabled() {
        let mut dom = MemoryDom::default();
        let body = dom.body();
        let button = dom.add(body, "button");
        set_busy(&mut dom, &button, true);
        assert!(dom.is_disabled(&button));
        assert!(dom.has_class(&button, BUSY_CLASS));
        set_busy(&mut dom, &button, false);
        assert!(!dom.is_disabled(&button));
        assert!(!dom.has_class(&button, BUSY_CLASS));
    }

    #[test]
    fn test_toolbar_ids() {
        let mut dom = MemoryDom::default();
        let toolbar = build_toolbar(&mut dom, false).unwrap();
        for button in ToolbarButton::ALL {
            let found = dom.query(&toolbar, &Selector::id(button.id())).unwrap();
            assert_eq!(ToolbarButton::from_id(&dom.attribute(&found, "id").unwrap()), Some(button));
        }
    }
}
