//! Floating thread summarizer control
//!
//! One per page, present only on thread-detail pages and hidden while the
//! media overlay is open.

use crate::dom::{Dom, DomError};
use crate::presentation::{build_widget, WIDGET_BUTTON_ID, WIDGET_ID};
use crate::profile::HostProfile;
use crate::selector::Selector;

#[derive(Debug)]
pub struct ThreadWidget<E> {
    element: Option<E>,
    overlay_open: bool,
}

impl<E> Default for ThreadWidget<E> {
    fn default() -> Self {
        Self {
            element: None,
            overlay_open: false,
        }
    }
}

impl<E: Clone + PartialEq> ThreadWidget<E> {
    pub fn should_be_present(profile: &HostProfile, path: &str) -> bool {
        profile.is_thread_path(path)
    }

    /// Create or destroy the widget to match the current location.
    pub fn sync<D: Dom<Element = E>>(&mut self, dom: &mut D, profile: &HostProfile) -> Result<(), DomError> {
        let existing = dom.get_element_by_id(WIDGET_ID);

        if !Self::should_be_present(profile, &dom.location_path()) {
            if let Some(widget) = existing.or_else(|| self.element.take()) {
                log::debug!("widget: leaving thread page, removing summarizer");
                dom.remove(&widget);
            }
            self.element = None;
            return Ok(());
        }

        if let Some(widget) = existing {
            self.element = Some(widget);
            return Ok(());
        }

        let widget = build_widget(dom)?;
        let body = dom.body();
        dom.append_child(&body, &widget)?;
        dom.listen_clicks(&widget);
        dom.set_hidden(&widget, self.overlay_open);
        log::debug!("widget: thread page detected, summarizer attached");
        self.element = Some(widget);
        Ok(())
    }

    pub fn set_overlay_open<D: Dom<Element = E>>(&mut self, dom: &mut D, open: bool) {
        self.overlay_open = open;
        if let Some(widget) = &self.element {
            dom.set_hidden(widget, open);
        }
    }

    pub fn element(&self) -> Option<&E> {
        self.element.as_ref()
    }

    /// The widget's trigger button.
    pub fn button<D: Dom<Element = E>>(&self, dom: &D) -> Option<E> {
        let widget = self.element.as_ref()?;
        dom.query(widget, &Selector::id(WIDGET_BUTTON_ID))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MemoryDom, NodeId};

    #[test]
    fn test_follows_navigation() {
        let mut dom = MemoryDom::new("/r/rust/");
        let profile = HostProfile::default();
        let mut widget: ThreadWidget<NodeId> = ThreadWidget::default();

        widget.sync(&mut dom, &profile).unwrap();
        assert!(dom.get_element_by_id(WIDGET_ID).is_none());

        dom.set_location_path("/r/rust/comments/abc/title/");
        widget.sync(&mut dom, &profile).unwrap();
        let element = dom.get_element_by_id(WIDGET_ID).unwrap();
        assert!(dom.is_listening(element));
        assert!(widget.button(&dom).is_some());

        widget.sync(&mut dom, &profile).unwrap();
        assert_eq!(dom.find_all(&Selector::id(WIDGET_ID)).len(), 1);

        dom.set_location_path("/r/rust/");
        widget.sync(&mut dom, &profile).unwrap();
        assert!(dom.get_element_by_id(WIDGET_ID).is_none());
        assert!(widget.element().is_none());
    }

    #[test]
    fn test_hidden_while_overlay_open() {
        let mut dom = MemoryDom::new("/r/rust/comments/abc/");
        let profile = HostProfile::default();
        let mut widget: ThreadWidget<NodeId> = ThreadWidget::default();

        widget.set_overlay_open(&mut dom, true);
        widget.sync(&mut dom, &profile).unwrap();
        let element = *widget.element().unwrap();
        assert!(dom.is_hidden(&element));

        widget.set_overlay_open(&mut dom, false);
        assert!(!dom.is_hidden(&element));
    }
}
