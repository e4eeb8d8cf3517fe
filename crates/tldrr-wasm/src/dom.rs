//! `Dom` over the live document

use std::rc::Rc;

use tldrr_core::{Dom, DomError, Selector};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlElement, Window};

/// Receives `(listener root, clicked element)` for every registered root.
pub type ClickSink = Rc<dyn Fn(Element, Element)>;

/// Window, document and the two fixed roots.
#[derive(Debug, Clone)]
pub struct Page {
    pub window: Window,
    pub document: Document,
    pub html: Element,
    pub body: Element,
}

impl Page {
    pub fn current() -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("No document"))?;
        let html = document
            .document_element()
            .ok_or_else(|| JsValue::from_str("No document element"))?;
        let body: Element = document
            .body()
            .ok_or_else(|| JsValue::from_str("No body"))?
            .into();
        Ok(Self { window, document, html, body })
    }
}

pub struct WebDom {
    page: Page,
    on_click: ClickSink,
}

impl WebDom {
    pub fn new(page: Page, on_click: ClickSink) -> Self {
        Self { page, on_click }
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    fn html_element(element: &Element) -> Option<&HtmlElement> {
        element.dyn_ref::<HtmlElement>()
    }
}

/// Innermost element behind an event target (text nodes resolve to their parent).
fn target_element(event: &Event) -> Option<Element> {
    let target = event.target()?;
    match target.dyn_into::<Element>() {
        Ok(element) => Some(element),
        Err(other) => other.dyn_into::<web_sys::Node>().ok()?.parent_element(),
    }
}

impl Dom for WebDom {
    type Element = Element;

    fn body(&self) -> Element {
        self.page.body.clone()
    }

    fn document_element(&self) -> Element {
        self.page.html.clone()
    }

    fn location_path(&self) -> String {
        self.page.window.location().pathname().unwrap_or_default()
    }

    fn create_element(&mut self, tag: &str) -> Result<Element, DomError> {
        self.page
            .document
            .create_element(tag)
            .map_err(|_| DomError::CreateFailed(tag.to_string()))
    }

    fn append_child(&mut self, parent: &Element, child: &Element) -> Result<(), DomError> {
        parent
            .append_child(child)
            .map(|_| ())
            .map_err(|e| DomError::InsertFailed(format!("{e:?}")))
    }

    fn insert_after(&mut self, reference: &Element, node: &Element) -> Result<(), DomError> {
        if reference.parent_node().is_none() {
            return Err(DomError::Detached);
        }
        reference
            .after_with_node_1(node)
            .map_err(|e| DomError::InsertFailed(format!("{e:?}")))
    }

    fn remove(&mut self, element: &Element) {
        element.remove();
    }

    fn parent(&self, element: &Element) -> Option<Element> {
        element.parent_element()
    }

    fn is_connected(&self, element: &Element) -> bool {
        element.is_connected()
    }

    fn matches(&self, element: &Element, selector: &Selector) -> Result<bool, DomError> {
        element
            .matches(&selector.to_string())
            .map_err(|_| DomError::InvalidSelector(selector.to_string()))
    }

    fn query(&self, scope: &Element, selector: &Selector) -> Option<Element> {
        scope.query_selector(&selector.to_string()).ok().flatten()
    }

    fn query_all(&self, scope: &Element, selector: &Selector) -> Vec<Element> {
        let Ok(list) = scope.query_selector_all(&selector.to_string()) else {
            return Vec::new();
        };
        (0..list.length())
            .filter_map(|i| list.item(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect()
    }

    fn text_content(&self, element: &Element) -> String {
        element.text_content().unwrap_or_default()
    }

    fn set_text(&mut self, element: &Element, text: &str) {
        element.set_text_content(Some(text));
    }

    fn attribute(&self, element: &Element, name: &str) -> Option<String> {
        element.get_attribute(name)
    }

    fn set_attribute(&mut self, element: &Element, name: &str, value: &str) -> Result<(), DomError> {
        element
            .set_attribute(name, value)
            .map_err(|_| DomError::InvalidSelector(name.to_string()))
    }

    fn has_class(&self, element: &Element, class: &str) -> bool {
        element.class_list().contains(class)
    }

    fn set_class(&mut self, element: &Element, class: &str, on: bool) {
        if let Err(e) = element.class_list().toggle_with_force(class, on) {
            log::warn!("dom: class {class} not applied: {e:?}");
        }
    }

    fn is_disabled(&self, element: &Element) -> bool {
        element.has_attribute("disabled")
    }

    fn set_disabled(&mut self, element: &Element, disabled: bool) {
        if let Err(e) = element.toggle_attribute_with_force("disabled", disabled) {
            log::warn!("dom: disabled={disabled} not applied: {e:?}");
        }
    }

    fn is_hidden(&self, element: &Element) -> bool {
        Self::html_element(element)
            .and_then(|html| html.style().get_property_value("display").ok())
            .is_some_and(|display| display == "none")
    }

    fn set_hidden(&mut self, element: &Element, hidden: bool) {
        let Some(html) = Self::html_element(element) else {
            return;
        };
        let style = html.style();
        let result = if hidden {
            style.set_property("display", "none")
        } else {
            style.remove_property("display").map(|_| ())
        };
        if let Err(e) = result {
            log::warn!("dom: display not updated: {e:?}");
        }
    }

    fn is_rendered(&self, element: &Element) -> bool {
        Self::html_element(element).is_some_and(|html| html.offset_width() > 0 || html.offset_height() > 0)
    }

    fn background_color(&self, element: &Element) -> String {
        self.page
            .window
            .get_computed_style(element)
            .ok()
            .flatten()
            .and_then(|style| style.get_property_value("background-color").ok())
            .unwrap_or_default()
    }

    fn listen_clicks(&mut self, root: &Element) {
        let sink = Rc::clone(&self.on_click);
        let listener_root = root.clone();
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Some(target) = target_element(&event) {
                sink(listener_root.clone(), target);
            }
        });
        if let Err(e) = root.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref()) {
            log::warn!("dom: click listener not registered: {e:?}");
        }
        // Lives as long as the page.
        closure.forget();
    }
}
