#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use tldrr_core::{Dom, Selector};
use tldrr_wasm::dom::{Page, WebDom};
use wasm_bindgen_test::*;
use web_sys::Element;

wasm_bindgen_test_configure!(run_in_browser);

fn web_dom(clicks: Rc<RefCell<Vec<(Element, Element)>>>) -> WebDom {
    let page = Page::current().unwrap();
    WebDom::new(page, Rc::new(move |root, target| clicks.borrow_mut().push((root, target))))
}

#[wasm_bindgen_test]
fn insert_after_and_query() {
    let mut dom = web_dom(Rc::default());
    let body = dom.body();
    let anchor = dom.create_with_class("div", "anchor-under-test").unwrap();
    dom.append_child(&body, &anchor).unwrap();
    let cluster = dom.create_with_class("div", "tdlrr-inline-controls").unwrap();
    dom.insert_after(&anchor, &cluster).unwrap();

    assert_eq!(anchor.next_element_sibling(), Some(cluster.clone()));
    assert_eq!(dom.query(&body, &Selector::class("tdlrr-inline-controls")), Some(cluster.clone()));
    assert!(dom.matches(&cluster, &Selector::parse(".tdlrr-inline-controls").unwrap()).unwrap());

    dom.remove(&cluster);
    dom.remove(&anchor);
    assert!(!dom.is_connected(&cluster));
}

#[wasm_bindgen_test]
fn disabled_and_hidden_flags() {
    let mut dom = web_dom(Rc::default());
    let body = dom.body();
    let button = dom.create_element("button").unwrap();
    dom.append_child(&body, &button).unwrap();

    dom.set_disabled(&button, true);
    assert!(dom.is_disabled(&button));
    dom.set_disabled(&button, false);
    assert!(!dom.is_disabled(&button));

    dom.set_hidden(&button, true);
    assert!(dom.is_hidden(&button));
    assert!(!dom.is_rendered(&button));
    dom.set_hidden(&button, false);
    assert!(!dom.is_hidden(&button));
    dom.remove(&button);
}

#[wasm_bindgen_test]
fn delegated_clicks_reach_the_sink() {
    let clicks = Rc::new(RefCell::new(Vec::new()));
    let mut dom = web_dom(Rc::clone(&clicks));
    let body = dom.body();
    let root = dom.create_element("div").unwrap();
    let inner = dom.create_element("span").unwrap();
    dom.append_child(&root, &inner).unwrap();
    dom.append_child(&body, &root).unwrap();
    dom.listen_clicks(&root);

    let html: &web_sys::HtmlElement = wasm_bindgen::JsCast::unchecked_ref(&inner);
    html.click();

    assert_eq!(clicks.borrow().as_slice(), &[(root.clone(), inner.clone())]);
    dom.remove(&root);
}
