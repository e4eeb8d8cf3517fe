//! Content script
//!
//! Binds one [`Controller`] to the page: feeds it mutation batches and
//! clicks, carries its service requests to the background worker, and pumps
//! its timers with `setTimeout`.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tldrr_core::{Clock, Controller, ControllerConfig, ServiceRequest, ServiceResponse, StoredSettings, Ticket};
use tldrr_service::ExtensionMessage;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, MutationObserver, MutationObserverInit, MutationRecord};

use crate::chrome;
use crate::dom::{ClickSink, Page, WebDom};

/// Wall clock backed by `Date.now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

type PageController = Controller<WebDom, BrowserClock>;

pub struct ContentScript {
    controller: RefCell<PageController>,
    window: web_sys::Window,
    timeout: Cell<Option<i32>>,
}

impl ContentScript {
    fn new(page: Page, config: ControllerConfig) -> Rc<Self> {
        let window = page.window.clone();
        Rc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let on_click: ClickSink = Rc::new(move |root: Element, target: Element| {
                if let Some(script) = weak.upgrade() {
                    script.on_click(&root, &target);
                }
            });
            Self {
                controller: RefCell::new(Controller::new(WebDom::new(page, on_click), BrowserClock, config)),
                window,
                timeout: Cell::new(None),
            }
        })
    }

    /// Run `f` against the controller, then re-arm the timer pump.
    fn with_controller<R>(self: &Rc<Self>, f: impl FnOnce(&mut PageController) -> R) -> Option<R> {
        let result = match self.controller.try_borrow_mut() {
            Ok(mut controller) => Some(f(&mut controller)),
            Err(_) => {
                log::warn!("content: controller busy, event dropped");
                None
            }
        };
        self.arm_timer();
        result
    }

    fn on_click(self: &Rc<Self>, root: &Element, target: &Element) {
        if let Some(Some(request)) = self.with_controller(|c| c.handle_click(root, target)) {
            self.send(request);
        }
    }

    fn on_mutations(self: &Rc<Self>, records: js_sys::Array) {
        let mut added = Vec::new();
        for record in records.iter() {
            let Ok(record) = record.dyn_into::<MutationRecord>() else {
                continue;
            };
            let nodes = record.added_nodes();
            added.extend(
                (0..nodes.length())
                    .filter_map(|i| nodes.item(i))
                    .filter_map(|node| node.dyn_into::<Element>().ok()),
            );
        }
        self.with_controller(|c| c.on_mutations(&added));
    }

    /// Carry one request to the background worker and hand back the answer.
    fn send(self: &Rc<Self>, request: ServiceRequest) {
        let weak = Rc::downgrade(self);
        spawn_local(async move {
            let message = ExtensionMessage::from(&request);
            let response = match chrome::send_message(&message).await {
                Ok(raw) => serde_wasm_bindgen::from_value::<ServiceResponse>(raw).unwrap_or_else(|e| {
                    log::warn!("content: undecodable service response: {e}");
                    ServiceResponse::failure("")
                }),
                Err(e) => {
                    log::warn!("content: message to background failed: {e:?}");
                    ServiceResponse::failure("")
                }
            };
            if let Some(script) = weak.upgrade() {
                script.deliver(request.ticket, response);
            }
        });
    }

    /// Hand an answer to the controller. A busy controller gets it again on
    /// the next turn of the task queue; dropping it would leave its button
    /// disabled.
    fn deliver(self: &Rc<Self>, ticket: Ticket, response: ServiceResponse) {
        match self.controller.try_borrow_mut() {
            Ok(mut controller) => controller.complete(ticket, response),
            Err(_) => {
                log::debug!("content: controller busy, requeueing {ticket:?}");
                let weak = Rc::downgrade(self);
                spawn_local(async move {
                    if let Some(script) = weak.upgrade() {
                        script.deliver(ticket, response);
                    }
                });
                return;
            }
        }
        self.arm_timer();
    }

    /// Keep exactly one `setTimeout` pending for the controller's next deadline.
    fn arm_timer(self: &Rc<Self>) {
        if let Some(handle) = self.timeout.take() {
            self.window.clear_timeout_with_handle(handle);
        }
        let Some(deadline) = self.controller.try_borrow().ok().and_then(|c| c.next_deadline()) else {
            return;
        };
        let delay = deadline.saturating_sub(BrowserClock.now_ms()).min(i32::MAX as u64) as i32;

        let weak = Rc::downgrade(self);
        let fire = Closure::once_into_js(move || {
            if let Some(script) = weak.upgrade() {
                script.timeout.set(None);
                script.with_controller(|c| c.tick());
            }
        });
        match self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(fire.unchecked_ref(), delay)
        {
            Ok(handle) => self.timeout.set(Some(handle)),
            Err(e) => log::warn!("content: timer not armed: {e:?}"),
        }
    }

    fn observe(self: &Rc<Self>, body: &Element) -> Result<(), JsValue> {
        let weak = Rc::downgrade(self);
        let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |records: js_sys::Array, _observer: MutationObserver| {
                if let Some(script) = weak.upgrade() {
                    script.on_mutations(records);
                }
            },
        );
        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())?;
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        observer.observe_with_options(body, &options)?;
        callback.forget();
        Ok(())
    }

    fn listen_for_messages(self: &Rc<Self>) -> Result<(), JsValue> {
        let weak = Rc::downgrade(self);
        let listener = Closure::<dyn FnMut(JsValue, JsValue, JsValue) -> JsValue>::new(
            move |message: JsValue, _sender: JsValue, _respond: JsValue| -> JsValue {
                match serde_wasm_bindgen::from_value::<ExtensionMessage>(message) {
                    Ok(ExtensionMessage::SettingsUpdated) => {
                        let weak = weak.clone();
                        spawn_local(async move {
                            let stored = load_or_default().await;
                            if let Some(script) = weak.upgrade() {
                                script.with_controller(|c| c.apply_settings(&stored));
                            }
                        });
                    }
                    Ok(ExtensionMessage::ApiKeyUpdated { .. }) => log::info!("content: api key updated"),
                    _ => {}
                }
                JsValue::FALSE
            },
        );
        chrome::add_listener("onMessage", listener)
    }
}

async fn load_or_default() -> StoredSettings {
    chrome::load_settings().await.unwrap_or_else(|e| {
        log::warn!("content: settings unavailable, using defaults: {e:?}");
        StoredSettings::default()
    })
}

/// Boot the content script on the current page.
pub async fn run(config: ControllerConfig) -> Result<Rc<ContentScript>, JsValue> {
    let page = Page::current()?;
    let body = page.body.clone();
    let stored = load_or_default().await;

    let script = ContentScript::new(page, config);
    script.with_controller(|c| c.init(&stored));
    script.observe(&body)?;
    script.listen_for_messages()?;
    log::info!("content: controller ready");
    Ok(script)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use tldrr_core::{Action, Dom};
    use wasm_bindgen_futures::JsFuture;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    async fn next_task(window: &web_sys::Window) {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, 0);
        });
        let _ = JsFuture::from(promise).await;
    }

    #[wasm_bindgen_test]
    async fn answer_for_busy_controller_is_requeued() {
        let page = Page::current().unwrap();
        let window = page.window.clone();
        let config = ControllerConfig {
            toolbar: false,
            ..ControllerConfig::default()
        };
        let script = ContentScript::new(page, config);

        let (post, request) = {
            let mut controller = script.controller.borrow_mut();
            let dom = controller.dom_mut();
            let body = dom.body();
            let post = dom.create_element("shreddit-post").unwrap();
            dom.append_child(&body, &post).unwrap();
            dom.set_text(&post, "A post body that is long enough to translate.");
            let button = dom.create_element("button").unwrap();
            dom.append_child(&post, &button).unwrap();
            let request = controller.dispatch_action(&post, Action::Translate, &button).unwrap();
            (post, request)
        };

        let guard = script.controller.borrow_mut();
        script.deliver(request.ticket, ServiceResponse::success("translated"));
        assert_eq!(guard.pending_requests(), 1);
        drop(guard);

        next_task(&window).await;
        assert_eq!(script.controller.borrow().pending_requests(), 0);

        let mut controller = script.controller.borrow_mut();
        controller.close_all_panels();
        controller.dom_mut().remove(&post);
    }
}
