//! WebAssembly bindings for TLDRR
//!
//! Two entry points, one per extension context: `start_content_script`
//! for pages and `start_background` for the service worker.

pub mod background;
pub mod chrome;
pub mod content;
pub mod dom;

use std::cell::RefCell;
use std::rc::Rc;

use tldrr_core::{ControllerConfig, HostProfile};
use tldrr_service::GeminiConfig;
use wasm_bindgen::prelude::*;

thread_local! {
    static CONTENT: RefCell<Option<Rc<content::ContentScript>>> = const { RefCell::new(None) };
}

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Boot the page controller. `profile` optionally overrides the host
/// markup profile (same shape as `HostProfile` in JSON).
#[wasm_bindgen]
pub async fn start_content_script(profile: JsValue) -> Result<(), JsValue> {
    if CONTENT.with(|slot| slot.borrow().is_some()) {
        return Err(JsValue::from_str("Already initialized. Reload the page to reinitialize."));
    }

    let profile: HostProfile = if profile.is_undefined() || profile.is_null() {
        HostProfile::default()
    } else {
        serde_wasm_bindgen::from_value(profile)?
    };
    let config = ControllerConfig {
        profile,
        ..ControllerConfig::default()
    };

    let script = content::run(config).await?;
    CONTENT.with(|slot| *slot.borrow_mut() = Some(script));
    Ok(())
}

#[wasm_bindgen]
pub fn start_background() -> Result<(), JsValue> {
    background::run(GeminiConfig::default())
}

#[wasm_bindgen]
pub fn is_initialized() -> bool {
    CONTENT.with(|slot| slot.borrow().is_some())
}
