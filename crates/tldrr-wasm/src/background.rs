//! Background service worker
//!
//! Holds the only [`GeminiClient`], answers `translateText` messages with a
//! `{success, data | error}` envelope and seeds the store on first install.

use std::rc::Rc;

use js_sys::{Function, Reflect};
use tldrr_core::StoredSettings;
use tldrr_service::{handle_message, ExtensionMessage, GeminiClient, GeminiConfig};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::chrome;

fn on_message(client: Rc<GeminiClient>, message: JsValue, respond: Function) -> bool {
    let message = match serde_wasm_bindgen::from_value::<ExtensionMessage>(message) {
        Ok(message @ ExtensionMessage::TranslateText { .. }) => message,
        Ok(_) => return false,
        Err(e) => {
            log::debug!("background: ignoring foreign message: {e}");
            return false;
        }
    };

    spawn_local(async move {
        let api_key = match chrome::load_settings().await {
            Ok(stored) => stored.api_key().map(str::to_string),
            Err(e) => {
                log::warn!("background: settings unavailable: {e:?}");
                None
            }
        };
        let Some(response) = handle_message(&client, message, api_key.as_deref()).await else {
            return;
        };
        let reply = match chrome::to_js(&response) {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("background: response not serializable: {e:?}");
                return;
            }
        };
        if let Err(e) = respond.call1(&JsValue::UNDEFINED, &reply) {
            log::warn!("background: sender went away: {e:?}");
        }
    });
    // Keep the response channel open for the async reply.
    true
}

fn on_installed(details: JsValue) {
    let reason = Reflect::get(&details, &"reason".into())
        .ok()
        .and_then(|v| v.as_string());
    if reason.as_deref() != Some("install") {
        return;
    }
    spawn_local(async {
        match chrome::save_settings(&StoredSettings::install_defaults()).await {
            Ok(()) => log::info!("background: default settings written"),
            Err(e) => log::error!("background: failed to write defaults: {e:?}"),
        }
    });
}

pub fn run(config: GeminiConfig) -> Result<(), JsValue> {
    let client = Rc::new(GeminiClient::new(config));

    let message_listener = Closure::<dyn FnMut(JsValue, JsValue, Function) -> bool>::new(
        move |message: JsValue, _sender: JsValue, respond: Function| on_message(Rc::clone(&client), message, respond),
    );
    chrome::add_listener("onMessage", message_listener)?;

    let install_listener = Closure::<dyn FnMut(JsValue)>::new(on_installed);
    chrome::add_listener("onInstalled", install_listener)?;

    log::info!("background: listening");
    Ok(())
}
