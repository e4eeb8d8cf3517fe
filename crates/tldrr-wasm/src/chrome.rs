//! Extension API glue
//!
//! Reaches `chrome.*` through `Reflect` so the crate needs no typed
//! extension bindings. Promise-returning calls are awaited with `JsFuture`.

use js_sys::{Array, Function, Promise, Reflect};
use serde::Serialize;
use tldrr_core::StoredSettings;
use wasm_bindgen::closure::WasmClosure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

/// `chrome.<path...>`
fn api(path: &[&str]) -> Result<JsValue, JsValue> {
    let mut value = Reflect::get(&js_sys::global(), &"chrome".into())?;
    for segment in path {
        if value.is_undefined() || value.is_null() {
            return Err(JsValue::from_str(&format!("chrome API unavailable at {segment}")));
        }
        value = Reflect::get(&value, &(*segment).into())?;
    }
    if value.is_undefined() {
        return Err(JsValue::from_str(&format!("chrome.{} is undefined", path.join("."))));
    }
    Ok(value)
}

/// Call `chrome.<path>.<method>(args...)`.
fn call(path: &[&str], method: &str, args: &Array) -> Result<JsValue, JsValue> {
    let target = api(path)?;
    let function: Function = Reflect::get(&target, &method.into())?.dyn_into()?;
    function.apply(&target, args)
}

async fn call_async(path: &[&str], method: &str, args: &Array) -> Result<JsValue, JsValue> {
    let promise: Promise = call(path, method, args)?.dyn_into()?;
    JsFuture::from(promise).await
}

pub fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(Into::into)
}

// =============================================================================
// Runtime
// =============================================================================

pub async fn send_message<T: Serialize>(message: &T) -> Result<JsValue, JsValue> {
    call_async(&["runtime"], "sendMessage", &Array::of1(&to_js(message)?)).await
}

/// `chrome.runtime.<event>.addListener(listener)`. The closure is leaked.
pub fn add_listener<T: ?Sized + WasmClosure>(event: &str, listener: Closure<T>) -> Result<(), JsValue> {
    call(&["runtime", event], "addListener", &Array::of1(listener.as_ref()))?;
    listener.forget();
    Ok(())
}

// =============================================================================
// Storage
// =============================================================================

pub async fn load_settings() -> Result<StoredSettings, JsValue> {
    let keys: Array = StoredSettings::KEYS.iter().map(|k| JsValue::from_str(k)).collect();
    let raw = call_async(&["storage", "sync"], "get", &Array::of1(&keys)).await?;
    serde_wasm_bindgen::from_value(raw).map_err(Into::into)
}

pub async fn save_settings(settings: &StoredSettings) -> Result<(), JsValue> {
    call_async(&["storage", "sync"], "set", &Array::of1(&to_js(settings)?)).await?;
    Ok(())
}
