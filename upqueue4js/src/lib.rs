#![cfg(target_arch = "wasm32")]

use std::sync::Once;
use wasm_bindgen::prelude::*;

static INIT: Once = Once::new();

/// Called by the bootstrap script the server renders into the page.
#[wasm_bindgen]
pub fn start(endpoint: String, background: bool, item_template: String) -> Result<(), JsValue> {
    INIT.call_once(|| {
        console_error_panic_hook::set_once();
        wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
    });

    let config = upqueue::PageConfig {
        endpoint,
        background,
        item_template,
    };

    upqueue::start(config).map_err(|e| JsValue::from_str(&e.to_string()))
}
