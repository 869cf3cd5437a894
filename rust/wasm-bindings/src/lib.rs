// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-AR WebAssembly Bindings
//!
//! JavaScript/TypeScript API for the IFC AR viewer built with wasm-bindgen.
//! The page supplies an `ArHost` object (see the TypeScript interface in the
//! generated typings); [`ArViewer`] drives it.

use tracing_subscriber::filter::LevelFilter;
use wasm_bindgen::prelude::*;

#[cfg(feature = "console_error_panic_hook")]
pub use console_error_panic_hook::set_once as set_panic_hook;

mod api;
mod host;
mod logging;
mod utils;

pub use api::ArViewer;
pub use host::{ArHostJs, JsArHost, JsHitTestSource, JsStream, JsTrack, JsXrSession};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    utils::set_panic_hook();
    logging::init();
}

/// Console log level: `"off"`, `"error"`, `"warn"`, `"info"` (default), `"debug"` or `"trace"`
#[wasm_bindgen(js_name = setLogLevel)]
pub fn set_log_level(level: &str) -> Result<(), JsError> {
    let level: LevelFilter = level
        .parse()
        .map_err(|_| JsError::new(&format!("Unknown log level: {level}")))?;
    logging::set_max_level(level).map_err(|e| JsError::new(&e.to_string()))
}

/// Get the version of IFC-AR
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
