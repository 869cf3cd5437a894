// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JavaScript API for the AR viewer
//!
//! ```javascript
//! import init, { ArViewer } from 'ifc-ar-wasm';
//!
//! await init();
//! const ar = new ArViewer(host, { targetDiagonal: 1.5 });
//!
//! enterButton.onclick = async () => {
//!   try {
//!     console.log('AR mode:', await ar.enterAr());
//!   } catch (e) {
//!     // status text is already shown; e.userMessage holds it too
//!   }
//! };
//! session.addEventListener('end', (e) => ar.handleSessionEnd(e.session));
//! ```

use std::rc::Rc;

use ifc_ar_core::{ArConfig, ArController, Error, Gesture, TapEvent};
use js_sys::{Array, Promise};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::host::{ArHostJs, JsArHost};
use crate::utils::{is_nullish, set_js_prop};

/// `Error` with `name = "ArError"`, the user-facing text and the class
fn to_js_error(err: &Error) -> JsValue {
    let js = js_sys::Error::new(&err.to_string());
    js.set_name("ArError");
    set_js_prop(&js, "userMessage", &JsValue::from_str(&err.user_message()));
    set_js_prop(&js, "errorClass", &JsValue::from_str(&format!("{:?}", err.class())));
    js.into()
}

/// `undefined`/`null`, a JSON string or a plain object
fn parse_config(value: &JsValue) -> Result<ArConfig, JsError> {
    if is_nullish(value) {
        return Ok(ArConfig::default());
    }
    match value.as_string() {
        Some(text) => ArConfig::from_json(&text).map_err(|e| JsError::new(&e.to_string())),
        // validated by the controller
        None => serde_wasm_bindgen::from_value::<ArConfig>(value.clone())
            .map_err(|e| JsError::new(&format!("Invalid AR config: {e}"))),
    }
}

/// AR session controller bound to a page host
#[wasm_bindgen]
pub struct ArViewer {
    controller: Rc<ArController<JsArHost>>,
}

#[wasm_bindgen]
impl ArViewer {
    /// Create a viewer. `config` may be omitted, a JSON string or an object.
    #[wasm_bindgen(constructor)]
    pub fn new(host: ArHostJs, config: JsValue) -> Result<ArViewer, JsError> {
        let config = parse_config(&config)?;
        let controller = ArController::new(JsArHost::new(host), config)
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(Self {
            controller: Rc::new(controller),
        })
    }

    /// Start AR. Resolves to `"webxr"`, `"pseudo-ar"`, or `"inactive"` when
    /// `exitAr()` was called while starting. Rejects with an `ArError`.
    #[wasm_bindgen(js_name = enterAr)]
    pub fn enter_ar(&self) -> Promise {
        let controller = self.controller.clone();
        future_to_promise(async move {
            controller
                .enter_ar()
                .await
                .map(|state| JsValue::from_str(state.as_str()))
                .map_err(|e| to_js_error(&e))
        })
    }

    /// Stop AR and restore the viewer. Safe to call at any time.
    #[wasm_bindgen(js_name = exitAr)]
    pub fn exit_ar(&self) {
        self.controller.exit_ar();
    }

    /// Wire to the XR session's `end` event, passing `event.session`.
    /// Returns whether that was the running session; late events from
    /// sessions already ended by the viewer are ignored.
    #[wasm_bindgen(js_name = handleSessionEnd)]
    pub fn handle_session_end(&self, session: JsValue) -> bool {
        self.controller.handle_session_end(&session)
    }

    /// Call from the `XRSession.requestAnimationFrame` callback with its `XRFrame`
    #[wasm_bindgen(js_name = onXrFrame)]
    pub fn on_xr_frame(&self, frame: JsValue) {
        self.controller.on_xr_frame(&frame);
    }

    /// Call from the `window.requestAnimationFrame` callback in passthrough mode
    #[wasm_bindgen(js_name = onAnimationFrame)]
    pub fn on_animation_frame(&self) {
        self.controller.on_animation_frame();
    }

    /// Tap or XR `select`. `path` lists element ids from the target outwards;
    /// pass `[]` for `select`. Returns the outcome name.
    #[wasm_bindgen(js_name = onTap)]
    pub fn on_tap(&self, path: Array) -> String {
        let tap = TapEvent::on_path(path.iter().filter_map(|v| v.as_string()));
        self.controller.on_tap(&tap).as_str().to_string()
    }

    /// Place now without a tap
    pub fn place(&self) -> String {
        self.controller.place().as_str().to_string()
    }

    /// Scale slider moved. Returns the applied scale.
    #[wasm_bindgen(js_name = onScaleInput)]
    pub fn on_scale_input(&self, value: f64) -> Result<f64, JsValue> {
        self.controller
            .set_manual_scale(value)
            .map_err(|e| to_js_error(&e))
    }

    #[wasm_bindgen(js_name = onDrag)]
    pub fn on_drag(&self, dx: f64) -> bool {
        self.controller.on_gesture(Gesture::Drag { dx })
    }

    #[wasm_bindgen(js_name = onPinch)]
    pub fn on_pinch(&self, factor: f64) -> bool {
        self.controller.on_gesture(Gesture::Pinch { factor })
    }

    #[wasm_bindgen(js_name = onWheel)]
    pub fn on_wheel(&self, dy: f64) -> bool {
        self.controller.on_gesture(Gesture::Wheel { dy })
    }

    /// `"inactive"`, `"webxr"` or `"pseudo-ar"`
    #[wasm_bindgen(getter)]
    pub fn state(&self) -> String {
        self.controller.state().as_str().to_string()
    }

    #[wasm_bindgen(getter, js_name = isEntering)]
    pub fn is_entering(&self) -> bool {
        self.controller.is_entering()
    }

    /// Current anchor scale, `undefined` before the first placement
    #[wasm_bindgen(getter)]
    pub fn scale(&self) -> Option<f64> {
        self.controller.scale()
    }

    #[wasm_bindgen(getter, js_name = isScaleManual)]
    pub fn is_scale_manual(&self) -> bool {
        self.controller.is_scale_manual()
    }

    #[wasm_bindgen(getter, js_name = reticleVisible)]
    pub fn reticle_visible(&self) -> bool {
        self.controller.reticle_visible()
    }

    #[wasm_bindgen(getter, js_name = hasHitTest)]
    pub fn has_hit_test(&self) -> bool {
        self.controller.has_hit_test()
    }

    /// `[px, py, pz, qx, qy, qz, qw, sx, sy, sz]`
    #[wasm_bindgen(getter, js_name = anchorTransform)]
    pub fn anchor_transform(&self) -> Vec<f64> {
        self.controller.anchor().transform.to_array().to_vec()
    }

    /// Fallback order, e.g. `["webxr-full", ..., "camera-passthrough"]`
    #[wasm_bindgen(getter)]
    pub fn strategies(&self) -> Array {
        self.controller
            .strategies()
            .names()
            .into_iter()
            .map(JsValue::from_str)
            .collect()
    }

    /// Effective configuration as a plain object
    #[wasm_bindgen(getter)]
    pub fn config(&self) -> Result<JsValue, JsError> {
        serde_wasm_bindgen::to_value(self.controller.config())
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_config_from_object_and_json() {
        let object = js_sys::Object::new();
        set_js_prop(&object, "targetDiagonal", &JsValue::from_f64(2.0));
        set_js_prop(&object, "hitTest", &JsValue::FALSE);
        let config = parse_config(&object.into()).unwrap();
        assert_eq!(config.target_diagonal, 2.0);
        assert!(!config.hit_test);

        let config = parse_config(&JsValue::from_str(r#"{"fallbackDistance": 2.5}"#)).unwrap();
        assert_eq!(config.fallback_distance, 2.5);

        assert_eq!(parse_config(&JsValue::UNDEFINED).unwrap(), ArConfig::default());
    }

    #[wasm_bindgen_test]
    fn test_ar_error_carries_user_message() {
        let js = to_js_error(&Error::InsecureContext);
        let name = js_sys::Reflect::get(&js, &"name".into()).unwrap();
        let message = js_sys::Reflect::get(&js, &"userMessage".into()).unwrap();
        assert_eq!(name.as_string().as_deref(), Some("ArError"));
        assert_eq!(message.as_string(), Some(Error::InsecureContext.user_message()));
    }
}
