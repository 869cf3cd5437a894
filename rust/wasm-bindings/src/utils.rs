// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Small helpers for talking to untyped JavaScript objects

use ifc_ar_core::{Matrix4, PlatformError, PlatformErrorKind};
use js_sys::{Array, Float64Array, Function, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

/// Set panic hook for better error messages in the browser
pub fn set_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Map a thrown value or rejected promise to a [`PlatformError`].
///
/// DOMExceptions and `Error`s carry `name` and `message`; anything else is
/// stringified.
pub fn platform_error(value: JsValue) -> PlatformError {
    let name = Reflect::get(&value, &"name".into())
        .ok()
        .and_then(|v| v.as_string());
    let message = Reflect::get(&value, &"message".into())
        .ok()
        .and_then(|v| v.as_string())
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value));

    let kind = name
        .as_deref()
        .map(PlatformErrorKind::from_name)
        .unwrap_or(PlatformErrorKind::Other);
    PlatformError::new(kind, message)
}

/// Call `target[name](...args)`
pub fn call_method(target: &JsValue, name: &str, args: &[JsValue]) -> Result<JsValue, JsValue> {
    let method: Function = Reflect::get(target, &name.into())?
        .dyn_into()
        .map_err(|_| JsValue::from_str(&format!("{name} is not a function")))?;
    let args: Array = args.iter().collect();
    method.apply(target, &args)
}

pub fn set_js_prop(target: &JsValue, key: &str, value: &JsValue) {
    // Reflect.set only fails on non-objects
    let _ = Reflect::set(target, &key.into(), value);
}

pub fn is_nullish(value: &JsValue) -> bool {
    value.is_null() || value.is_undefined()
}

/// Numbers from an array or typed array; `None` for null/undefined
pub fn to_f64_vec(value: &JsValue) -> Option<Vec<f64>> {
    if is_nullish(value) {
        return None;
    }
    Some(Float64Array::new(value).to_vec())
}

/// A 16-element column-major matrix (e.g. `XRRigidTransform.matrix`)
pub fn matrix_from_js(value: &JsValue) -> Option<Matrix4<f64>> {
    let values = to_f64_vec(value)?;
    if values.len() != 16 || values.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(Matrix4::from_column_slice(&values))
}

pub fn matrix_to_js(matrix: &Matrix4<f64>) -> JsValue {
    Float64Array::from(matrix.as_slice()).into()
}
