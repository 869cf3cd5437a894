// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Core host traits on top of a JavaScript host object
//!
//! The page passes an object implementing [`ArHostJs`]. It owns the three.js
//! scene, the renderer and the DOM; this module only translates calls and
//! maps rejections to [`PlatformError`]. WebXR objects (`XRSession`,
//! `XRFrame`, `XRHitTestSource`) are driven through `Reflect` because their
//! `web-sys` bindings are unstable.

use std::cell::RefCell;

use futures_util::future::LocalBoxFuture;
use ifc_ar_core::{
    CameraPose, CameraSource, HitTestSource, LoopKind, Matrix4, MediaStream, MediaTrack,
    ModelBounds, PlatformError, PlatformResult, ReferenceSpaceKind, RenderHost, SceneHost,
    SessionFeatures, Transform, UiHost, XrRuntime, XrSession,
};
use js_sys::{Array, Object, Promise};
use tracing::warn;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};

use crate::utils::{
    call_method, is_nullish, matrix_from_js, matrix_to_js, platform_error, set_js_prop,
    to_f64_vec,
};

#[wasm_bindgen(typescript_custom_section)]
const AR_HOST_TS: &'static str = r#"
export interface ArHost {
  hasXr(): boolean;
  isSecureContext(): boolean;
  isSessionSupported(): Promise<boolean>;
  domOverlayAvailable(): boolean;
  /**
   * `navigator.xr.requestSession('immersive-ar', init)`. When `init.domOverlay` is set, pass
   * `domOverlay: { root }` with the overlay element (`"overlay"`) or `document.body` (`"body"`).
   */
  requestSession(init: { requiredFeatures: string[]; optionalFeatures: string[]; domOverlay?: "overlay" | "body" }): Promise<XRSession>;
  bindSession(session: XRSession): Promise<void>;
  enableXr(referenceSpace: string): void;
  disableXr(): void;
  requestCamera(): Promise<MediaStream>;
  attachCameraBackground(stream: MediaStream): void;
  removeCameraBackground(): void;
  /** `[minX, minY, minZ, maxX, maxY, maxZ]`, or null when no model is loaded */
  modelBounds(): ArrayLike<number> | null;
  attachModelClone(): void;
  detachModelClone(): void;
  /** `[px, py, pz, qx, qy, qz, qw, sx, sy, sz]`; copy it, the view is only valid during the call */
  setAnchorTransform(values: Float64Array): void;
  setAnchorVisible(visible: boolean): void;
  /** Column-major pose, or null to hide */
  setReticle(matrix: Float64Array | null): void;
  /** `[px, py, pz, qx, qy, qz, qw]` */
  cameraPose(): ArrayLike<number>;
  setPassthrough(enabled: boolean): void;
  startLoop(kind: "xr" | "animation"): void;
  stopLoop(): void;
  render(): void;
  showArUi(): void;
  hideArUi(): void;
  setStatus(message: string): void;
  setScaleControl(value: number): void;
}
"#;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(typescript_type = "ArHost")]
    pub type ArHostJs;

    #[wasm_bindgen(method, js_name = hasXr)]
    fn has_xr(this: &ArHostJs) -> bool;

    #[wasm_bindgen(method, js_name = isSecureContext)]
    fn is_secure_context(this: &ArHostJs) -> bool;

    #[wasm_bindgen(method, catch, js_name = isSessionSupported)]
    fn is_session_supported(this: &ArHostJs) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, js_name = domOverlayAvailable)]
    fn dom_overlay_available(this: &ArHostJs) -> bool;

    #[wasm_bindgen(method, catch, js_name = requestSession)]
    fn request_session(this: &ArHostJs, init: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = bindSession)]
    fn bind_session(this: &ArHostJs, session: &JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, js_name = enableXr)]
    fn enable_xr(this: &ArHostJs, reference_space: &str);

    #[wasm_bindgen(method, js_name = disableXr)]
    fn disable_xr(this: &ArHostJs);

    #[wasm_bindgen(method, catch, js_name = requestCamera)]
    fn request_camera(this: &ArHostJs) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = attachCameraBackground)]
    fn attach_camera_background(this: &ArHostJs, stream: &web_sys::MediaStream) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = removeCameraBackground)]
    fn remove_camera_background(this: &ArHostJs);

    #[wasm_bindgen(method, js_name = modelBounds)]
    fn model_bounds(this: &ArHostJs) -> JsValue;

    #[wasm_bindgen(method, catch, js_name = attachModelClone)]
    fn attach_model_clone(this: &ArHostJs) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_name = detachModelClone)]
    fn detach_model_clone(this: &ArHostJs);

    #[wasm_bindgen(method, js_name = setAnchorTransform)]
    fn set_anchor_transform(this: &ArHostJs, values: &[f64]);

    #[wasm_bindgen(method, js_name = setAnchorVisible)]
    fn set_anchor_visible(this: &ArHostJs, visible: bool);

    #[wasm_bindgen(method, js_name = setReticle)]
    fn set_reticle(this: &ArHostJs, matrix: &JsValue);

    #[wasm_bindgen(method, js_name = cameraPose)]
    fn camera_pose(this: &ArHostJs) -> JsValue;

    #[wasm_bindgen(method, js_name = setPassthrough)]
    fn set_passthrough(this: &ArHostJs, enabled: bool);

    #[wasm_bindgen(method, js_name = startLoop)]
    fn start_loop(this: &ArHostJs, kind: &str);

    #[wasm_bindgen(method, js_name = stopLoop)]
    fn stop_loop(this: &ArHostJs);

    #[wasm_bindgen(method)]
    fn render(this: &ArHostJs);

    #[wasm_bindgen(method, js_name = showArUi)]
    fn show_ar_ui(this: &ArHostJs);

    #[wasm_bindgen(method, js_name = hideArUi)]
    fn hide_ar_ui(this: &ArHostJs);

    #[wasm_bindgen(method, js_name = setStatus)]
    fn set_status(this: &ArHostJs, message: &str);

    #[wasm_bindgen(method, js_name = setScaleControl)]
    fn set_scale_control(this: &ArHostJs, value: f64);
}

/// Await a promise (or plain value) returned by a host call
async fn settle(value: Result<JsValue, JsValue>) -> PlatformResult<JsValue> {
    let value = value.map_err(platform_error)?;
    JsFuture::from(Promise::resolve(&value))
        .await
        .map_err(platform_error)
}

/// Run a promise to completion in the background, logging a rejection
fn detach_promise(value: Result<JsValue, JsValue>, what: &'static str) -> PlatformResult<()> {
    let value = value.map_err(platform_error)?;
    spawn_local(async move {
        if let Err(e) = JsFuture::from(Promise::resolve(&value)).await {
            warn!(error = %platform_error(e), "{} rejected", what);
        }
    });
    Ok(())
}

/// `XRHitTestSource`
pub struct JsHitTestSource {
    js: JsValue,
}

impl HitTestSource for JsHitTestSource {
    fn cancel(&self) -> PlatformResult<()> {
        call_method(&self.js, "cancel", &[])
            .map(|_| ())
            .map_err(platform_error)
    }
}

/// `XRSession` plus the reference space it was negotiated with
pub struct JsXrSession {
    js: JsValue,
    reference_space: RefCell<Option<JsValue>>,
}

impl JsXrSession {
    fn new(js: JsValue) -> Self {
        Self {
            js,
            reference_space: RefCell::new(None),
        }
    }

    pub fn as_js(&self) -> &JsValue {
        &self.js
    }

    async fn request_space(&self, kind: ReferenceSpaceKind) -> PlatformResult<JsValue> {
        settle(call_method(
            &self.js,
            "requestReferenceSpace",
            &[JsValue::from_str(kind.as_str())],
        ))
        .await
    }
}

impl XrSession for JsXrSession {
    type HitTestSource = JsHitTestSource;
    type Frame = JsValue;
    /// The `XRSession` the `end` event fired on
    type Handle = JsValue;

    fn is_handle(&self, handle: &JsValue) -> bool {
        Object::is(&self.js, handle)
    }

    fn request_reference_space(
        &self,
        kind: ReferenceSpaceKind,
    ) -> LocalBoxFuture<'_, PlatformResult<()>> {
        Box::pin(async move {
            let space = self.request_space(kind).await?;
            *self.reference_space.borrow_mut() = Some(space);
            Ok(())
        })
    }

    fn request_hit_test_source(&self) -> LocalBoxFuture<'_, PlatformResult<JsHitTestSource>> {
        Box::pin(async move {
            let viewer = self.request_space(ReferenceSpaceKind::Viewer).await?;
            let options = Object::new();
            set_js_prop(&options, "space", &viewer);
            let js = settle(call_method(&self.js, "requestHitTestSource", &[options.into()])).await?;
            Ok(JsHitTestSource { js })
        })
    }

    fn hit_test_pose(&self, frame: &JsValue, source: &JsHitTestSource) -> Option<Matrix4<f64>> {
        let space = self.reference_space.borrow().clone()?;
        let results: Array = call_method(frame, "getHitTestResults", &[source.js.clone()])
            .ok()?
            .dyn_into()
            .ok()?;
        let first = results.get(0);
        if is_nullish(&first) {
            return None;
        }
        let pose = call_method(&first, "getPose", &[space]).ok()?;
        if is_nullish(&pose) {
            return None;
        }
        let transform = js_sys::Reflect::get(&pose, &"transform".into()).ok()?;
        let matrix = js_sys::Reflect::get(&transform, &"matrix".into()).ok()?;
        matrix_from_js(&matrix)
    }

    fn end(&self) -> PlatformResult<()> {
        detach_promise(call_method(&self.js, "end", &[]), "XRSession.end()")
    }
}

pub struct JsTrack(web_sys::MediaStreamTrack);

impl MediaTrack for JsTrack {
    fn stop(&self) -> PlatformResult<()> {
        self.0.stop();
        Ok(())
    }
}

pub struct JsStream(web_sys::MediaStream);

impl MediaStream for JsStream {
    type Track = JsTrack;

    fn tracks(&self) -> Vec<JsTrack> {
        self.0
            .get_tracks()
            .iter()
            .filter_map(|t| t.dyn_into::<web_sys::MediaStreamTrack>().ok())
            .map(JsTrack)
            .collect()
    }
}

/// [`ifc_ar_core::ArHost`] backed by the page's host object
pub struct JsArHost {
    js: ArHostJs,
}

impl JsArHost {
    pub fn new(js: ArHostJs) -> Self {
        Self { js }
    }
}

impl XrRuntime for JsArHost {
    type Session = JsXrSession;

    fn has_xr(&self) -> bool {
        self.js.has_xr()
    }

    fn is_secure_context(&self) -> bool {
        self.js.is_secure_context()
    }

    fn is_session_supported(&self) -> LocalBoxFuture<'_, PlatformResult<bool>> {
        Box::pin(async move {
            let supported = settle(self.js.is_session_supported()).await?;
            Ok(supported.as_bool().unwrap_or(false))
        })
    }

    fn dom_overlay_available(&self) -> bool {
        self.js.dom_overlay_available()
    }

    fn request_session(
        &self,
        features: &SessionFeatures,
    ) -> LocalBoxFuture<'_, PlatformResult<JsXrSession>> {
        let init = serde_wasm_bindgen::to_value(features)
            .map_err(|e| PlatformError::other(format!("session init: {e}")));
        Box::pin(async move {
            let init = init?;
            let session = settle(self.js.request_session(&init)).await?;
            Ok(JsXrSession::new(session))
        })
    }
}

impl CameraSource for JsArHost {
    type Stream = JsStream;

    fn request_camera(&self) -> LocalBoxFuture<'_, PlatformResult<JsStream>> {
        Box::pin(async move {
            let stream = settle(self.js.request_camera()).await?;
            stream
                .dyn_into::<web_sys::MediaStream>()
                .map(JsStream)
                .map_err(|_| PlatformError::other("requestCamera did not return a MediaStream"))
        })
    }

    fn attach_camera_background(&self, stream: &JsStream) -> PlatformResult<()> {
        self.js
            .attach_camera_background(&stream.0)
            .map_err(platform_error)
    }

    fn remove_camera_background(&self) {
        self.js.remove_camera_background();
    }
}

impl SceneHost for JsArHost {
    fn model_bounds(&self) -> Option<ModelBounds> {
        let values = to_f64_vec(&self.js.model_bounds())?;
        match values.as_slice() {
            [a, b, c, d, e, f] => Some(ModelBounds::from_corners([*a, *b, *c], [*d, *e, *f])),
            _ => {
                warn!(len = values.len(), "modelBounds must return 6 numbers");
                None
            }
        }
    }

    fn attach_model_clone(&self) -> PlatformResult<()> {
        self.js.attach_model_clone().map_err(platform_error)
    }

    fn detach_model_clone(&self) {
        self.js.detach_model_clone();
    }

    fn set_anchor_transform(&self, transform: &Transform) {
        self.js.set_anchor_transform(&transform.to_array());
    }

    fn set_anchor_visible(&self, visible: bool) {
        self.js.set_anchor_visible(visible);
    }

    fn set_reticle(&self, pose: Option<&Matrix4<f64>>) {
        let matrix = pose.map_or(JsValue::NULL, matrix_to_js);
        self.js.set_reticle(&matrix);
    }

    fn camera_pose(&self) -> CameraPose {
        to_f64_vec(&self.js.camera_pose())
            .map(|values| CameraPose::from_slice(&values))
            .unwrap_or_default()
    }
}

impl RenderHost for JsArHost {
    fn enable_xr(&self, space: ReferenceSpaceKind) {
        self.js.enable_xr(space.as_str());
    }

    fn bind_session<'a>(
        &'a self,
        session: &'a JsXrSession,
    ) -> LocalBoxFuture<'a, PlatformResult<()>> {
        Box::pin(async move {
            settle(self.js.bind_session(session.as_js())).await?;
            Ok(())
        })
    }

    fn disable_xr(&self) {
        self.js.disable_xr();
    }

    fn set_passthrough(&self, enabled: bool) {
        self.js.set_passthrough(enabled);
    }

    fn start_loop(&self, kind: LoopKind) {
        self.js.start_loop(kind.as_str());
    }

    fn stop_loop(&self) {
        self.js.stop_loop();
    }

    fn render(&self) {
        self.js.render();
    }
}

impl UiHost for JsArHost {
    fn show_ar_ui(&self) {
        self.js.show_ar_ui();
    }

    fn hide_ar_ui(&self) {
        self.js.hide_ar_ui();
    }

    fn set_status(&self, message: &str) {
        self.js.set_status(message);
    }

    fn set_scale_control(&self, value: f64) {
        self.js.set_scale_control(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_session_matches_only_its_own_object() {
        let js: JsValue = Object::new().into();
        let session = JsXrSession::new(js.clone());

        assert!(session.is_handle(&js));
        assert!(!session.is_handle(&Object::new().into()));
        assert!(!session.is_handle(&JsValue::UNDEFINED));
    }
}
