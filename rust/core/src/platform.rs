// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Host traits
//!
//! The controller never touches the browser directly. Everything it needs
//! from WebXR, the camera, the scene graph and the page is expressed here,
//! so the wasm bindings implement these on top of JavaScript objects and the
//! tests implement them with recording mocks.
//!
//! Every method takes `&self`: hosts are handles to platform objects and the
//! controller calls them while it owns its own state mutably.

use futures_util::future::LocalBoxFuture;
use nalgebra::Matrix4;

use crate::bounds::ModelBounds;
use crate::error::PlatformError;
use crate::session::{ReferenceSpaceKind, SessionFeatures};
use crate::transform::{CameraPose, Transform};

pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

/// A running immersive session
pub trait XrSession {
    type HitTestSource: HitTestSource;
    /// Per-frame object handed to the animation callback
    type Frame;
    /// What an `end` notification carries to say which session ended
    type Handle;

    /// This session is the one `handle` refers to
    fn is_handle(&self, handle: &Self::Handle) -> bool;

    /// Request a reference space. The session keeps it for pose queries.
    fn request_reference_space(
        &self,
        kind: ReferenceSpaceKind,
    ) -> LocalBoxFuture<'_, PlatformResult<()>>;

    /// Subscribe to hit-tests cast from the viewer space
    fn request_hit_test_source(&self) -> LocalBoxFuture<'_, PlatformResult<Self::HitTestSource>>;

    /// Pose of the first hit this frame, column-major, in the session's reference space
    fn hit_test_pose(&self, frame: &Self::Frame, source: &Self::HitTestSource) -> Option<Matrix4<f64>>;

    fn end(&self) -> PlatformResult<()>;
}

pub trait HitTestSource {
    fn cancel(&self) -> PlatformResult<()>;
}

/// WebXR entry points
pub trait XrRuntime {
    type Session: XrSession;

    /// `navigator.xr` exists
    fn has_xr(&self) -> bool;

    fn is_secure_context(&self) -> bool;

    /// `isSessionSupported('immersive-ar')`
    fn is_session_supported(&self) -> LocalBoxFuture<'_, PlatformResult<bool>>;

    /// The overlay root is connected to the document
    fn dom_overlay_available(&self) -> bool;

    fn request_session(
        &self,
        features: &SessionFeatures,
    ) -> LocalBoxFuture<'_, PlatformResult<Self::Session>>;
}

pub trait MediaTrack {
    fn stop(&self) -> PlatformResult<()>;
}

pub trait MediaStream {
    type Track: MediaTrack;

    fn tracks(&self) -> Vec<Self::Track>;
}

/// Device camera for the passthrough mode
pub trait CameraSource {
    type Stream: MediaStream;

    /// Environment-facing video stream
    fn request_camera(&self) -> LocalBoxFuture<'_, PlatformResult<Self::Stream>>;

    /// Show the stream behind the (transparent) canvas
    fn attach_camera_background(&self, stream: &Self::Stream) -> PlatformResult<()>;

    /// Remove the video element if present. Must be safe to call at any time.
    fn remove_camera_background(&self);
}

/// Scene graph access: the anchor node, its model clone and the reticle
pub trait SceneHost {
    /// Bounds of the loaded model, `None` when nothing is loaded
    fn model_bounds(&self) -> Option<ModelBounds>;

    /// Clone the loaded model under the anchor
    fn attach_model_clone(&self) -> PlatformResult<()>;

    fn detach_model_clone(&self);

    fn set_anchor_transform(&self, transform: &Transform);

    fn set_anchor_visible(&self, visible: bool);

    /// `None` hides the reticle
    fn set_reticle(&self, pose: Option<&Matrix4<f64>>);

    fn camera_pose(&self) -> CameraPose;
}

/// Which per-frame scheduler drives rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    /// XR frames from the session
    Xr,
    /// `requestAnimationFrame`
    Animation,
}

impl LoopKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoopKind::Xr => "xr",
            LoopKind::Animation => "animation",
        }
    }
}

pub trait RenderHost: XrRuntime {
    fn enable_xr(&self, space: ReferenceSpaceKind);

    /// Hand the session to the renderer
    fn bind_session<'a>(&'a self, session: &'a Self::Session)
        -> LocalBoxFuture<'a, PlatformResult<()>>;

    fn disable_xr(&self);

    /// Transparent clear colour for the camera background, or restore the viewer's
    fn set_passthrough(&self, enabled: bool);

    fn start_loop(&self, kind: LoopKind);

    fn stop_loop(&self);

    fn render(&self);
}

/// Page chrome
pub trait UiHost {
    fn show_ar_ui(&self);

    fn hide_ar_ui(&self);

    fn set_status(&self, message: &str);

    /// Reflect the current scale on the slider
    fn set_scale_control(&self, value: f64);
}

/// Everything the controller needs
pub trait ArHost: XrRuntime + CameraSource + SceneHost + RenderHost + UiHost {}

impl<T> ArHost for T where T: XrRuntime + CameraSource + SceneHost + RenderHost + UiHost {}

/// Hit-test source type of a host's session
pub type HostHitTestSource<H> = <<H as XrRuntime>::Session as XrSession>::HitTestSource;

/// Frame type of a host's session
pub type HostFrame<H> = <<H as XrRuntime>::Session as XrSession>::Frame;

/// Session handle type carried by a host's `end` notifications
pub type HostSessionHandle<H> = <<H as XrRuntime>::Session as XrSession>::Handle;
