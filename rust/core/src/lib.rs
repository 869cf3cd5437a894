// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-AR Core
//!
//! AR session lifecycle and model placement for the IFC viewer.
//!
//! ## Overview
//!
//! - **Session Controller**: [`ArController`] decides the AR mode, requests and
//!   ends sessions, and owns every platform resource it acquired
//! - **Strategies**: the fallback order is a [`StrategyChain`] of
//!   [`SessionStrategy`] values (WebXR with weakening feature sets, then
//!   camera passthrough)
//! - **Placement**: [`PlacementEngine`] snaps the anchor to the hit-test
//!   reticle or puts it ahead of the camera; [`ScaleFactor`] auto-scales
//!   until the user takes over
//! - **Frame loop**: [`FrameLoop`] turns per-frame hit-test data into reticle
//!   updates and draw calls
//!
//! The browser is reached only through the traits in [`platform`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_ar_core::{ArConfig, ArController, TapEvent};
//!
//! let controller = ArController::new(host, ArConfig::default())?;
//! let state = controller.enter_ar().await?;
//!
//! // from the page's pointer handler
//! controller.on_tap(&TapEvent::on_path(["three-canvas", "app"]));
//!
//! controller.exit_ar();
//! ```

pub mod bounds;
pub mod config;
pub mod controller;
pub mod error;
pub mod frame;
pub mod input;
pub mod placement;
pub mod platform;
pub mod scale;
pub mod session;
pub mod strategy;
pub mod transform;

pub use bounds::ModelBounds;
pub use config::{ArConfig, DEFAULT_UI_CHROME};
pub use controller::ArController;
pub use error::{Error, ErrorClass, PlatformError, PlatformErrorKind, Result};
pub use frame::{FrameInput, FrameLoop, FrameOutcome, LoopState, Reticle, ReticleChange};
pub use input::{Gesture, TapEvent, TapOutcome, UiChrome};
pub use placement::{
    Anchor, CameraRelative, Placement, PlacementEngine, PlacementInput, PlacementKind,
    PlacementStrategy, ReticleAnchored,
};
pub use platform::{
    ArHost, CameraSource, HitTestSource, HostFrame, HostSessionHandle, LoopKind, MediaStream,
    MediaTrack, PlatformResult, RenderHost, SceneHost, UiHost, XrRuntime, XrSession,
};
pub use scale::{auto_scale, ScaleFactor};
pub use session::{
    ActiveSession, FeatureTier, OverlayRoot, ReferenceSpaceKind, SessionFeatures, SessionMode,
    SessionState,
};
pub use strategy::{CameraPassthroughStrategy, SessionStrategy, StrategyChain, WebXrStrategy};
pub use transform::{forward, yaw_of, CameraPose, Transform};

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, UnitQuaternion, Vector3};
