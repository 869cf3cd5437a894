// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Recording host for controller tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use ifc_ar_core::{
    ArConfig, ArController, CameraPose, CameraSource, HitTestSource, LoopKind, Matrix4,
    MediaStream, MediaTrack, ModelBounds, PlatformError, PlatformErrorKind, PlatformResult,
    ReferenceSpaceKind, RenderHost, SceneHost, SessionFeatures, Transform, UiHost, XrRuntime,
    XrSession,
};

#[derive(Default)]
pub struct SessionLog {
    pub ended: Cell<usize>,
    pub hit_tests_cancelled: Cell<usize>,
    pub reference_spaces: RefCell<Vec<ReferenceSpaceKind>>,
}

pub struct MockSession {
    log: Rc<SessionLog>,
    rejected_spaces: Vec<ReferenceSpaceKind>,
    hit_test: Result<(), PlatformError>,
    end_error: Option<PlatformError>,
}

pub struct MockHitTest {
    log: Rc<SessionLog>,
}

/// What the XR frame callback would see
#[derive(Debug, Clone, Default)]
pub struct MockFrame {
    pub hit: Option<Matrix4<f64>>,
}

impl MockFrame {
    pub fn hit_at(x: f64, y: f64, z: f64) -> Self {
        Self {
            hit: Some(Matrix4::new_translation(&ifc_ar_core::Vector3::new(x, y, z))),
        }
    }

    pub fn miss() -> Self {
        Self { hit: None }
    }
}

impl HitTestSource for MockHitTest {
    fn cancel(&self) -> PlatformResult<()> {
        self.log.hit_tests_cancelled.set(self.log.hit_tests_cancelled.get() + 1);
        Ok(())
    }
}

impl XrSession for MockSession {
    type HitTestSource = MockHitTest;
    type Frame = MockFrame;
    type Handle = Rc<SessionLog>;

    fn is_handle(&self, handle: &Rc<SessionLog>) -> bool {
        Rc::ptr_eq(&self.log, handle)
    }

    fn request_reference_space(
        &self,
        kind: ReferenceSpaceKind,
    ) -> LocalBoxFuture<'_, PlatformResult<()>> {
        Box::pin(async move {
            if self.rejected_spaces.contains(&kind) {
                return Err(PlatformError::new(PlatformErrorKind::NotSupportedError, kind.as_str()));
            }
            self.log.reference_spaces.borrow_mut().push(kind);
            Ok(())
        })
    }

    fn request_hit_test_source(&self) -> LocalBoxFuture<'_, PlatformResult<MockHitTest>> {
        Box::pin(async move {
            self.hit_test.clone()?;
            Ok(MockHitTest {
                log: self.log.clone(),
            })
        })
    }

    fn hit_test_pose(&self, frame: &MockFrame, _source: &MockHitTest) -> Option<Matrix4<f64>> {
        frame.hit
    }

    fn end(&self) -> PlatformResult<()> {
        self.log.ended.set(self.log.ended.get() + 1);
        match &self.end_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

pub struct MockTrack {
    stopped: Rc<Cell<bool>>,
    fail: bool,
}

impl MediaTrack for MockTrack {
    fn stop(&self) -> PlatformResult<()> {
        if self.fail {
            return Err(PlatformError::other("track refused to stop"));
        }
        self.stopped.set(true);
        Ok(())
    }
}

pub struct MockStream {
    tracks: Vec<(Rc<Cell<bool>>, bool)>,
}

impl MediaStream for MockStream {
    type Track = MockTrack;

    fn tracks(&self) -> Vec<MockTrack> {
        self.tracks
            .iter()
            .map(|(stopped, fail)| MockTrack {
                stopped: stopped.clone(),
                fail: *fail,
            })
            .collect()
    }
}

pub struct MockHost {
    // platform capabilities
    pub has_xr: Cell<bool>,
    pub secure: Cell<bool>,
    pub supported: RefCell<PlatformResult<bool>>,
    pub overlay: Cell<bool>,
    /// Responses for successive `request_session` calls; empty means success
    pub session_responses: RefCell<Vec<PlatformResult<()>>>,
    pub rejected_spaces: RefCell<Vec<ReferenceSpaceKind>>,
    pub hit_test: RefCell<PlatformResult<()>>,
    pub bind_error: RefCell<Option<PlatformError>>,
    pub end_error: RefCell<Option<PlatformError>>,
    pub camera: RefCell<PlatformResult<usize>>,
    pub failing_track: Cell<Option<usize>>,
    pub attach_error: RefCell<Option<PlatformError>>,

    // recorded
    pub requested_features: RefCell<Vec<SessionFeatures>>,
    pub camera_requests: Cell<usize>,
    pub sessions: RefCell<Vec<Rc<SessionLog>>>,
    pub tracks: RefCell<Vec<Rc<Cell<bool>>>>,
    pub model: RefCell<Option<ModelBounds>>,
    pub clones: Cell<usize>,
    pub max_clones: Cell<usize>,
    pub anchor: RefCell<Option<Transform>>,
    pub anchor_visible: Cell<bool>,
    pub reticle: RefCell<Option<Matrix4<f64>>>,
    pub camera_pose: RefCell<CameraPose>,
    pub xr_enabled: Cell<Option<ReferenceSpaceKind>>,
    pub passthrough: Cell<bool>,
    pub background: Cell<bool>,
    pub running_loop: Cell<Option<LoopKind>>,
    pub renders: Cell<usize>,
    pub ar_ui: Cell<bool>,
    pub statuses: RefCell<Vec<String>>,
    pub scale_control: Cell<Option<f64>>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            has_xr: Cell::new(true),
            secure: Cell::new(true),
            supported: RefCell::new(Ok(true)),
            overlay: Cell::new(true),
            session_responses: RefCell::new(Vec::new()),
            rejected_spaces: RefCell::new(Vec::new()),
            hit_test: RefCell::new(Ok(())),
            bind_error: RefCell::new(None),
            end_error: RefCell::new(None),
            camera: RefCell::new(Ok(2)),
            failing_track: Cell::new(None),
            attach_error: RefCell::new(None),
            requested_features: RefCell::new(Vec::new()),
            camera_requests: Cell::new(0),
            sessions: RefCell::new(Vec::new()),
            tracks: RefCell::new(Vec::new()),
            model: RefCell::new(Some(ModelBounds::from_corners([0.0, 0.0, 0.0], [3.0, 4.0, 12.0]))),
            clones: Cell::new(0),
            max_clones: Cell::new(0),
            anchor: RefCell::new(None),
            anchor_visible: Cell::new(false),
            reticle: RefCell::new(None),
            camera_pose: RefCell::new(CameraPose::default()),
            xr_enabled: Cell::new(None),
            passthrough: Cell::new(false),
            background: Cell::new(false),
            running_loop: Cell::new(None),
            renders: Cell::new(0),
            ar_ui: Cell::new(false),
            statuses: RefCell::new(Vec::new()),
            scale_control: Cell::new(None),
        }
    }
}

impl MockHost {
    /// A device without any WebXR
    pub fn without_xr() -> Self {
        let host = Self::default();
        host.has_xr.set(false);
        host
    }

    pub fn session_requests(&self) -> usize {
        self.requested_features.borrow().len()
    }

    pub fn last_session(&self) -> Option<Rc<SessionLog>> {
        self.sessions.borrow().last().cloned()
    }

    pub fn last_status(&self) -> Option<String> {
        self.statuses.borrow().last().cloned()
    }

    pub fn all_tracks_stopped(&self) -> bool {
        self.tracks.borrow().iter().all(|t| t.get())
    }

    /// The page as it looks with no AR running
    pub fn exited_snapshot(&self) -> (bool, bool, bool, bool, Option<LoopKind>, usize, bool) {
        (
            self.ar_ui.get(),
            self.anchor_visible.get(),
            self.background.get(),
            self.passthrough.get(),
            self.running_loop.get(),
            self.clones.get(),
            self.reticle.borrow().is_some(),
        )
    }
}

impl XrRuntime for MockHost {
    type Session = MockSession;

    fn has_xr(&self) -> bool {
        self.has_xr.get()
    }

    fn is_secure_context(&self) -> bool {
        self.secure.get()
    }

    fn is_session_supported(&self) -> LocalBoxFuture<'_, PlatformResult<bool>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            self.supported.borrow().clone()
        })
    }

    fn dom_overlay_available(&self) -> bool {
        self.overlay.get()
    }

    fn request_session(
        &self,
        features: &SessionFeatures,
    ) -> LocalBoxFuture<'_, PlatformResult<MockSession>> {
        let features = features.clone();
        Box::pin(async move {
            tokio::task::yield_now().await;
            self.requested_features.borrow_mut().push(features);

            let response = {
                let mut responses = self.session_responses.borrow_mut();
                if responses.is_empty() {
                    Ok(())
                } else {
                    responses.remove(0)
                }
            };
            response?;

            let log = Rc::new(SessionLog::default());
            self.sessions.borrow_mut().push(log.clone());
            Ok(MockSession {
                log,
                rejected_spaces: self.rejected_spaces.borrow().clone(),
                hit_test: self.hit_test.borrow().clone(),
                end_error: self.end_error.borrow().clone(),
            })
        })
    }
}

impl CameraSource for MockHost {
    type Stream = MockStream;

    fn request_camera(&self) -> LocalBoxFuture<'_, PlatformResult<MockStream>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            self.camera_requests.set(self.camera_requests.get() + 1);
            let count = self.camera.borrow().clone()?;
            let failing = self.failing_track.get();
            let tracks: Vec<(Rc<Cell<bool>>, bool)> = (0..count)
                .map(|i| (Rc::new(Cell::new(false)), failing == Some(i)))
                .collect();
            self.tracks
                .borrow_mut()
                .extend(tracks.iter().filter(|(_, fail)| !fail).map(|(t, _)| t.clone()));
            Ok(MockStream { tracks })
        })
    }

    fn attach_camera_background(&self, _stream: &MockStream) -> PlatformResult<()> {
        if let Some(e) = self.attach_error.borrow().clone() {
            return Err(e);
        }
        self.background.set(true);
        Ok(())
    }

    fn remove_camera_background(&self) {
        self.background.set(false);
    }
}

impl SceneHost for MockHost {
    fn model_bounds(&self) -> Option<ModelBounds> {
        self.model.borrow().clone()
    }

    fn attach_model_clone(&self) -> PlatformResult<()> {
        self.clones.set(self.clones.get() + 1);
        self.max_clones.set(self.max_clones.get().max(self.clones.get()));
        Ok(())
    }

    fn detach_model_clone(&self) {
        self.clones.set(self.clones.get().saturating_sub(1));
    }

    fn set_anchor_transform(&self, transform: &Transform) {
        *self.anchor.borrow_mut() = Some(transform.clone());
    }

    fn set_anchor_visible(&self, visible: bool) {
        self.anchor_visible.set(visible);
    }

    fn set_reticle(&self, pose: Option<&Matrix4<f64>>) {
        *self.reticle.borrow_mut() = pose.copied();
    }

    fn camera_pose(&self) -> CameraPose {
        self.camera_pose.borrow().clone()
    }
}

impl RenderHost for MockHost {
    fn enable_xr(&self, space: ReferenceSpaceKind) {
        self.xr_enabled.set(Some(space));
    }

    fn bind_session<'a>(
        &'a self,
        _session: &'a MockSession,
    ) -> LocalBoxFuture<'a, PlatformResult<()>> {
        Box::pin(async move {
            match self.bind_error.borrow().clone() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        })
    }

    fn disable_xr(&self) {
        self.xr_enabled.set(None);
    }

    fn set_passthrough(&self, enabled: bool) {
        self.passthrough.set(enabled);
    }

    fn start_loop(&self, kind: LoopKind) {
        self.running_loop.set(Some(kind));
    }

    fn stop_loop(&self) {
        self.running_loop.set(None);
    }

    fn render(&self) {
        self.renders.set(self.renders.get() + 1);
    }
}

impl UiHost for MockHost {
    fn show_ar_ui(&self) {
        self.ar_ui.set(true);
    }

    fn hide_ar_ui(&self) {
        self.ar_ui.set(false);
    }

    fn set_status(&self, message: &str) {
        self.statuses.borrow_mut().push(message.to_string());
    }

    fn set_scale_control(&self, value: f64) {
        self.scale_control.set(Some(value));
    }
}

pub fn controller(host: MockHost) -> ArController<MockHost> {
    ArController::new(host, ArConfig::default()).unwrap()
}

pub fn controller_with(host: MockHost, config: ArConfig) -> ArController<MockHost> {
    ArController::new(host, config).unwrap()
}

pub fn denied(message: &str) -> PlatformError {
    PlatformError::new(PlatformErrorKind::NotAllowedError, message)
}

pub fn not_supported(message: &str) -> PlatformError {
    PlatformError::new(PlatformErrorKind::NotSupportedError, message)
}
