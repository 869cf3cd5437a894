// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! AR session controller
//!
//! Owns the session, the anchor, the frame loop and the scale latch. All
//! entry points take `&self` so the controller can be shared behind an `Rc`
//! with the platform's event callbacks. State lives in a `RefCell` that is
//! never borrowed across an `.await` or across a call that may end a session.

use std::cell::{Cell, RefCell};

use tracing::{debug, info, warn};

use crate::config::ArConfig;
use crate::error::{Error, ErrorClass, Result};
use crate::frame::{FrameInput, FrameLoop, FrameOutcome, ReticleChange};
use crate::input::{Gesture, TapEvent, TapOutcome, UiChrome};
use crate::placement::{Anchor, PlacementEngine, PlacementInput};
use crate::platform::{
    ArHost, CameraSource, HitTestSource, HostFrame, HostSessionHandle, LoopKind, RenderHost,
    SceneHost, UiHost, XrRuntime, XrSession,
};
use crate::scale::ScaleFactor;
use crate::session::{ActiveSession, SessionMode, SessionState};
use crate::strategy::{stop_tracks, StrategyChain};

struct Inner<H: ArHost> {
    active: Option<ActiveSession<H>>,
    /// The platform ended the session itself; don't call `end()` again
    platform_ended: bool,
    frames: FrameLoop,
    anchor: Anchor,
    scale: ScaleFactor,
}

/// Clears the in-flight flag however `enter_ar` returns
struct EnterGuard<'a>(&'a Cell<bool>);

impl Drop for EnterGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

pub struct ArController<H: ArHost> {
    host: H,
    config: ArConfig,
    strategies: StrategyChain<H>,
    placement: PlacementEngine,
    chrome: UiChrome,
    inner: RefCell<Inner<H>>,
    entering: Cell<bool>,
    abort_requested: Cell<bool>,
}

impl<H: ArHost + 'static> ArController<H> {
    /// Controller with the standard fallback chain
    pub fn new(host: H, config: ArConfig) -> Result<Self> {
        Self::with_strategies(host, config, StrategyChain::standard())
    }
}

impl<H: ArHost> ArController<H> {
    pub fn with_strategies(host: H, config: ArConfig, strategies: StrategyChain<H>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            placement: PlacementEngine::from_config(&config),
            chrome: UiChrome::new(config.ui_chrome.iter().cloned()),
            inner: RefCell::new(Inner {
                active: None,
                platform_ended: false,
                frames: FrameLoop::new(),
                anchor: Anchor::default(),
                scale: ScaleFactor::new(&config),
            }),
            host,
            config,
            strategies,
            entering: Cell::new(false),
            abort_requested: Cell::new(false),
        })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &ArConfig {
        &self.config
    }

    pub fn strategies(&self) -> &StrategyChain<H> {
        &self.strategies
    }

    pub fn state(&self) -> SessionState {
        self.inner
            .borrow()
            .active
            .as_ref()
            .map_or(SessionState::Inactive, |a| a.state())
    }

    pub fn is_entering(&self) -> bool {
        self.entering.get()
    }

    pub fn anchor(&self) -> Anchor {
        self.inner.borrow().anchor.clone()
    }

    /// Current scale, `None` before the first auto-scale
    pub fn scale(&self) -> Option<f64> {
        self.inner.borrow().scale.current()
    }

    pub fn is_scale_manual(&self) -> bool {
        self.inner.borrow().scale.is_manual()
    }

    pub fn reticle_visible(&self) -> bool {
        self.inner.borrow().frames.reticle().is_visible()
    }

    pub fn has_hit_test(&self) -> bool {
        matches!(
            &self.inner.borrow().active,
            Some(ActiveSession::WebXr(xr)) if xr.hit_test.is_some()
        )
    }

    /// Start AR with the first strategy that succeeds.
    ///
    /// Returns `Inactive` when `exit_ar` was called while starting.
    pub async fn enter_ar(&self) -> Result<SessionState> {
        if self.entering.replace(true) {
            debug!("enter_ar ignored, already in flight");
            return Err(Error::EnterInProgress);
        }
        let _guard = EnterGuard(&self.entering);
        self.abort_requested.set(false);

        if self.state().is_active() {
            info!(state = self.state().as_str(), "tearing down running session before re-entry");
            self.teardown();
        }

        if !self.host.is_secure_context() {
            return Err(self.fail(Error::InsecureContext));
        }

        let mut skipped: Vec<SessionMode> = Vec::new();
        let mut notice: Option<Error> = None;
        let mut last_error: Option<Error> = None;

        for strategy in self.strategies.iter() {
            let mode = strategy.mode();
            if skipped.contains(&mode) {
                continue;
            }
            debug!(strategy = strategy.name(), "attempting AR strategy");

            match strategy.attempt(&self.host, &self.config).await {
                Ok(active) => {
                    if self.abort_requested.get() {
                        info!(strategy = strategy.name(), "exit requested while starting, releasing");
                        self.inner.borrow_mut().active = Some(active);
                        self.teardown();
                        return Ok(SessionState::Inactive);
                    }
                    if let Some(notice) = &notice {
                        self.host.set_status(&notice.user_message());
                    }
                    return Ok(self.activate(active));
                }
                Err(e) => {
                    match e.class() {
                        ErrorClass::CapabilityUnsupported => {
                            debug!(strategy = strategy.name(), "{}", e);
                            skipped.push(mode);
                        }
                        ErrorClass::PermissionDenied => {
                            warn!(strategy = strategy.name(), error = %e, "mode refused");
                            skipped.push(mode);
                            notice = Some(e.clone());
                        }
                        ErrorClass::NegotiationFailure => {
                            debug!(strategy = strategy.name(), error = %e, "trying weaker configuration");
                        }
                        ErrorClass::Unexpected => {
                            warn!(strategy = strategy.name(), error = %e, "strategy failed");
                        }
                    }
                    last_error = Some(e);
                }
            }

            if self.abort_requested.get() {
                self.teardown();
                return Ok(SessionState::Inactive);
            }
        }

        Err(self.fail(last_error.unwrap_or(Error::NoModeAvailable)))
    }

    /// End any session. Idempotent; safe from any state.
    pub fn exit_ar(&self) {
        if self.entering.get() {
            self.abort_requested.set(true);
        }
        self.teardown();
    }

    /// The platform ended `ended` (e.g. the user closed the system AR UI).
    ///
    /// Only the running WebXR session is torn down. Sessions the controller
    /// already ended itself report here late and are ignored, as is any
    /// notification while a start is in flight. Returns whether the running
    /// session was the one that ended.
    pub fn handle_session_end(&self, ended: &HostSessionHandle<H>) -> bool {
        let current = {
            let mut inner = self.inner.borrow_mut();
            let current = matches!(
                &inner.active,
                Some(ActiveSession::WebXr(xr)) if xr.session.is_handle(ended)
            );
            if current {
                inner.platform_ended = true;
            }
            current
        };
        if !current {
            debug!("end notification for a session that is not running, ignored");
            return false;
        }
        self.teardown();
        true
    }

    /// One XR frame from the session's animation callback
    pub fn on_xr_frame(&self, frame: &HostFrame<H>) {
        let hit_pose = {
            let inner = self.inner.borrow();
            match &inner.active {
                Some(ActiveSession::WebXr(xr)) => xr
                    .hit_test
                    .as_ref()
                    .and_then(|source| xr.session.hit_test_pose(frame, source)),
                Some(ActiveSession::PseudoAr(_)) => None,
                None => return,
            }
        };
        let outcome = self
            .inner
            .borrow_mut()
            .frames
            .on_frame(FrameInput::Xr { hit_pose });
        self.apply_frame(outcome);
    }

    /// One `requestAnimationFrame` tick
    pub fn on_animation_frame(&self) {
        let outcome = self.inner.borrow_mut().frames.on_frame(FrameInput::Animation);
        self.apply_frame(outcome);
    }

    pub fn on_tap(&self, tap: &TapEvent) -> TapOutcome {
        if !self.state().is_active() {
            return TapOutcome::Inactive;
        }
        if self.chrome.contains(tap) {
            debug!(path = ?tap.target_path, "tap on UI chrome ignored");
            return TapOutcome::Ignored;
        }
        self.place()
    }

    /// Place the model now: on the reticle if visible, else ahead of the camera
    pub fn place(&self) -> TapOutcome {
        if !self.state().is_active() {
            return TapOutcome::Inactive;
        }
        let Some(bounds) = self.host.model_bounds() else {
            debug!("no model loaded, nothing to place");
            return TapOutcome::NoModel;
        };

        if !self.inner.borrow().anchor.has_clone {
            if let Err(e) = self.host.attach_model_clone() {
                warn!(error = %e, "failed to clone model into anchor");
                return TapOutcome::NoModel;
            }
            self.inner.borrow_mut().anchor.has_clone = true;
        }

        let camera = self.host.camera_pose();
        let (placement, scale, auto) = {
            let mut inner = self.inner.borrow_mut();
            let reticle = inner.frames.reticle().visible_pose().copied();
            let input = PlacementInput {
                reticle: reticle.as_ref(),
                camera: Some(&camera),
            };
            let Some(mut placement) = self.placement.place(&input) else {
                return TapOutcome::NoModel;
            };

            let scale = inner.scale.resolve(bounds.diagonal());
            placement.transform.set_uniform_scale(scale);
            inner.anchor.transform = placement.transform.clone();
            inner.anchor.placed = true;
            (placement, scale, !inner.scale.is_manual())
        };

        self.host.set_anchor_transform(&placement.transform);
        self.host.set_anchor_visible(true);
        if auto {
            self.host.set_scale_control(scale);
        }
        info!(kind = ?placement.kind, scale, "model placed");
        TapOutcome::Placed(placement.kind)
    }

    /// Scale slider input. Latches manual scale until the next exit.
    ///
    /// Rejected with [`Error::NotActive`] outside a session, so nothing
    /// carries into the next `enter_ar`.
    pub fn set_manual_scale(&self, value: f64) -> Result<f64> {
        let (scale, transform) = {
            let mut inner = self.inner.borrow_mut();
            if inner.active.is_none() {
                return Err(Error::NotActive);
            }
            let scale = inner.scale.set_manual(value)?;
            if inner.anchor.placed {
                inner.anchor.transform.set_uniform_scale(scale);
                (scale, Some(inner.anchor.transform.clone()))
            } else {
                (scale, None)
            }
        };
        if let Some(transform) = transform {
            self.host.set_anchor_transform(&transform);
        }
        Ok(scale)
    }

    /// Drag/pinch/wheel in passthrough mode. Returns whether the anchor changed.
    pub fn on_gesture(&self, gesture: Gesture) -> bool {
        if self.state() != SessionState::PseudoArActive {
            return false;
        }

        let (transform, new_scale) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.anchor.placed {
                return false;
            }
            let new_scale = match gesture {
                Gesture::Drag { dx } => {
                    inner
                        .anchor
                        .transform
                        .rotate_yaw(dx * self.config.drag_radians_per_pixel);
                    None
                }
                Gesture::Pinch { factor } => match inner.scale.multiply(factor) {
                    Ok(s) => Some(s),
                    Err(_) => return false,
                },
                Gesture::Wheel { dy } => {
                    match inner.scale.multiply((-dy * self.config.wheel_sensitivity).exp()) {
                        Ok(s) => Some(s),
                        Err(_) => return false,
                    }
                }
            };
            if let Some(s) = new_scale {
                inner.anchor.transform.set_uniform_scale(s);
            }
            (inner.anchor.transform.clone(), new_scale)
        };

        self.host.set_anchor_transform(&transform);
        if let Some(s) = new_scale {
            self.host.set_scale_control(s);
        }
        true
    }

    fn activate(&self, active: ActiveSession<H>) -> SessionState {
        let state = active.state();
        let kind = match state {
            SessionState::WebXrActive => LoopKind::Xr,
            _ => LoopKind::Animation,
        };
        {
            let mut inner = self.inner.borrow_mut();
            inner.active = Some(active);
            inner.platform_ended = false;
            inner.frames.start(kind);
        }

        self.host.start_loop(kind);
        self.host.show_ar_ui();
        info!(state = state.as_str(), hit_test = self.has_hit_test(), "AR session started");

        if state == SessionState::PseudoArActive && self.config.place_on_passthrough_start {
            self.place();
        }
        state
    }

    /// Terminal failure: log, restore, report
    fn fail(&self, err: Error) -> Error {
        warn!(error = %err, "AR could not be started");
        self.teardown();
        self.host.set_status(&err.user_message());
        err
    }

    fn teardown(&self) {
        let (active, platform_ended, had_clone) = {
            let mut inner = self.inner.borrow_mut();
            inner.frames.stop();
            let active = inner.active.take();
            let platform_ended = std::mem::take(&mut inner.platform_ended);
            let had_clone = inner.anchor.has_clone;
            inner.anchor.clear();
            inner.scale.reset();
            (active, platform_ended, had_clone)
        };

        self.host.stop_loop();
        if let Some(active) = active {
            let state = active.state();
            self.release(active, platform_ended);
            info!(state = state.as_str(), "AR session ended");
        }

        self.host.disable_xr();
        self.host.remove_camera_background();
        self.host.set_passthrough(false);
        self.host.set_reticle(None);
        if had_clone {
            self.host.detach_model_clone();
        }
        self.host.set_anchor_visible(false);
        self.host.hide_ar_ui();
    }

    fn release(&self, active: ActiveSession<H>, platform_ended: bool) {
        match active {
            ActiveSession::WebXr(xr) => {
                if let Some(source) = &xr.hit_test {
                    if let Err(e) = source.cancel() {
                        warn!(error = %e, "failed to cancel hit-test source");
                    }
                }
                if !platform_ended {
                    if let Err(e) = xr.session.end() {
                        warn!(error = %e, "failed to end XR session");
                    }
                }
            }
            ActiveSession::PseudoAr(passthrough) => {
                let stopped = stop_tracks(&passthrough.stream);
                debug!(stopped, "camera tracks stopped");
            }
        }
    }

    fn apply_frame(&self, outcome: FrameOutcome) {
        match outcome.reticle {
            ReticleChange::Show(pose) => self.host.set_reticle(Some(&pose)),
            ReticleChange::Hide => self.host.set_reticle(None),
            ReticleChange::Unchanged => {}
        }
        if outcome.render {
            self.host.render();
        }
    }
}
