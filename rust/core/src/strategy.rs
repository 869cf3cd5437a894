// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session strategies
//!
//! Each way of starting AR is a strategy with an `attempt`. The controller
//! walks a [`StrategyChain`] in order; the chain is plain data so the
//! fallback order can be inspected and replaced.
//!
//! A strategy that fails must leave nothing behind: a session it opened is
//! ended, a camera stream it acquired has every track stopped.

use futures_util::future::LocalBoxFuture;
use tracing::{debug, info, warn};

use crate::config::ArConfig;
use crate::error::{Error, PlatformError, Result};
use crate::platform::{
    ArHost, CameraSource, HostHitTestSource, MediaStream, MediaTrack, RenderHost, XrRuntime,
    XrSession,
};
use crate::session::{
    ActiveSession, FeatureTier, OverlayRoot, PseudoArActive, ReferenceSpaceKind, SessionFeatures,
    SessionMode, XrActive,
};

pub trait SessionStrategy<H: ArHost> {
    fn mode(&self) -> SessionMode;

    fn name(&self) -> &'static str;

    fn attempt<'a>(
        &'a self,
        host: &'a H,
        config: &'a ArConfig,
    ) -> LocalBoxFuture<'a, Result<ActiveSession<H>>>;
}

/// Native immersive AR with a given feature tier
#[derive(Debug, Clone, Copy)]
pub struct WebXrStrategy {
    pub tier: FeatureTier,
}

impl WebXrStrategy {
    pub fn new(tier: FeatureTier) -> Self {
        Self { tier }
    }

    async fn prepare<H: ArHost>(
        &self,
        host: &H,
        config: &ArConfig,
        session: &H::Session,
    ) -> Result<(ReferenceSpaceKind, Option<HostHitTestSource<H>>)> {
        let name = self.tier.strategy_name();

        let mut reference_space = None;
        let mut last_error = None;
        for &kind in &config.reference_spaces {
            match session.request_reference_space(kind).await {
                Ok(()) => {
                    reference_space = Some(kind);
                    break;
                }
                Err(e) => {
                    debug!(strategy = name, space = kind.as_str(), error = %e, "reference space rejected");
                    last_error = Some(e);
                }
            }
        }
        let reference_space = reference_space.ok_or_else(|| Error::NegotiationFailed {
            strategy: name,
            source: last_error
                .unwrap_or_else(|| PlatformError::other("no reference space configured")),
        })?;

        host.enable_xr(reference_space);
        host.bind_session(session)
            .await
            .map_err(|e| Error::from_platform(SessionMode::WebXr, name, e))?;

        let hit_test = if config.hit_test {
            match session.request_hit_test_source().await {
                Ok(source) => Some(source),
                Err(e) => {
                    info!(strategy = name, error = %e, "hit-test unavailable, placing relative to camera");
                    None
                }
            }
        } else {
            None
        };

        Ok((reference_space, hit_test))
    }
}

impl<H: ArHost> SessionStrategy<H> for WebXrStrategy {
    fn mode(&self) -> SessionMode {
        SessionMode::WebXr
    }

    fn name(&self) -> &'static str {
        self.tier.strategy_name()
    }

    fn attempt<'a>(
        &'a self,
        host: &'a H,
        config: &'a ArConfig,
    ) -> LocalBoxFuture<'a, Result<ActiveSession<H>>> {
        Box::pin(async move {
            let mode = SessionMode::WebXr;
            let name = self.tier.strategy_name();

            if !host.has_xr() {
                return Err(Error::Unsupported { mode });
            }
            let supported = match host.is_session_supported().await {
                Ok(supported) => supported,
                Err(e) => {
                    debug!(error = %e, "isSessionSupported rejected, treating as unsupported");
                    false
                }
            };
            if !supported {
                return Err(Error::Unsupported { mode });
            }

            let overlay_root = config.dom_overlay.then(|| {
                if host.dom_overlay_available() {
                    OverlayRoot::Overlay
                } else {
                    OverlayRoot::Body
                }
            });
            let features = SessionFeatures::for_tier(self.tier, config.hit_test, overlay_root);
            debug!(strategy = name, ?features, "requesting immersive-ar session");

            let session = host
                .request_session(&features)
                .await
                .map_err(|e| Error::from_platform(mode, name, e))?;

            match self.prepare(host, config, &session).await {
                Ok((reference_space, hit_test)) => Ok(ActiveSession::WebXr(XrActive {
                    session,
                    reference_space,
                    hit_test,
                    tier: self.tier,
                })),
                Err(e) => {
                    host.disable_xr();
                    if let Err(end_err) = session.end() {
                        warn!(strategy = name, error = %end_err, "failed to end rejected session");
                    }
                    Err(e)
                }
            }
        })
    }
}

/// Camera stream behind a transparent canvas
#[derive(Debug, Clone, Copy, Default)]
pub struct CameraPassthroughStrategy;

impl<H: ArHost> SessionStrategy<H> for CameraPassthroughStrategy {
    fn mode(&self) -> SessionMode {
        SessionMode::PseudoAr
    }

    fn name(&self) -> &'static str {
        "camera-passthrough"
    }

    fn attempt<'a>(
        &'a self,
        host: &'a H,
        _config: &'a ArConfig,
    ) -> LocalBoxFuture<'a, Result<ActiveSession<H>>> {
        Box::pin(async move {
            let mode = SessionMode::PseudoAr;
            let name = "camera-passthrough";

            let stream = host
                .request_camera()
                .await
                .map_err(|e| Error::from_platform(mode, name, e))?;

            if let Err(e) = host.attach_camera_background(&stream) {
                stop_tracks(&stream);
                host.remove_camera_background();
                return Err(Error::from_platform(mode, name, e));
            }
            host.set_passthrough(true);

            Ok(ActiveSession::PseudoAr(PseudoArActive { stream }))
        })
    }
}

/// Stop every track, one at a time. Returns how many stopped cleanly.
pub fn stop_tracks<S: MediaStream>(stream: &S) -> usize {
    let mut stopped = 0;
    for track in stream.tracks() {
        match track.stop() {
            Ok(()) => stopped += 1,
            Err(e) => warn!(error = %e, "failed to stop media track"),
        }
    }
    stopped
}

/// Ordered session strategies
pub struct StrategyChain<H: ArHost> {
    strategies: Vec<Box<dyn SessionStrategy<H>>>,
}

impl<H: ArHost + 'static> StrategyChain<H> {
    /// WebXR full, relaxed, minimal, then camera passthrough
    pub fn standard() -> Self {
        let mut strategies: Vec<Box<dyn SessionStrategy<H>>> = FeatureTier::ALL
            .iter()
            .map(|&tier| Box::new(WebXrStrategy::new(tier)) as Box<dyn SessionStrategy<H>>)
            .collect();
        strategies.push(Box::new(CameraPassthroughStrategy));
        Self { strategies }
    }
}

impl<H: ArHost> StrategyChain<H> {
    pub fn new(strategies: Vec<Box<dyn SessionStrategy<H>>>) -> Self {
        Self { strategies }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn SessionStrategy<H>> {
        self.strategies.iter().map(|s| s.as_ref())
    }
}
