// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session state and feature descriptors

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::platform::{CameraSource, HostHitTestSource, XrRuntime};

/// The two ways AR can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionMode {
    WebXr,
    PseudoAr,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::WebXr => f.write_str("WebXR AR"),
            SessionMode::PseudoAr => f.write_str("camera passthrough"),
        }
    }
}

/// Controller state. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Inactive,
    WebXrActive,
    PseudoArActive,
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        !matches!(self, SessionState::Inactive)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Inactive => "inactive",
            SessionState::WebXrActive => "webxr",
            SessionState::PseudoArActive => "pseudo-ar",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceSpaceKind {
    LocalFloor,
    Local,
    Viewer,
}

impl ReferenceSpaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceSpaceKind::LocalFloor => "local-floor",
            ReferenceSpaceKind::Local => "local",
            ReferenceSpaceKind::Viewer => "viewer",
        }
    }
}

/// How demanding a WebXR session request is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FeatureTier {
    /// hit-test and local-floor required
    Full,
    /// everything optional
    Relaxed,
    /// bare immersive-ar
    Minimal,
}

impl FeatureTier {
    pub const ALL: [FeatureTier; 3] = [FeatureTier::Full, FeatureTier::Relaxed, FeatureTier::Minimal];

    pub fn strategy_name(&self) -> &'static str {
        match self {
            FeatureTier::Full => "webxr-full",
            FeatureTier::Relaxed => "webxr-relaxed",
            FeatureTier::Minimal => "webxr-minimal",
        }
    }
}

pub const FEATURE_HIT_TEST: &str = "hit-test";
pub const FEATURE_LOCAL_FLOOR: &str = "local-floor";
pub const FEATURE_DOM_OVERLAY: &str = "dom-overlay";

/// Element the DOM overlay is rooted at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayRoot {
    /// The viewer's overlay element
    Overlay,
    /// `document.body`, when the overlay element is not in the document
    Body,
}

/// Feature requirements for `requestSession('immersive-ar', ...)`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionFeatures {
    pub required_features: Vec<&'static str>,
    pub optional_features: Vec<&'static str>,
    /// Ask for the DOM overlay on this root
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dom_overlay: Option<OverlayRoot>,
}

impl SessionFeatures {
    /// Descriptor for `tier`. Hit-test is left out entirely when disabled.
    pub fn for_tier(
        tier: FeatureTier,
        hit_test: bool,
        dom_overlay: Option<OverlayRoot>,
    ) -> Self {
        let mut required = Vec::new();
        let mut optional = Vec::new();

        match tier {
            FeatureTier::Full => {
                if hit_test {
                    required.push(FEATURE_HIT_TEST);
                }
                required.push(FEATURE_LOCAL_FLOOR);
            }
            FeatureTier::Relaxed => {
                if hit_test {
                    optional.push(FEATURE_HIT_TEST);
                }
                optional.push(FEATURE_LOCAL_FLOOR);
            }
            FeatureTier::Minimal => {}
        }

        if dom_overlay.is_some() {
            optional.push(FEATURE_DOM_OVERLAY);
        }

        Self {
            required_features: required,
            optional_features: optional,
            dom_overlay,
        }
    }

    pub fn requires(&self, feature: &str) -> bool {
        self.required_features.iter().any(|f| *f == feature)
    }

    pub fn mentions(&self, feature: &str) -> bool {
        self.requires(feature) || self.optional_features.iter().any(|f| *f == feature)
    }
}

/// Resources owned by a running WebXR session
pub struct XrActive<H: XrRuntime> {
    pub session: H::Session,
    pub reference_space: ReferenceSpaceKind,
    pub hit_test: Option<HostHitTestSource<H>>,
    pub tier: FeatureTier,
}

/// Resources owned by a running passthrough session
pub struct PseudoArActive<H: CameraSource> {
    pub stream: H::Stream,
}

/// What a successful strategy hands to the controller
pub enum ActiveSession<H: XrRuntime + CameraSource> {
    WebXr(XrActive<H>),
    PseudoAr(PseudoArActive<H>),
}

impl<H: XrRuntime + CameraSource> ActiveSession<H> {
    pub fn state(&self) -> SessionState {
        match self {
            ActiveSession::WebXr(_) => SessionState::WebXrActive,
            ActiveSession::PseudoAr(_) => SessionState::PseudoArActive,
        }
    }
}

impl<H: XrRuntime + CameraSource> fmt::Debug for ActiveSession<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveSession::WebXr(xr) => f
                .debug_struct("WebXr")
                .field("reference_space", &xr.reference_space)
                .field("hit_test", &xr.hit_test.is_some())
                .field("tier", &xr.tier)
                .finish(),
            ActiveSession::PseudoAr(_) => f.write_str("PseudoAr"),
        }
    }
}
