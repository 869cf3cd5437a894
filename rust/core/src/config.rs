// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller configuration
//!
//! Every field has a default, so an empty JSON object is a valid config.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::session::ReferenceSpaceKind;

/// Element ids whose taps never place the model
pub const DEFAULT_UI_CHROME: &[&str] = &[
    "ar-exit",
    "ar-scale",
    "ar-button",
    "ar-exit-button",
    "ar-toolbar",
    "controls",
    "toggle-controls",
    "props-panel",
    "info",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArConfig {
    /// Request hit-testing from WebXR. When off, placement is camera-relative only.
    pub hit_test: bool,
    /// Request the DOM overlay feature
    pub dom_overlay: bool,
    /// Real-world size of the model diagonal after auto-scaling, in metres
    pub target_diagonal: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Lift above a detected surface, in metres
    pub surface_offset: f64,
    /// Distance in front of the camera for camera-relative placement, in metres
    pub fallback_distance: f64,
    pub drag_radians_per_pixel: f64,
    pub wheel_sensitivity: f64,
    /// Place the model in front of the camera as soon as passthrough starts
    pub place_on_passthrough_start: bool,
    /// Reference spaces to try, in order
    pub reference_spaces: Vec<ReferenceSpaceKind>,
    pub ui_chrome: Vec<String>,
}

impl Default for ArConfig {
    fn default() -> Self {
        Self {
            hit_test: true,
            dom_overlay: true,
            target_diagonal: 1.0,
            min_scale: 0.005,
            max_scale: 10.0,
            surface_offset: 0.01,
            fallback_distance: 1.5,
            drag_radians_per_pixel: 0.01,
            wheel_sensitivity: 0.001,
            place_on_passthrough_start: true,
            reference_spaces: vec![ReferenceSpaceKind::LocalFloor, ReferenceSpaceKind::Local],
            ui_chrome: DEFAULT_UI_CHROME.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ArConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        let config: ArConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        fn positive(name: &str, v: f64) -> Result<()> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(Error::Config(format!("{name} must be a positive number, got {v}")))
            }
        }

        positive("targetDiagonal", self.target_diagonal)?;
        positive("minScale", self.min_scale)?;
        positive("maxScale", self.max_scale)?;
        positive("fallbackDistance", self.fallback_distance)?;

        if self.min_scale > self.max_scale {
            return Err(Error::Config(format!(
                "minScale ({}) exceeds maxScale ({})",
                self.min_scale, self.max_scale
            )));
        }
        if !self.surface_offset.is_finite()
            || !self.drag_radians_per_pixel.is_finite()
            || !self.wheel_sensitivity.is_finite()
        {
            return Err(Error::Config("offsets and sensitivities must be finite".to_string()));
        }
        if self.reference_spaces.is_empty() {
            return Err(Error::Config("referenceSpaces must not be empty".to_string()));
        }
        Ok(())
    }
}
