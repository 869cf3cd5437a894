// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Taps and gestures

use rustc_hash::FxHashSet;

use crate::placement::PlacementKind;

/// A tap or XR `select`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TapEvent {
    /// Target element id followed by ancestor ids, innermost first.
    /// Empty for an XR select with no DOM target.
    pub target_path: Vec<String>,
}

impl TapEvent {
    pub fn xr_select() -> Self {
        Self::default()
    }

    pub fn on_path<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            target_path: ids.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// No session running
    Inactive,
    /// Landed on UI chrome
    Ignored,
    /// Nothing loaded to place
    NoModel,
    Placed(PlacementKind),
}

impl TapOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TapOutcome::Inactive => "inactive",
            TapOutcome::Ignored => "ignored",
            TapOutcome::NoModel => "no-model",
            TapOutcome::Placed(PlacementKind::Reticle) => "placed-reticle",
            TapOutcome::Placed(PlacementKind::CameraRelative) => "placed-camera",
        }
    }
}

/// Recognized UI element ids. Matching is exact.
#[derive(Debug, Clone, Default)]
pub struct UiChrome {
    ids: FxHashSet<String>,
}

impl UiChrome {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids
                .into_iter()
                .map(Into::into)
                .filter(|id: &String| !id.is_empty())
                .collect(),
        }
    }

    pub fn contains(&self, tap: &TapEvent) -> bool {
        tap.target_path.iter().any(|id| self.ids.contains(id.as_str()))
    }
}

/// Pseudo-AR manipulation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Horizontal drag in CSS pixels
    Drag { dx: f64 },
    /// Pinch scale factor relative to the previous event
    Pinch { factor: f64 },
    /// Wheel delta, positive scrolls down (zooms out)
    Wheel { dy: f64 },
}
