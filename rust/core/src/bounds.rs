// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model bounds for auto-scaling
//!
//! The scene host reports the bounding box of the loaded model in f64. Its
//! diagonal drives the automatic AR scale: millimetre-authored IFC files have
//! diagonals in the tens of thousands, metre-authored ones in the tens.

use nalgebra::Vector3;

/// Axis-aligned model bounds in f64 precision
#[derive(Debug, Clone, PartialEq)]
pub struct ModelBounds {
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
    /// Number of points added
    pub sample_count: usize,
}

impl ModelBounds {
    /// Create new bounds initialized to invalid state
    pub fn new() -> Self {
        Self {
            min: Vector3::repeat(f64::MAX),
            max: Vector3::repeat(f64::MIN),
            sample_count: 0,
        }
    }

    /// Bounds spanning two corners
    pub fn from_corners(min: [f64; 3], max: [f64; 3]) -> Self {
        let mut bounds = Self::new();
        bounds.expand(min[0], min[1], min[2]);
        bounds.expand(max[0], max[1], max[2]);
        bounds
    }

    /// Bounds of an interleaved `[x, y, z, x, y, z, ...]` position buffer
    pub fn from_positions(positions: &[f32]) -> Self {
        let mut bounds = Self::new();
        for chunk in positions.chunks_exact(3) {
            bounds.expand(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
        }
        bounds
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.sample_count > 0
    }

    /// Expand bounds to include a point. Non-finite points are skipped.
    #[inline]
    pub fn expand(&mut self, x: f64, y: f64, z: f64) {
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return;
        }
        let p = Vector3::new(x, y, z);
        self.min = self.min.inf(&p);
        self.max = self.max.sup(&p);
        self.sample_count += 1;
    }

    #[inline]
    pub fn size(&self) -> Vector3<f64> {
        if !self.is_valid() {
            return Vector3::zeros();
        }
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vector3<f64> {
        if !self.is_valid() {
            return Vector3::zeros();
        }
        (self.min + self.max) * 0.5
    }

    /// Length of the bounding diagonal, `None` when empty or degenerate
    pub fn diagonal(&self) -> Option<f64> {
        let d = self.size().norm();
        if d.is_finite() && d > 0.0 {
            Some(d)
        } else {
            None
        }
    }
}

impl Default for ModelBounds {
    fn default() -> Self {
        Self::new()
    }
}
