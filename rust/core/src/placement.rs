// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placement engine
//!
//! An ordered list of strategies; the first one that can produce a transform
//! from the current frame data wins. Scale is applied by the controller
//! afterwards, so strategies only decide where and which way the anchor faces.

use nalgebra::{Matrix4, UnitQuaternion, Vector3};

use crate::config::ArConfig;
use crate::transform::{forward, CameraPose, Transform};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementKind {
    Reticle,
    CameraRelative,
}

/// What a strategy may look at
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacementInput<'a> {
    /// Pose of the visible reticle, if any
    pub reticle: Option<&'a Matrix4<f64>>,
    pub camera: Option<&'a CameraPose>,
}

pub trait PlacementStrategy {
    fn kind(&self) -> PlacementKind;

    fn attempt(&self, input: &PlacementInput<'_>) -> Option<Transform>;
}

/// Snap to the hit-test surface
#[derive(Debug, Clone)]
pub struct ReticleAnchored {
    pub surface_offset: f64,
}

impl PlacementStrategy for ReticleAnchored {
    fn kind(&self) -> PlacementKind {
        PlacementKind::Reticle
    }

    fn attempt(&self, input: &PlacementInput<'_>) -> Option<Transform> {
        let pose = input.reticle?;
        let mut transform = Transform::from_matrix(pose);
        transform.position.y += self.surface_offset;
        Some(transform)
    }
}

/// Fixed distance ahead of the camera, facing the camera's yaw
#[derive(Debug, Clone)]
pub struct CameraRelative {
    pub distance: f64,
}

impl CameraRelative {
    pub fn transform_for(&self, camera: &CameraPose) -> Transform {
        let yaw = camera.yaw();
        Transform {
            position: camera.position + forward(yaw) * self.distance,
            rotation: UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw),
            scale: Vector3::repeat(1.0),
        }
    }
}

impl PlacementStrategy for CameraRelative {
    fn kind(&self) -> PlacementKind {
        PlacementKind::CameraRelative
    }

    fn attempt(&self, input: &PlacementInput<'_>) -> Option<Transform> {
        input.camera.map(|camera| self.transform_for(camera))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub kind: PlacementKind,
    pub transform: Transform,
}

pub struct PlacementEngine {
    strategies: Vec<Box<dyn PlacementStrategy>>,
}

impl PlacementEngine {
    pub fn new(strategies: Vec<Box<dyn PlacementStrategy>>) -> Self {
        Self { strategies }
    }

    /// Reticle first, then camera-relative
    pub fn from_config(config: &ArConfig) -> Self {
        Self::new(vec![
            Box::new(ReticleAnchored {
                surface_offset: config.surface_offset,
            }),
            Box::new(CameraRelative {
                distance: config.fallback_distance,
            }),
        ])
    }

    pub fn kinds(&self) -> Vec<PlacementKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    pub fn place(&self, input: &PlacementInput<'_>) -> Option<Placement> {
        self.strategies.iter().find_map(|strategy| {
            strategy.attempt(input).map(|transform| Placement {
                kind: strategy.kind(),
                transform,
            })
        })
    }
}

/// The scene-graph node the model clone hangs under
#[derive(Debug, Clone, Default)]
pub struct Anchor {
    pub transform: Transform,
    pub has_clone: bool,
    pub placed: bool,
}

impl Anchor {
    pub fn clear(&mut self) {
        *self = Anchor::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_order() {
        let engine = PlacementEngine::from_config(&ArConfig::default());
        assert_eq!(engine.kinds(), vec![PlacementKind::Reticle, PlacementKind::CameraRelative]);
    }

    #[test]
    fn test_reticle_offset() {
        let engine = PlacementEngine::from_config(&ArConfig::default());
        let pose = Matrix4::new_translation(&Vector3::new(0.2, -1.4, -0.9));
        let camera = CameraPose::default();

        let placement = engine
            .place(&PlacementInput {
                reticle: Some(&pose),
                camera: Some(&camera),
            })
            .unwrap();

        assert_eq!(placement.kind, PlacementKind::Reticle);
        assert_relative_eq!(
            placement.transform.position,
            Vector3::new(0.2, -1.39, -0.9),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_falls_back_to_camera() {
        let engine = PlacementEngine::from_config(&ArConfig::default());
        let camera = CameraPose::with_yaw(Vector3::new(0.0, 1.6, 0.0), 0.0);

        let placement = engine
            .place(&PlacementInput {
                reticle: None,
                camera: Some(&camera),
            })
            .unwrap();

        assert_eq!(placement.kind, PlacementKind::CameraRelative);
        assert_relative_eq!(
            placement.transform.position,
            Vector3::new(0.0, 1.6, -1.5),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_nothing_to_place_on() {
        let engine = PlacementEngine::from_config(&ArConfig::default());
        assert!(engine.place(&PlacementInput::default()).is_none());
    }

    #[test]
    fn test_camera_relative_drops_pitch() {
        let strategy = CameraRelative { distance: 2.0 };
        let yaw = 0.5;
        let camera = CameraPose {
            position: Vector3::new(1.0, 1.5, -2.0),
            rotation: UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw)
                * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), -0.4)
                * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.2),
        };

        let t = strategy.transform_for(&camera);
        assert_relative_eq!(t.position, camera.position + forward(yaw) * 2.0, epsilon = 1e-9);
        assert_relative_eq!(t.position.y, 1.5, epsilon = 1e-9);
        assert_relative_eq!(t.yaw(), yaw, epsilon = 1e-9);
        assert_relative_eq!(
            t.rotation.angle_to(&UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw)),
            0.0,
            epsilon = 1e-9
        );
    }
}
