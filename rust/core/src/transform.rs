// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Anchor transforms and camera poses
//!
//! Conventions follow three.js and WebXR: matrices are column-major,
//! +Y is up and a camera looks down its local -Z axis.

use nalgebra::{Matrix3, Matrix4, Rotation3, UnitQuaternion, Vector3};

/// Position, rotation and scale of the anchor node
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub position: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
    pub scale: Vector3<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::repeat(1.0),
        }
    }
}

impl Transform {
    /// Decompose an affine matrix into translation, rotation and scale
    pub fn from_matrix(m: &Matrix4<f64>) -> Self {
        let position = Vector3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]);

        let basis: Matrix3<f64> = m.fixed_view::<3, 3>(0, 0).into_owned();
        let mut scale = Vector3::new(
            basis.column(0).norm(),
            basis.column(1).norm(),
            basis.column(2).norm(),
        );
        // A mirrored basis carries its sign on x
        if basis.determinant() < 0.0 {
            scale.x = -scale.x;
        }

        let rotation = if scale.iter().all(|s| s.abs() > f64::EPSILON) {
            let mut r = basis;
            for i in 0..3 {
                let s = scale[i];
                r.column_mut(i).scale_mut(1.0 / s);
            }
            UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(r))
        } else {
            UnitQuaternion::identity()
        };

        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Decompose a column-major `[f64; 16]` (the WebXR `transform.matrix` layout)
    pub fn from_column_major(values: &[f64; 16]) -> Self {
        Self::from_matrix(&Matrix4::from_column_slice(values))
    }

    pub fn to_matrix(&self) -> Matrix4<f64> {
        let scale = Matrix4::new_nonuniform_scaling(&self.scale);
        let rotation = self.rotation.to_homogeneous();
        let translation = Matrix4::new_translation(&self.position);
        translation * rotation * scale
    }

    pub fn set_uniform_scale(&mut self, s: f64) {
        self.scale = Vector3::repeat(s);
    }

    /// Rotation about the world up axis
    pub fn yaw(&self) -> f64 {
        yaw_of(&self.rotation)
    }

    /// Rotate about world +Y, keeping position
    pub fn rotate_yaw(&mut self, radians: f64) {
        let delta = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), radians);
        self.rotation = delta * self.rotation;
    }

    /// `[px, py, pz, qx, qy, qz, qw, sx, sy, sz]`
    pub fn to_array(&self) -> [f64; 10] {
        let q = self.rotation.quaternion();
        [
            self.position.x,
            self.position.y,
            self.position.z,
            q.i,
            q.j,
            q.k,
            q.w,
            self.scale.x,
            self.scale.y,
            self.scale.z,
        ]
    }
}

/// Rendering camera position and orientation
#[derive(Debug, Clone, PartialEq)]
pub struct CameraPose {
    pub position: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
        }
    }
}

impl CameraPose {
    /// From `[px, py, pz, qx, qy, qz, qw]`. Missing or short input yields the identity pose.
    pub fn from_slice(values: &[f64]) -> Self {
        if values.len() < 7 {
            return Self::default();
        }
        Self {
            position: Vector3::new(values[0], values[1], values[2]),
            rotation: UnitQuaternion::from_quaternion(nalgebra::Quaternion::new(
                values[6], values[3], values[4], values[5],
            )),
        }
    }

    /// Camera looking along `yaw` on the horizon
    pub fn with_yaw(position: Vector3<f64>, yaw: f64) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::from_axis_angle(&Vector3::y_axis(), yaw),
        }
    }

    pub fn yaw(&self) -> f64 {
        yaw_of(&self.rotation)
    }
}

/// Horizontal forward direction for `yaw`
pub fn forward(yaw: f64) -> Vector3<f64> {
    Vector3::new(-yaw.sin(), 0.0, -yaw.cos())
}

/// Yaw of an orientation, ignoring pitch and roll.
///
/// Uses the forward vector projected on the ground plane, or the up vector
/// when looking straight up or down.
pub fn yaw_of(rotation: &UnitQuaternion<f64>) -> f64 {
    let f = rotation * Vector3::new(0.0, 0.0, -1.0);
    if f.x.hypot(f.z) > 1e-6 {
        return (-f.x).atan2(-f.z);
    }
    let up = rotation * Vector3::new(0.0, 1.0, 0.0);
    // Pitched down: up leans forward. Pitched up: up leans back.
    if f.y < 0.0 {
        (-up.x).atan2(-up.z)
    } else {
        up.x.atan2(up.z)
    }
}
