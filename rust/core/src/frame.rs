// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-frame state machine
//!
//! The host's scheduler calls in once per frame with the minimum it knows:
//! whether an XR frame exists and, if so, the first hit-test pose. The loop
//! returns what to do with the reticle and whether to draw.

use nalgebra::Matrix4;

use crate::platform::LoopKind;

/// What arrived this tick
#[derive(Debug, Clone, PartialEq)]
pub enum FrameInput {
    /// An XR frame, with the first hit-test pose if any
    Xr { hit_pose: Option<Matrix4<f64>> },
    /// A plain animation callback, no XR frame
    Animation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReticleChange {
    Unchanged,
    Show(Matrix4<f64>),
    Hide,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FrameOutcome {
    pub render: bool,
    pub reticle: ReticleChange,
}

impl FrameOutcome {
    const SKIP: FrameOutcome = FrameOutcome {
        render: false,
        reticle: ReticleChange::Unchanged,
    };
}

/// Latest hit-test pose. Visible only while the current frame has a hit.
#[derive(Debug, Clone, Default)]
pub struct Reticle {
    pose: Option<Matrix4<f64>>,
    visible: bool,
}

impl Reticle {
    pub fn visible_pose(&self) -> Option<&Matrix4<f64>> {
        if self.visible {
            self.pose.as_ref()
        } else {
            None
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    fn show(&mut self, pose: Matrix4<f64>) {
        self.pose = Some(pose);
        self.visible = true;
    }

    /// Returns whether it was visible
    fn hide(&mut self) -> bool {
        std::mem::replace(&mut self.visible, false)
    }

    pub fn clear(&mut self) {
        self.pose = None;
        self.visible = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Idle,
    Running(LoopKind),
}

#[derive(Debug, Default)]
pub struct FrameLoop {
    state: LoopState,
    reticle: Reticle,
    frames: u64,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, kind: LoopKind) {
        self.state = LoopState::Running(kind);
        self.reticle.clear();
        self.frames = 0;
    }

    pub fn stop(&mut self) {
        self.state = LoopState::Idle;
        self.reticle.clear();
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn reticle(&self) -> &Reticle {
        &self.reticle
    }

    /// Frames rendered since `start`
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn on_frame(&mut self, input: FrameInput) -> FrameOutcome {
        let outcome = match (self.state, input) {
            (LoopState::Idle, _) => return FrameOutcome::SKIP,
            (LoopState::Running(LoopKind::Xr), FrameInput::Xr { hit_pose }) => {
                let reticle = match hit_pose {
                    Some(pose) => {
                        self.reticle.show(pose);
                        ReticleChange::Show(pose)
                    }
                    None if self.reticle.hide() => ReticleChange::Hide,
                    None => ReticleChange::Unchanged,
                };
                FrameOutcome {
                    render: true,
                    reticle,
                }
            }
            // The XR loop only draws through the XR frame
            (LoopState::Running(LoopKind::Xr), FrameInput::Animation) => return FrameOutcome::SKIP,
            (LoopState::Running(LoopKind::Animation), _) => FrameOutcome {
                render: true,
                reticle: ReticleChange::Unchanged,
            },
        };
        self.frames += 1;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn pose(x: f64) -> Matrix4<f64> {
        Matrix4::new_translation(&Vector3::new(x, 0.0, -1.0))
    }

    #[test]
    fn test_idle_never_renders() {
        let mut frames = FrameLoop::new();
        assert_eq!(frames.on_frame(FrameInput::Animation), FrameOutcome::SKIP);
        assert_eq!(
            frames.on_frame(FrameInput::Xr {
                hit_pose: Some(pose(0.0))
            }),
            FrameOutcome::SKIP
        );
        assert!(!frames.reticle().is_visible());
    }

    #[test]
    fn test_reticle_follows_hits() {
        let mut frames = FrameLoop::new();
        frames.start(LoopKind::Xr);

        let out = frames.on_frame(FrameInput::Xr {
            hit_pose: Some(pose(1.0)),
        });
        assert!(out.render);
        assert_eq!(out.reticle, ReticleChange::Show(pose(1.0)));
        assert_eq!(frames.reticle().visible_pose(), Some(&pose(1.0)));

        let out = frames.on_frame(FrameInput::Xr { hit_pose: None });
        assert!(out.render);
        assert_eq!(out.reticle, ReticleChange::Hide);
        assert_eq!(frames.reticle().visible_pose(), None);

        let out = frames.on_frame(FrameInput::Xr { hit_pose: None });
        assert_eq!(out.reticle, ReticleChange::Unchanged);
        assert_eq!(frames.frames(), 3);
    }

    #[test]
    fn test_xr_loop_ignores_animation_ticks() {
        let mut frames = FrameLoop::new();
        frames.start(LoopKind::Xr);
        assert!(!frames.on_frame(FrameInput::Animation).render);
        assert_eq!(frames.frames(), 0);
    }

    #[test]
    fn test_animation_loop_ignores_hits() {
        let mut frames = FrameLoop::new();
        frames.start(LoopKind::Animation);
        let out = frames.on_frame(FrameInput::Xr {
            hit_pose: Some(pose(2.0)),
        });
        assert!(out.render);
        assert_eq!(out.reticle, ReticleChange::Unchanged);
        assert!(!frames.reticle().is_visible());
    }

    #[test]
    fn test_stop_drops_late_frames() {
        let mut frames = FrameLoop::new();
        frames.start(LoopKind::Xr);
        frames.on_frame(FrameInput::Xr {
            hit_pose: Some(pose(0.0)),
        });
        frames.stop();

        assert_eq!(frames.state(), LoopState::Idle);
        assert!(!frames.reticle().is_visible());
        assert!(!frames.on_frame(FrameInput::Xr { hit_pose: None }).render);
    }
}
