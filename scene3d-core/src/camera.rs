/// First-person camera kept as a matrix and its running inverse
use crate::transform::Transform;
use nalgebra::{Matrix4, Point3};

/// A discrete camera control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Forward,
    Backward,
    TurnLeft,
    TurnRight,
}

/// World-to-camera transform plus its inverse.
///
/// Each control premultiplies `camera` by a delta and postmultiplies
/// `inverse_camera` by the opposite delta, so `camera * inverse_camera`
/// stays the identity without ever inverting a matrix.
#[derive(Debug, Clone)]
pub struct CameraRig {
    camera: Matrix4<f32>,
    inverse_camera: Matrix4<f32>,
    move_step: f32,
    turn_step: f32,
}

impl CameraRig {
    pub fn new(move_step: f32, turn_step: f32) -> Self {
        Self {
            camera: Matrix4::identity(),
            inverse_camera: Matrix4::identity(),
            move_step,
            turn_step,
        }
    }

    pub fn camera(&self) -> &Matrix4<f32> {
        &self.camera
    }

    pub fn inverse_camera(&self) -> &Matrix4<f32> {
        &self.inverse_camera
    }

    /// Camera origin in world coordinates
    pub fn position(&self) -> Point3<f32> {
        self.inverse_camera.transform_point(&Point3::origin())
    }

    pub fn move_forward(&mut self, distance: f32) {
        self.premultiply(
            Transform::translation(0.0, 0.0, distance),
            Transform::translation(0.0, 0.0, -distance),
        );
    }

    pub fn move_backward(&mut self, distance: f32) {
        self.move_forward(-distance);
    }

    pub fn turn_left(&mut self, degrees: f32) {
        self.premultiply(Transform::rotation_y(-degrees), Transform::rotation_y(degrees));
    }

    pub fn turn_right(&mut self, degrees: f32) {
        self.turn_left(-degrees);
    }

    /// Apply one control using the configured step, scaled by `scale`
    pub fn apply(&mut self, control: Control, scale: f32) {
        tracing::trace!(?control, scale, "camera control");
        let distance = self.move_step * scale;
        let degrees = self.turn_step * scale;
        match control {
            Control::Forward => self.move_forward(distance),
            Control::Backward => self.move_backward(distance),
            Control::TurnLeft => self.turn_left(degrees),
            Control::TurnRight => self.turn_right(degrees),
        }
    }

    fn premultiply(&mut self, delta: Matrix4<f32>, inverse_delta: Matrix4<f32>) {
        self.camera = delta * self.camera;
        self.inverse_camera *= inverse_delta;
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new(0.1, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_inverse(rig: &CameraRig) {
        let product = rig.camera() * rig.inverse_camera();
        assert!((product - Matrix4::identity()).norm() < 1e-4);
    }

    #[test]
    fn test_starts_at_identity() {
        let rig = CameraRig::default();
        assert_eq!(*rig.camera(), Matrix4::identity());
        assert_eq!(*rig.inverse_camera(), Matrix4::identity());
    }

    #[test]
    fn test_inverse_invariant_over_control_sequence() {
        let mut rig = CameraRig::default();
        let sequence = [
            Control::Forward,
            Control::TurnLeft,
            Control::Forward,
            Control::Forward,
            Control::TurnRight,
            Control::Backward,
            Control::TurnLeft,
            Control::TurnLeft,
        ];
        for _ in 0..50 {
            for control in sequence {
                rig.apply(control, 1.0);
                assert_inverse(&rig);
            }
        }
    }

    #[test]
    fn test_forward_moves_toward_negative_z() {
        let mut rig = CameraRig::default();
        rig.move_forward(1.0);
        let p = rig.position();
        assert!((p - Point3::new(0.0, 0.0, -1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_turn_then_forward() {
        let mut rig = CameraRig::default();
        rig.turn_left(90.0);
        rig.move_forward(1.0);
        // Facing -x after a left quarter turn
        assert!((rig.position() - Point3::new(-1.0, 0.0, 0.0)).norm() < 1e-5);
        assert_inverse(&rig);
    }

    #[test]
    fn test_opposite_controls_cancel() {
        let mut rig = CameraRig::default();
        rig.apply(Control::Forward, 1.0);
        rig.apply(Control::Backward, 1.0);
        rig.apply(Control::TurnLeft, 1.0);
        rig.apply(Control::TurnRight, 1.0);
        assert!((rig.camera() - Matrix4::identity()).norm() < 1e-6);
    }
}
