/// Matrix helpers and the modelview matrix stack
use crate::error::{Result, SceneError};
use nalgebra::{Matrix4, Vector3};

/// Transform builder for 3D transformations. Angles are in degrees.
pub struct Transform;

impl Transform {
    /// Create a translation matrix
    pub fn translation(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// Rotation about the x axis
    pub fn rotation_x(degrees: f32) -> Matrix4<f32> {
        Matrix4::from_axis_angle(&Vector3::x_axis(), degrees.to_radians())
    }

    /// Rotation about the y axis
    pub fn rotation_y(degrees: f32) -> Matrix4<f32> {
        Matrix4::from_axis_angle(&Vector3::y_axis(), degrees.to_radians())
    }

    /// Right-handed perspective projection with a vertical field of view
    pub fn perspective(fovy_degrees: f32, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
        Matrix4::new_perspective(aspect, fovy_degrees.to_radians(), near, far)
    }
}

/// A push/pop stack of modelview matrices.
///
/// Snapshot the working matrix before a branch of the scene and restore it
/// afterwards. A balanced frame leaves the stack empty.
#[derive(Debug, Default)]
pub struct MatrixStack {
    stack: Vec<Matrix4<f32>>,
}

impl MatrixStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, matrix: Matrix4<f32>) {
        self.stack.push(matrix);
    }

    pub fn pop(&mut self) -> Result<Matrix4<f32>> {
        self.stack.pop().ok_or(SceneError::StackUnderflow)
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}
