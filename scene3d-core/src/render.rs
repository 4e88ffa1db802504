/// Renderable meshes and the contract a rasterizer implements to draw them
use crate::error::{Result, SceneError};
use crate::geometry::Mesh;
use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

/// Opaque handle to vertex data owned by a [`RenderBackend`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(pub usize);

/// Everything a backend needs to issue one triangle-list draw
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub buffer: BufferId,
    pub vertex_count: usize,
    pub color: Vector3<f32>,
    pub modelview: Matrix4<f32>,
    pub normal_matrix: Matrix3<f32>,
}

/// A rasterizer that accepts one-time uploads and per-frame draws
pub trait RenderBackend {
    /// Take a copy of tightly packed positions, returning a handle for drawing
    fn upload(&mut self, vertices: &[Point3<f32>]) -> BufferId;

    fn draw(&mut self, call: &DrawCall);
}

/// Normal transform for a modelview: inverse-transpose of the upper 3×3.
///
/// Falls back to the upper 3×3 itself when it is singular; for rigid
/// transforms the two are identical.
pub fn normal_matrix(modelview: &Matrix4<f32>) -> Matrix3<f32> {
    let upper: Matrix3<f32> = modelview.fixed_view::<3, 3>(0, 0).into_owned();
    upper
        .try_inverse()
        .map(|inverse| inverse.transpose())
        .unwrap_or(upper)
}

/// A mesh paired with its backend buffer and flat color.
///
/// Vertices live on the CPU until [`MeshObject::initialize_buffers`] hands
/// them to the backend, after which only the vertex count is kept.
#[derive(Debug, Clone)]
pub struct MeshObject {
    vertices: Vec<Point3<f32>>,
    vertex_count: usize,
    buffer: Option<BufferId>,
    color: Vector3<f32>,
}

impl MeshObject {
    pub fn new(mesh: Mesh) -> Self {
        Self {
            vertex_count: mesh.len(),
            vertices: mesh.vertices,
            buffer: None,
            color: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn with_color(mut self, color: Vector3<f32>) -> Self {
        self.color = color;
        self
    }

    pub fn color(&self) -> Vector3<f32> {
        self.color
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// CPU-side vertices; empty once uploaded
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    pub fn is_uploaded(&self) -> bool {
        self.buffer.is_some()
    }

    /// Upload the vertices once and release the CPU copy
    pub fn initialize_buffers(&mut self, backend: &mut dyn RenderBackend) -> Result<()> {
        if self.buffer.is_some() {
            return Err(SceneError::AlreadyUploaded);
        }
        if self.vertices.is_empty() {
            tracing::warn!("skipping buffer upload for empty mesh");
            return Ok(());
        }

        let buffer = backend.upload(&self.vertices);
        tracing::debug!(?buffer, vertices = self.vertex_count, "uploaded mesh buffer");
        self.buffer = Some(buffer);
        self.vertices = Vec::new();
        Ok(())
    }

    pub fn draw(&self, backend: &mut dyn RenderBackend, modelview: &Matrix4<f32>) -> Result<()> {
        let buffer = match self.buffer {
            Some(buffer) => buffer,
            // Nothing was ever uploaded for an empty mesh, so there is nothing to draw
            None if self.vertex_count == 0 => return Ok(()),
            None => return Err(SceneError::NotUploaded),
        };

        backend.draw(&DrawCall {
            buffer,
            vertex_count: self.vertex_count,
            color: self.color,
            modelview: *modelview,
            normal_matrix: normal_matrix(modelview),
        });
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geometry::build_torus;
    use crate::transform::Transform;

    /// Backend that keeps uploads and records every draw
    #[derive(Default)]
    pub(crate) struct RecordingBackend {
        pub buffers: Vec<Vec<Point3<f32>>>,
        pub draws: Vec<DrawCall>,
    }

    impl RenderBackend for RecordingBackend {
        fn upload(&mut self, vertices: &[Point3<f32>]) -> BufferId {
            self.buffers.push(vertices.to_vec());
            BufferId(self.buffers.len() - 1)
        }

        fn draw(&mut self, call: &DrawCall) {
            self.draws.push(call.clone());
        }
    }

    #[test]
    fn test_upload_releases_cpu_copy() {
        let mut backend = RecordingBackend::default();
        let mut torus = MeshObject::new(build_torus(0.35, 0.15, 8, 4));
        assert_eq!(torus.vertex_count(), 192);

        torus.initialize_buffers(&mut backend).unwrap();
        assert!(torus.is_uploaded());
        assert!(torus.vertices().is_empty());
        assert_eq!(torus.vertex_count(), 192);
        assert_eq!(backend.buffers[0].len(), 192);
    }

    #[test]
    fn test_double_upload_rejected() {
        let mut backend = RecordingBackend::default();
        let mut torus = MeshObject::new(build_torus(0.35, 0.15, 8, 4));
        torus.initialize_buffers(&mut backend).unwrap();
        assert_eq!(
            torus.initialize_buffers(&mut backend),
            Err(SceneError::AlreadyUploaded)
        );
        assert_eq!(backend.buffers.len(), 1);
    }

    #[test]
    fn test_draw_before_upload_rejected() {
        let mut backend = RecordingBackend::default();
        let torus = MeshObject::new(build_torus(0.35, 0.15, 8, 4));
        assert_eq!(
            torus.draw(&mut backend, &Matrix4::identity()),
            Err(SceneError::NotUploaded)
        );
        assert!(backend.draws.is_empty());
    }

    #[test]
    fn test_empty_mesh_is_noop() {
        let mut backend = RecordingBackend::default();
        let mut empty = MeshObject::new(Mesh::new());
        assert!(empty.initialize_buffers(&mut backend).is_ok());
        assert!(!empty.is_uploaded());
        assert!(empty.draw(&mut backend, &Matrix4::identity()).is_ok());
        assert!(backend.buffers.is_empty());
        assert!(backend.draws.is_empty());
    }

    #[test]
    fn test_draw_call_contents() {
        let mut backend = RecordingBackend::default();
        let color = Vector3::new(1.0, 0.5, 0.0);
        let mut torus = MeshObject::new(build_torus(0.35, 0.15, 8, 4)).with_color(color);
        torus.initialize_buffers(&mut backend).unwrap();

        let mv = Transform::translation(0.0, 0.1, -2.5) * Transform::rotation_y(40.0);
        torus.draw(&mut backend, &mv).unwrap();

        let call = &backend.draws[0];
        assert_eq!(call.buffer, BufferId(0));
        assert_eq!(call.vertex_count, 192);
        assert_eq!(call.color, color);
        assert_eq!(call.modelview, mv);
    }

    #[test]
    fn test_normal_matrix_of_rigid_transform_is_rotation() {
        let mv = Transform::translation(3.0, -1.0, 2.0)
            * Transform::rotation_y(33.0)
            * Transform::rotation_x(90.0);
        let upper: Matrix3<f32> = mv.fixed_view::<3, 3>(0, 0).into_owned();
        assert!((normal_matrix(&mv) - upper).norm() < 1e-5);
    }

    #[test]
    fn test_normal_matrix_singular_fallback() {
        let flat = Matrix4::new_nonuniform_scaling(&Vector3::new(1.0, 0.0, 1.0));
        let upper: Matrix3<f32> = flat.fixed_view::<3, 3>(0, 0).into_owned();
        assert_eq!(normal_matrix(&flat), upper);
    }
}
