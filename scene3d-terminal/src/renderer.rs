/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix4, Point3, Vector3};
use scene3d_core::config::ProjectionConfig;
use scene3d_core::{BufferId, DrawCall, RenderBackend, Transform};
use std::io::Write;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f32 = 2.0;

const AMBIENT: f32 = 0.2;

/// Dark blue backdrop
const CLEAR_COLOR: Color = Color::Rgb { r: 0, g: 0, b: 128 };

/// Software rasterizer that draws uploaded meshes into a character grid
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<Color>,
    buffers: Vec<Vec<Point3<f32>>>,
    projection_config: ProjectionConfig,
    projection: Matrix4<f32>,
    light_direction: Vector3<f32>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize, projection: ProjectionConfig, light: [f32; 3]) -> Self {
        let light_direction = Vector3::new(light[0], light[1], light[2])
            .try_normalize(1e-6)
            .unwrap_or_else(Vector3::z);
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            color_buffer: vec![Color::White; size],
            buffers: Vec::new(),
            projection: projection_matrix(&projection, width, height),
            projection_config: projection,
            light_direction,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn projection(&self) -> &Matrix4<f32> {
        &self.projection
    }

    /// Resize the target grid, keeping uploaded buffers
    pub fn resize(&mut self, width: usize, height: usize) {
        let size = width * height;
        self.width = width;
        self.height = height;
        self.depth_buffer = vec![f32::INFINITY; size];
        self.char_buffer = vec![' '; size];
        self.color_buffer = vec![Color::White; size];
        self.projection = projection_matrix(&self.projection_config, width, height);
        tracing::debug!(width, height, "renderer resized");
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.color_buffer.fill(Color::White);
    }

    /// Character in cell `(x, y)`, or None outside the buffer
    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.char_buffer.get(y * self.width + x).copied()
    }

    /// Count of cells covered by geometry this frame
    #[cfg(test)]
    pub(crate) fn covered_cells(&self) -> usize {
        self.depth_buffer.iter().filter(|d| d.is_finite()).count()
    }

    fn render_triangle(&mut self, eye: [Point3<f32>; 3], normal: Vector3<f32>, color: Vector3<f32>) {
        let near = self.projection_config.near;
        if eye.iter().any(|p| p.z > -near) {
            return; // Triangle crosses the near plane
        }

        let Some(normal) = normal.try_normalize(1e-12) else {
            return; // Degenerate triangle, e.g. at a sphere pole
        };
        // Back-face culling: front faces point toward the eye at the origin
        if normal.dot(&eye[0].coords) >= 0.0 {
            return;
        }

        let mut screen = [(0.0, 0.0, 0.0); 3];
        for (slot, point) in screen.iter_mut().zip(eye.iter()) {
            let clip = self.projection * point.to_homogeneous();
            if clip.w.abs() < 1e-6 {
                return;
            }
            let ndc = clip.xyz() / clip.w;
            *slot = (
                (ndc.x + 1.0) * 0.5 * self.width as f32,
                (1.0 - ndc.y) * 0.5 * self.height as f32,
                ndc.z,
            );
        }

        let brightness = AMBIENT + (1.0 - AMBIENT) * normal.dot(&self.light_direction).max(0.0);

        // Map brightness to character
        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let char_index = char_index.min(LUMINOSITY_RAMP.len() - 1);
        let character = LUMINOSITY_RAMP[char_index];
        let shade = |c: f32| (c * brightness * 255.0).clamp(0.0, 255.0) as u8;
        let cell_color = Color::Rgb {
            r: shade(color.x),
            g: shade(color.y),
            b: shade(color.z),
        };

        self.rasterize_triangle(&screen, character, cell_color);
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32); 3], character: char, color: Color) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor();
        let max_x = v0.0.max(v1.0).max(v2.0).ceil();
        let min_y = v0.1.min(v1.1).min(v2.1).floor();
        let max_y = v0.1.max(v1.1).max(v2.1).ceil();

        // Clip to screen bounds
        let min_x = min_x.max(0.0) as i64;
        let max_x = max_x.min(self.width as f32 - 1.0) as i64;
        let min_y = min_y.max(0.0) as i64;
        let max_y = max_y.min(self.height as f32 - 1.0) as i64;

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // Barycentric coordinates
                if let Some((w0, w1, w2)) =
                    barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py))
                {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        // Interpolate depth
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;

                        let idx = y as usize * self.width + x as usize;
                        if depth < self.depth_buffer[idx] {
                            self.depth_buffer[idx] = depth;
                            self.char_buffer[idx] = character;
                            self.color_buffer[idx] = color;
                        }
                    }
                }
            }
        }
    }

    /// Write the grid to the terminal
    pub fn present<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.queue(SetBackgroundColor(CLEAR_COLOR))?;
        let mut current = None;
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let color = self.color_buffer[idx];
                if current != Some(color) {
                    writer.queue(SetForegroundColor(color))?;
                    current = Some(color);
                }
                writer.queue(Print(self.char_buffer[idx]))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl RenderBackend for AsciiRenderer {
    fn upload(&mut self, vertices: &[Point3<f32>]) -> BufferId {
        self.buffers.push(vertices.to_vec());
        BufferId(self.buffers.len() - 1)
    }

    fn draw(&mut self, call: &DrawCall) {
        if call.buffer.0 >= self.buffers.len() {
            tracing::warn!(buffer = ?call.buffer, "draw with unknown buffer");
            return;
        }
        // Buffers are never modified after upload, so take them out for the pass
        let vertices = std::mem::take(&mut self.buffers[call.buffer.0]);
        let count = call.vertex_count.min(vertices.len() / 3 * 3);

        for triangle in vertices[..count].chunks_exact(3) {
            let (a, b, c) = (triangle[0], triangle[1], triangle[2]);
            let normal = call.normal_matrix * (b - a).cross(&(c - a));
            let eye = [
                call.modelview.transform_point(&a),
                call.modelview.transform_point(&b),
                call.modelview.transform_point(&c),
            ];
            self.render_triangle(eye, normal, call.color);
        }

        self.buffers[call.buffer.0] = vertices;
    }
}

/// Perspective projection corrected for the cell aspect ratio of the grid
fn projection_matrix(config: &ProjectionConfig, width: usize, height: usize) -> Matrix4<f32> {
    let aspect = if height == 0 {
        1.0
    } else {
        width as f32 / (height as f32 * CELL_ASPECT)
    };
    Transform::perspective(config.fovy, aspect.max(1e-3), config.near, config.far)
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
