/// Procedural triangle-list meshes for the scene primitives
use nalgebra::{Point3, Vector3};
use std::f32::consts::PI;

/// Tolerance used when counting how many whole cells fit along the ground
const CELL_EPSILON: f32 = 1e-4;

/// Largest mesh any builder will produce, in vertices (about 200 MB of positions)
pub const MAX_MESH_VERTICES: usize = 1 << 24;

/// A flat, non-indexed triangle list.
///
/// Every three consecutive vertices form one triangle, in winding order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point3<f32>>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Iterate over the mesh as triangles
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f32>; 3]> + '_ {
        self.vertices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Push one triangle, keeping the vertex count a multiple of three
    pub fn add_triangle(&mut self, a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) {
        self.vertices.extend_from_slice(&[a, b, c]);
    }

    /// Axis-aligned bounds as (min, max), or None for an empty mesh
    pub fn bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (lo.inf(v), hi.sup(v))
        }))
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

/// `6 * a * b`, or None when it overflows or exceeds [`MAX_MESH_VERTICES`]
fn quad_vertices(a: usize, b: usize) -> Option<usize> {
    a.checked_mul(b)?
        .checked_mul(6)
        .filter(|&count| count <= MAX_MESH_VERTICES)
}

fn ground_cells(extent: f32, step: f32) -> Option<usize> {
    if !positive(extent) || !positive(step) {
        return None;
    }
    let cells = ((2.0 * extent) / step + CELL_EPSILON).floor();
    if !cells.is_finite() || cells > MAX_MESH_VERTICES as f32 {
        return None;
    }
    Some(cells as usize)
}

/// Vertex count `build_ground` would produce, or None if out of range
pub fn ground_vertex_count(extent: f32, step: f32) -> Option<usize> {
    let cells = ground_cells(extent, step)?;
    quad_vertices(cells, cells)
}

pub fn sphere_vertex_count(columns: u32, rows: u32) -> Option<usize> {
    quad_vertices(rows as usize, columns as usize)
}

pub fn torus_vertex_count(num_major: u32, num_minor: u32) -> Option<usize> {
    quad_vertices(num_major as usize, num_minor as usize)
}

/// Tile the y=0 plane over `[-extent, extent]²` with square cells of side `step`.
///
/// Each cell contributes two triangles: (upper-left, lower-left, lower-right)
/// and (upper-left, lower-right, upper-right), where "upper" is toward -z.
pub fn build_ground(extent: f32, step: f32) -> Mesh {
    if !positive(extent) || !positive(step) {
        tracing::warn!(extent, step, "degenerate ground parameters, producing empty mesh");
        return Mesh::new();
    }

    let Some((cells, count)) = ground_cells(extent, step)
        .and_then(|cells| quad_vertices(cells, cells).map(|count| (cells, count)))
    else {
        tracing::warn!(extent, step, "ground exceeds vertex limit, producing empty mesh");
        return Mesh::new();
    };
    let mut mesh = Mesh::with_capacity(count);

    for i in 0..cells {
        let x = -extent + i as f32 * step;
        for j in 0..cells {
            let z = extent - j as f32 * step;

            let lower_left = Point3::new(x, 0.0, z);
            let lower_right = Point3::new(x + step, 0.0, z);
            let upper_left = Point3::new(x, 0.0, z - step);
            let upper_right = Point3::new(x + step, 0.0, z - step);

            mesh.add_triangle(upper_left, lower_left, lower_right);
            mesh.add_triangle(upper_left, lower_right, upper_right);
        }
    }

    mesh
}

/// Build a UV sphere centered at the origin with its poles on the z axis.
///
/// Lattice points are produced by rotating +z about y by the polar angle and
/// then about z by the azimuth. Pole rows are kept as collapsed duplicates so
/// the vertex count is always `6 * rows * columns`.
pub fn build_sphere(radius: f32, columns: u32, rows: u32) -> Mesh {
    if !positive(radius) || columns == 0 || rows == 0 {
        tracing::warn!(radius, columns, rows, "degenerate sphere parameters, producing empty mesh");
        return Mesh::new();
    }

    let Some(count) = sphere_vertex_count(columns, rows) else {
        tracing::warn!(columns, rows, "sphere exceeds vertex limit, producing empty mesh");
        return Mesh::new();
    };

    let (columns, rows) = (columns as usize, rows as usize);
    let mut lattice = Vec::with_capacity((rows + 1) * (columns + 1));

    for r in 0..=rows {
        let polar = r as f32 / rows as f32 * PI;
        // +z rotated about y
        let meridian = Vector3::new(polar.sin(), 0.0, polar.cos());

        for c in 0..=columns {
            let azimuth = c as f32 / columns as f32 * 2.0 * PI;
            let (sin_a, cos_a) = azimuth.sin_cos();
            let point = Vector3::new(
                meridian.x * cos_a - meridian.y * sin_a,
                meridian.x * sin_a + meridian.y * cos_a,
                meridian.z,
            );
            lattice.push(Point3::from(point * radius));
        }
    }

    let stride = columns + 1;
    let mut mesh = Mesh::with_capacity(count);
    for r in 0..rows {
        let offset = r * stride;
        for c in 0..columns {
            let upper_left = lattice[offset + c];
            let upper_right = lattice[offset + c + 1];
            let lower_right = lattice[offset + c + 1 + stride];
            let lower_left = lattice[offset + c + stride];

            mesh.add_triangle(upper_left, lower_left, lower_right);
            mesh.add_triangle(upper_left, lower_right, upper_right);
        }
    }

    mesh
}

/// Build a torus around the z axis from `num_major` × `num_minor` quads.
pub fn build_torus(major_radius: f32, minor_radius: f32, num_major: u32, num_minor: u32) -> Mesh {
    if !positive(major_radius)
        || !minor_radius.is_finite()
        || minor_radius < 0.0
        || num_major == 0
        || num_minor == 0
    {
        tracing::warn!(
            major_radius,
            minor_radius,
            num_major,
            num_minor,
            "degenerate torus parameters, producing empty mesh"
        );
        return Mesh::new();
    }

    let Some(count) = torus_vertex_count(num_major, num_minor) else {
        tracing::warn!(num_major, num_minor, "torus exceeds vertex limit, producing empty mesh");
        return Mesh::new();
    };

    let major_step = 2.0 * PI / num_major as f32;
    let minor_step = 2.0 * PI / num_minor as f32;
    let mut mesh = Mesh::with_capacity(count);

    for i in 0..num_major {
        let a0 = i as f32 * major_step;
        let a1 = a0 + major_step;
        let (y0, x0) = a0.sin_cos();
        let (y1, x1) = a1.sin_cos();

        for j in 0..num_minor {
            let b0 = j as f32 * minor_step;
            let b1 = b0 + minor_step;
            let r0 = minor_radius * b0.cos() + major_radius;
            let z0 = minor_radius * b0.sin();
            let r1 = minor_radius * b1.cos() + major_radius;
            let z1 = minor_radius * b1.sin();

            let left0 = Point3::new(x0 * r0, y0 * r0, z0);
            let right0 = Point3::new(x1 * r0, y1 * r0, z0);
            let left1 = Point3::new(x0 * r1, y0 * r1, z1);
            let right1 = Point3::new(x1 * r1, y1 * r1, z1);

            mesh.add_triangle(left0, right0, left1);
            mesh.add_triangle(left1, right0, right1);
        }
    }

    mesh
}
