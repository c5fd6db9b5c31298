//! Mesh geometry: vertices, optional normals and colored polygons.

use std::f32::consts::PI;

use crate::error::{MeshError, Result};
use crate::types::Vec3;

/// One face of a mesh.
///
/// Vertex indices run counter-clockwise when viewed from outside. `color` is
/// the base palette index the lighting table expands into shade bands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polygon {
    pub vertices: Vec<usize>,
    /// Empty, or parallel to `vertices`.
    pub normals: Vec<usize>,
    pub color: u8,
}

impl Polygon {
    pub fn new(vertices: impl Into<Vec<usize>>, color: u8) -> Self {
        Self {
            vertices: vertices.into(),
            normals: Vec::new(),
            color,
        }
    }

    pub fn with_normals(mut self, normals: impl Into<Vec<usize>>) -> Self {
        self.normals = normals.into();
        self
    }
}

/// Plain geometry container. Built once, then read every frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    normals: Vec<Vec3>,
    polygons: Vec<Polygon>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a mesh from loader output, checking every index.
    pub fn from_parts(vertices: Vec<Vec3>, normals: Vec<Vec3>, polygons: Vec<Polygon>) -> Result<Self> {
        let mut mesh = Self {
            vertices,
            normals,
            polygons: Vec::with_capacity(polygons.len()),
        };
        for polygon in polygons {
            mesh.add_polygon(polygon)?;
        }
        Ok(mesh)
    }

    /// Append a vertex and return its index.
    pub fn add_vertex(&mut self, vertex: Vec3) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    /// Append a normal and return its index.
    pub fn add_normal(&mut self, normal: Vec3) -> usize {
        self.normals.push(normal);
        self.normals.len() - 1
    }

    /// Append a polygon after checking its indices against this mesh.
    ///
    /// Polygons with fewer than three vertices are accepted; the rasterizer
    /// skips them.
    pub fn add_polygon(&mut self, polygon: Polygon) -> Result<()> {
        self.check(&polygon)?;
        self.polygons.push(polygon);
        Ok(())
    }

    fn check(&self, polygon: &Polygon) -> Result<()> {
        if let Some(&index) = polygon.vertices.iter().find(|&&i| i >= self.vertices.len()) {
            return Err(MeshError::VertexIndex {
                index,
                len: self.vertices.len(),
            });
        }
        if !polygon.normals.is_empty() && polygon.normals.len() != polygon.vertices.len() {
            return Err(MeshError::NormalCount {
                vertices: polygon.vertices.len(),
                normals: polygon.normals.len(),
            });
        }
        if let Some(&index) = polygon.normals.iter().find(|&&i| i >= self.normals.len()) {
            return Err(MeshError::NormalIndex {
                index,
                len: self.normals.len(),
            });
        }
        Ok(())
    }

    /// Re-check every polygon.
    pub fn validate(&self) -> Result<()> {
        self.polygons.iter().try_for_each(|p| self.check(p))
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        self.polygons.clear();
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.polygons.is_empty()
    }

    /// Axis-aligned cube centered on the origin, one base color per face.
    pub fn cube(size: f32) -> Self {
        let s = size / 2.0;
        let vertices = vec![
            Vec3::new(-s, -s, -s),
            Vec3::new(s, -s, -s),
            Vec3::new(s, s, -s),
            Vec3::new(-s, s, -s),
            Vec3::new(-s, -s, s),
            Vec3::new(s, -s, s),
            Vec3::new(s, s, s),
            Vec3::new(-s, s, s),
        ];
        let polygons = vec![
            Polygon::new([0, 1, 2, 3], 1), // z = -s
            Polygon::new([5, 4, 7, 6], 2), // z = +s
            Polygon::new([4, 0, 3, 7], 3), // x = -s
            Polygon::new([1, 5, 6, 2], 4), // x = +s
            Polygon::new([3, 2, 6, 7], 5), // y = +s
            Polygon::new([4, 5, 1, 0], 6), // y = -s
        ];
        Self {
            vertices,
            normals: Vec::new(),
            polygons,
        }
    }

    /// Square-based pyramid with its apex on +Y.
    pub fn pyramid(size: f32) -> Self {
        let s = size / 2.0;
        let vertices = vec![
            Vec3::new(-s, -s, -s),
            Vec3::new(s, -s, -s),
            Vec3::new(s, -s, s),
            Vec3::new(-s, -s, s),
            Vec3::new(0.0, s, 0.0),
        ];
        let polygons = vec![
            Polygon::new([0, 1, 2, 3], 1),
            Polygon::new([0, 4, 1], 2),
            Polygon::new([1, 4, 2], 3),
            Polygon::new([2, 4, 3], 4),
            Polygon::new([3, 4, 0], 5),
        ];
        Self {
            vertices,
            normals: Vec::new(),
            polygons,
        }
    }

    /// Latitude/longitude sphere made of triangles, colors cycling 1-6.
    pub fn sphere(radius: f32, segments: usize) -> Self {
        let segments = segments.max(2);
        let mut mesh = Self::new();

        for lat in 0..=segments {
            let theta = lat as f32 * PI / segments as f32;
            let (sin_t, cos_t) = theta.sin_cos();
            for lon in 0..=segments {
                let phi = lon as f32 * 2.0 * PI / segments as f32;
                let (sin_p, cos_p) = phi.sin_cos();
                mesh.vertices.push(Vec3::new(
                    cos_p * sin_t * radius,
                    cos_t * radius,
                    sin_p * sin_t * radius,
                ));
            }
        }

        for lat in 0..segments {
            for lon in 0..segments {
                let first = lat * (segments + 1) + lon;
                let second = first + segments + 1;
                let color = 1 + ((lat + lon) % 6) as u8;
                mesh.polygons
                    .push(Polygon::new([first, second, first + 1], color));
                mesh.polygons
                    .push(Polygon::new([second, second + 1, first + 1], color));
            }
        }

        mesh
    }
}
