// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use nalgebra::{Matrix4, Point3, Vector3};

/// Axis-aligned bounding box in f64 precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Bounds {
    /// Create bounds from two corners
    #[inline]
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Bounds that contain nothing; the identity for [`Bounds::union`]
    #[inline]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point3::new(f64::MIN, f64::MIN, f64::MIN),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Grow to include a point
    #[inline]
    pub fn include(&mut self, p: &Point3<f64>) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Smallest bounds containing both
    #[inline]
    pub fn union(&self, other: &Bounds) -> Bounds {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        let mut out = *self;
        out.include(&other.min);
        out.include(&other.max);
        out
    }

    /// Check whether two boxes share volume (touching faces do not count)
    #[inline]
    pub fn overlaps(&self, other: &Bounds) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn depth(&self) -> f64 {
        self.max.z - self.min.z
    }

    #[inline]
    pub fn center(&self) -> Point3<f64> {
        Point3::from((self.min.coords + self.max.coords) * 0.5)
    }
}

/// Triangle mesh
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz)
    pub normals: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Add a vertex with normal
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>, normal: Vector3<f64>) {
        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);

        self.normals.push(normal.x as f32);
        self.normals.push(normal.y as f32);
        self.normals.push(normal.z as f32);
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Add a free-standing triangle with its face normal
    pub fn push_triangle(&mut self, v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) {
        let normal = (v1 - v0)
            .cross(&(v2 - v0))
            .try_normalize(1e-12)
            .unwrap_or_else(Vector3::z);
        let base = self.vertex_count() as u32;
        self.add_vertex(v0, normal);
        self.add_vertex(v1, normal);
        self.add_vertex(v2, normal);
        self.add_triangle(base, base + 1, base + 2);
    }

    /// Merge another mesh into this one
    #[inline]
    pub fn merge(&mut self, other: &Mesh) {
        if other.is_empty() {
            return;
        }

        let vertex_offset = (self.positions.len() / 3) as u32;

        self.positions.reserve(other.positions.len());
        self.normals.reserve(other.normals.len());
        self.indices.reserve(other.indices.len());

        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);

        self.indices
            .extend(other.indices.iter().map(|&i| i + vertex_offset));
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Position of vertex `i` in f64
    #[inline]
    pub fn position(&self, i: usize) -> Point3<f64> {
        Point3::new(
            self.positions[i * 3] as f64,
            self.positions[i * 3 + 1] as f64,
            self.positions[i * 3 + 2] as f64,
        )
    }

    /// Iterate triangles as corner positions
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f64>; 3]> + '_ {
        self.indices.chunks_exact(3).map(move |tri| {
            [
                self.position(tri[0] as usize),
                self.position(tri[1] as usize),
                self.position(tri[2] as usize),
            ]
        })
    }

    /// True when every coordinate is a finite number
    pub fn is_finite(&self) -> bool {
        self.positions.iter().all(|v| v.is_finite())
    }

    /// Calculate bounds in f64
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::empty();
        for i in 0..self.vertex_count() {
            bounds.include(&self.position(i));
        }
        bounds
    }

    /// Return a copy with `transform` applied to positions and normals
    pub fn transformed(&self, transform: &Matrix4<f64>) -> Mesh {
        let mut mesh = self.clone();
        mesh.apply_transform(transform);
        mesh
    }

    /// Apply transformation matrix in place
    pub fn apply_transform(&mut self, transform: &Matrix4<f64>) {
        self.positions.chunks_exact_mut(3).for_each(|chunk| {
            let point = Point3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
            let transformed = transform.transform_point(&point);
            chunk[0] = transformed.x as f32;
            chunk[1] = transformed.y as f32;
            chunk[2] = transformed.z as f32;
        });

        // Normals use the inverse transpose
        let normal_matrix = transform.try_inverse().unwrap_or(*transform).transpose();

        self.normals.chunks_exact_mut(3).for_each(|chunk| {
            let normal = Vector3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
            let transformed = (normal_matrix * normal.to_homogeneous())
                .xyz()
                .try_normalize(1e-12)
                .unwrap_or(normal);
            chunk[0] = transformed.x as f32;
            chunk[1] = transformed.y as f32;
            chunk[2] = transformed.z as f32;
        });

        // A mirroring transform flips handedness; keep outward winding
        if transform.fixed_view::<3, 3>(0, 0).determinant() < 0.0 {
            self.indices.chunks_exact_mut(3).for_each(|tri| tri.swap(1, 2));
        }
    }

    /// Signed volume from the divergence theorem (positive for outward winding)
    pub fn signed_volume(&self) -> f64 {
        self.triangles()
            .map(|[a, b, c]| a.coords.dot(&b.coords.cross(&c.coords)) / 6.0)
            .sum()
    }

    /// Clear the mesh
    #[inline]
    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.indices.clear();
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_creation() {
        let mesh = Mesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_add_vertex() {
        let mut mesh = Mesh::new();
        mesh.add_vertex(Point3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(mesh.vertex_count(), 1);
        assert_eq!(mesh.positions, vec![1.0, 2.0, 3.0]);
        assert_eq!(mesh.normals, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_merge() {
        let mut mesh1 = Mesh::new();
        mesh1.push_triangle(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );

        let mut mesh2 = Mesh::new();
        mesh2.push_triangle(
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        );

        mesh1.merge(&mesh2);
        assert_eq!(mesh1.vertex_count(), 6);
        assert_eq!(mesh1.triangle_count(), 2);
        assert_eq!(&mesh1.indices[3..], &[3, 4, 5]);
    }

    #[test]
    fn test_bounds_union_and_overlap() {
        let a = Bounds::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = Bounds::new(Point3::new(0.5, 0.5, 0.5), Point3::new(2.0, 2.0, 2.0));
        let c = Bounds::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));

        assert!(a.overlaps(&b));
        // Face contact only
        assert!(!a.overlaps(&c));

        let u = a.union(&b);
        assert_eq!(u.min, Point3::new(0.0, 0.0, 0.0));
        assert_eq!(u.max, Point3::new(2.0, 2.0, 2.0));
        assert_eq!(Bounds::empty().union(&a), a);
    }

    #[test]
    fn test_transform_translates_positions() {
        let mut mesh = Mesh::new();
        mesh.push_triangle(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let moved = mesh.transformed(&Matrix4::new_translation(&Vector3::new(1.0, 2.0, 3.0)));
        let bounds = moved.bounds();
        assert_eq!(bounds.min, Point3::new(1.0, 2.0, 3.0));
        // Source mesh untouched
        assert_eq!(mesh.bounds().min, Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_mirror_keeps_winding_outward() {
        let mut mesh = Mesh::new();
        mesh.push_triangle(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let mirrored = mesh.transformed(&Matrix4::new_nonuniform_scaling(&Vector3::new(
            -1.0, 1.0, 1.0,
        )));
        let [a, b, c] = mirrored.triangles().next().unwrap();
        let normal = (b - a).cross(&(c - a));
        assert!(normal.z > 0.0);
    }
}
