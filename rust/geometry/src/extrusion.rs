// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extrusion operations - converting 2D profiles to 3D meshes

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::profile::{Profile2D, Triangulation};
use nalgebra::{Point2, Point3, Vector3};

/// Extrude a 2D profile along the Z axis.
///
/// The solid is centered on Z and spans `[-depth/2, +depth/2]`.
#[inline]
pub fn extrude_profile(profile: &Profile2D, depth: f64) -> Result<Mesh> {
    if !(depth.is_finite() && depth > 0.0) {
        return Err(Error::InvalidExtrusion(format!(
            "Depth must be positive, got {}",
            depth
        )));
    }

    let mut triangulation = profile.triangulate()?;
    triangulation.orient_ccw();
    if triangulation.indices.is_empty() {
        return Err(Error::EmptyMesh(
            "Profile triangulated to zero area".to_string(),
        ));
    }

    let ring_points =
        profile.outer.len() + profile.holes.iter().map(|h| h.len()).sum::<usize>();
    let mut mesh = Mesh::with_capacity(
        triangulation.points.len() * 2 + ring_points * 4,
        triangulation.indices.len() * 2 + ring_points * 6,
    );

    let z0 = -depth / 2.0;
    let z1 = depth / 2.0;

    create_cap_mesh(&triangulation, z0, false, &mut mesh);
    create_cap_mesh(&triangulation, z1, true, &mut mesh);

    create_side_walls(&profile.outer, z0, z1, &mut mesh);
    // Holes are stored clockwise so the same routine faces them into the void
    for hole in &profile.holes {
        create_side_walls(hole, z0, z1, &mut mesh);
    }

    Ok(mesh)
}

/// Create a cap mesh (top or bottom) from a CCW triangulation
#[inline]
fn create_cap_mesh(triangulation: &Triangulation, z: f64, top: bool, mesh: &mut Mesh) {
    let base_index = mesh.vertex_count() as u32;
    let normal = if top {
        Vector3::new(0.0, 0.0, 1.0)
    } else {
        Vector3::new(0.0, 0.0, -1.0)
    };

    for point in &triangulation.points {
        mesh.add_vertex(Point3::new(point.x, point.y, z), normal);
    }

    for tri in triangulation.indices.chunks_exact(3) {
        let i0 = base_index + tri[0] as u32;
        let i1 = base_index + tri[1] as u32;
        let i2 = base_index + tri[2] as u32;

        // Reverse winding for bottom cap
        if top {
            mesh.add_triangle(i0, i1, i2);
        } else {
            mesh.add_triangle(i0, i2, i1);
        }
    }
}

/// Create side walls for a profile boundary
#[inline]
fn create_side_walls(boundary: &[Point2<f64>], z0: f64, z1: f64, mesh: &mut Mesh) {
    for i in 0..boundary.len() {
        let j = (i + 1) % boundary.len();

        let p0 = &boundary[i];
        let p1 = &boundary[j];

        // Outward for a CCW ring; skip degenerate edges
        let edge = p1 - p0;
        let normal = match Vector3::new(edge.y, -edge.x, 0.0).try_normalize(1e-12) {
            Some(n) => n,
            None => continue,
        };

        let idx = mesh.vertex_count() as u32;
        mesh.add_vertex(Point3::new(p0.x, p0.y, z0), normal);
        mesh.add_vertex(Point3::new(p1.x, p1.y, z0), normal);
        mesh.add_vertex(Point3::new(p1.x, p1.y, z1), normal);
        mesh.add_vertex(Point3::new(p0.x, p0.y, z1), normal);

        mesh.add_triangle(idx, idx + 1, idx + 2);
        mesh.add_triangle(idx, idx + 2, idx + 3);
    }
}
