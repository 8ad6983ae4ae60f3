// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Primitive factory: extrusions, boxes, cylinders and cleat wedges.
//!
//! Every primitive is centered at the origin in local space.

use crate::error::Result;
use crate::extrusion::extrude_profile;
use crate::mesh::Mesh;
use crate::profile::{min_dimension, Profile2D};
use crate::solid::Solid;
use nalgebra::{Matrix4, Point2, Point3, Vector3};
use std::f64::consts::{FRAC_PI_2, PI};

/// Default segment count for cylinders
pub const CYLINDER_SEGMENTS: usize = 32;

/// Which face of a wedge carries the 45° cut
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BevelFace {
    Bottom,
    Top,
}

#[inline]
fn positive(value: f64) -> f64 {
    if value.is_finite() && value > min_dimension() {
        value
    } else {
        min_dimension()
    }
}

/// Sweep a profile along Z, spanning `[-depth/2, +depth/2]`
pub fn extrude(profile: &Profile2D, depth: f64) -> Result<Solid> {
    Ok(Solid::new(extrude_profile(profile, depth)?))
}

/// Axis-aligned box: `width` on X, `height` on Y, `depth` on Z
pub fn cuboid(width: f64, height: f64, depth: f64) -> Solid {
    let (hx, hy, hz) = (positive(width) / 2.0, positive(height) / 2.0, positive(depth) / 2.0);

    let p = |x: f64, y: f64, z: f64| Point3::new(x * hx, y * hy, z * hz);
    // Each face listed CCW seen from outside
    let faces: [([Point3<f64>; 4], Vector3<f64>); 6] = [
        ([p(-1., -1., 1.), p(1., -1., 1.), p(1., 1., 1.), p(-1., 1., 1.)], Vector3::z()),
        ([p(-1., 1., -1.), p(1., 1., -1.), p(1., -1., -1.), p(-1., -1., -1.)], -Vector3::z()),
        ([p(1., -1., -1.), p(1., 1., -1.), p(1., 1., 1.), p(1., -1., 1.)], Vector3::x()),
        ([p(-1., -1., 1.), p(-1., 1., 1.), p(-1., 1., -1.), p(-1., -1., -1.)], -Vector3::x()),
        ([p(-1., 1., 1.), p(1., 1., 1.), p(1., 1., -1.), p(-1., 1., -1.)], Vector3::y()),
        ([p(-1., -1., -1.), p(1., -1., -1.), p(1., -1., 1.), p(-1., -1., 1.)], -Vector3::y()),
    ];

    let mut mesh = Mesh::with_capacity(24, 36);
    for (corners, normal) in faces {
        let base = mesh.vertex_count() as u32;
        for corner in corners {
            mesh.add_vertex(corner, normal);
        }
        mesh.add_triangle(base, base + 1, base + 2);
        mesh.add_triangle(base, base + 2, base + 3);
    }
    Solid::new(mesh)
}

/// Cylinder with its axis on Z
pub fn cylinder(radius: f64, height: f64, segments: usize) -> Solid {
    let radius = positive(radius);
    let hz = positive(height) / 2.0;
    let segments = segments.max(3);

    let ring: Vec<Point2<f64>> = (0..segments)
        .map(|i| {
            let angle = 2.0 * PI * (i as f64) / (segments as f64);
            Point2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect();

    let mut mesh = Mesh::with_capacity(segments * 6, segments * 12);

    // Caps as fans from the first rim vertex
    for (z, normal) in [(hz, Vector3::z()), (-hz, -Vector3::z())] {
        let base = mesh.vertex_count() as u32;
        for p in &ring {
            mesh.add_vertex(Point3::new(p.x, p.y, z), normal);
        }
        for i in 1..(segments as u32 - 1) {
            if z > 0.0 {
                mesh.add_triangle(base, base + i, base + i + 1);
            } else {
                mesh.add_triangle(base, base + i + 1, base + i);
            }
        }
    }

    for i in 0..segments {
        let a = ring[i];
        let b = ring[(i + 1) % segments];
        let mid = (a.coords + b.coords) * 0.5;
        let normal = Vector3::new(mid.x, mid.y, 0.0).normalize();

        let base = mesh.vertex_count() as u32;
        mesh.add_vertex(Point3::new(a.x, a.y, -hz), normal);
        mesh.add_vertex(Point3::new(b.x, b.y, -hz), normal);
        mesh.add_vertex(Point3::new(b.x, b.y, hz), normal);
        mesh.add_vertex(Point3::new(a.x, a.y, hz), normal);
        mesh.add_triangle(base, base + 1, base + 2);
        mesh.add_triangle(base, base + 2, base + 3);
    }

    Solid::new(mesh)
}

/// Cleat wedge: a box (`width` on X, `height` on Y, `depth` on Z) with one
/// horizontal face cut at 45° across the depth.
///
/// The cut plane rises toward +Z on both variants, so a `Bottom` wedge
/// hooks over a `Top` wedge of the same depth.
pub fn wedge(width: f64, height: f64, depth: f64, bevel: BevelFace) -> Result<Solid> {
    let width = positive(width);
    let height = positive(height);
    let depth = positive(depth);
    // Keep a flat strip on the opposite face
    let cut = depth.min(height * 0.9);

    let (hz, hy) = (depth / 2.0, height / 2.0);
    // Section in (z, y) coordinates, counter-clockwise
    let section = match bevel {
        BevelFace::Bottom => vec![
            Point2::new(-hz, -hy),
            Point2::new(hz, -hy + cut),
            Point2::new(hz, hy),
            Point2::new(-hz, hy),
        ],
        BevelFace::Top => vec![
            Point2::new(-hz, -hy),
            Point2::new(hz, -hy),
            Point2::new(hz, hy),
            Point2::new(-hz, hy - cut),
        ],
    };

    let mesh = extrude_profile(&Profile2D::new(section), width)?;
    // Section x becomes world Z; the sweep axis becomes world X
    let to_world = Matrix4::from_axis_angle(&Vector3::y_axis(), -FRAC_PI_2);
    Ok(Solid::new(mesh.transformed(&to_world)))
}
