// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D profile definitions and the profile builder
//!
//! Profiles are closed boundaries in the local XY plane, centered at the
//! origin. Rings are stored without the closing point; outer rings are
//! counter-clockwise and holes clockwise.

use crate::bool2d::{compute_signed_area, ensure_ccw, ensure_cw};
use crate::error::{Error, Result};
use crate::mm;
use nalgebra::{Point2, Vector2};
use std::f64::consts::{FRAC_PI_2, PI};

/// Segments used per quarter-circle corner
pub const CORNER_SEGMENTS: usize = 8;
/// Segments used for a full ellipse
pub const OVAL_SEGMENTS: usize = 64;
/// Segments used for the arch semicircle
pub const ARCH_SEGMENTS: usize = 32;
/// Ratio of the smaller dimension used as corner radius by `AutoContour`
pub const AUTO_CONTOUR_RATIO: f64 = 0.3;

/// Smallest width or height a profile is built with (0.1 mm)
#[inline]
pub fn min_dimension() -> f64 {
    mm(0.1)
}

/// 2D Profile with optional holes
#[derive(Debug, Clone, PartialEq)]
pub struct Profile2D {
    /// Outer boundary (counter-clockwise)
    pub outer: Vec<Point2<f64>>,
    /// Holes (clockwise)
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Profile2D {
    /// Create a new profile
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    /// Create a profile with holes, normalizing ring orientation
    pub fn with_holes(outer: Vec<Point2<f64>>, holes: Vec<Vec<Point2<f64>>>) -> Self {
        let mut profile = Self { outer, holes };
        profile.normalize_winding();
        profile
    }

    /// Add a hole to the profile
    pub fn add_hole(&mut self, hole: Vec<Point2<f64>>) {
        self.holes.push(ensure_cw(&hole));
    }

    /// Force outer ring CCW and holes CW
    pub fn normalize_winding(&mut self) {
        self.outer = ensure_ccw(&self.outer);
        for hole in &mut self.holes {
            *hole = ensure_cw(hole);
        }
    }

    /// Outer ring with the first point repeated at the end
    pub fn closed_outer(&self) -> Vec<Point2<f64>> {
        let mut ring = self.outer.clone();
        if let Some(first) = self.outer.first() {
            ring.push(*first);
        }
        ring
    }

    /// Net enclosed area (outer minus holes)
    pub fn area(&self) -> f64 {
        compute_signed_area(&self.outer).abs()
            - self
                .holes
                .iter()
                .map(|h| compute_signed_area(h).abs())
                .sum::<f64>()
    }

    /// Bounding box of the outer ring
    pub fn bounds(&self) -> (Point2<f64>, Point2<f64>) {
        let mut min = Point2::new(f64::MAX, f64::MAX);
        let mut max = Point2::new(f64::MIN, f64::MIN);
        for p in &self.outer {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        (min, max)
    }

    /// Apply a uniform scale then a translation to every ring
    pub fn scaled_translated(&self, scale: f64, offset: Vector2<f64>) -> Profile2D {
        let map = |ring: &Vec<Point2<f64>>| -> Vec<Point2<f64>> {
            ring.iter()
                .map(|p| Point2::from(p.coords * scale + offset))
                .collect()
        };
        let mut out = Profile2D {
            outer: map(&self.outer),
            holes: self.holes.iter().map(map).collect(),
        };
        // A negative scale mirrors the rings
        if scale < 0.0 {
            out.normalize_winding();
        }
        out
    }

    /// Triangulate the profile using earcutr
    /// Returns triangle indices into the flattened vertex array
    pub fn triangulate(&self) -> Result<Triangulation> {
        if self.outer.len() < 3 {
            return Err(Error::InvalidProfile(
                "Profile must have at least 3 vertices".to_string(),
            ));
        }

        let mut vertices = Vec::with_capacity(
            (self.outer.len() + self.holes.iter().map(|h| h.len()).sum::<usize>()) * 2,
        );

        for p in &self.outer {
            vertices.push(p.x);
            vertices.push(p.y);
        }

        let mut hole_indices = Vec::with_capacity(self.holes.len());
        for hole in &self.holes {
            hole_indices.push(vertices.len() / 2);
            for p in hole {
                vertices.push(p.x);
                vertices.push(p.y);
            }
        }

        let indices = earcutr::earcut(&vertices, &hole_indices, 2)
            .map_err(|e| Error::TriangulationError(format!("{:?}", e)))?;

        let points = vertices
            .chunks_exact(2)
            .map(|c| Point2::new(c[0], c[1]))
            .collect();

        Ok(Triangulation { points, indices })
    }
}

/// Triangulated profile result
#[derive(Debug, Clone)]
pub struct Triangulation {
    /// All vertices (outer + holes)
    pub points: Vec<Point2<f64>>,
    /// Triangle indices
    pub indices: Vec<usize>,
}

impl Triangulation {
    /// Wind every triangle counter-clockwise and drop zero-area ones.
    ///
    /// earcut does not promise a winding, and extrusion caps rely on one.
    pub fn orient_ccw(&mut self) {
        let points = &self.points;
        let mut oriented = Vec::with_capacity(self.indices.len());
        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (points[tri[0]], points[tri[1]], points[tri[2]]);
            let cross = (b - a).perp(&(c - a));
            if cross > 0.0 {
                oriented.extend_from_slice(&[tri[0], tri[1], tri[2]]);
            } else if cross < 0.0 {
                oriented.extend_from_slice(&[tri[0], tri[2], tri[1]]);
            }
        }
        self.indices = oriented;
    }
}

/// Outline shapes offered by the profile builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileShape {
    Rectangle,
    RoundedRect,
    Oval,
    Arch,
    AutoContour,
}

/// Clamp a width/height to a usable positive value
#[inline]
fn sanitize_dimension(value: f64) -> f64 {
    if value.is_finite() && value >= min_dimension() {
        value
    } else {
        min_dimension()
    }
}

/// Corner radius actually applied for `shape` at the given size.
///
/// Never exceeds half of the smaller dimension. Shapes without corners
/// (rectangle, oval, arch) report zero.
pub fn effective_corner_radius(shape: ProfileShape, width: f64, height: f64, corner_radius: f64) -> f64 {
    let width = sanitize_dimension(width);
    let height = sanitize_dimension(height);
    let limit = width.min(height) / 2.0;
    match shape {
        ProfileShape::Rectangle | ProfileShape::Oval | ProfileShape::Arch => 0.0,
        ProfileShape::RoundedRect => {
            if corner_radius.is_finite() && corner_radius > 0.0 {
                corner_radius.min(limit)
            } else {
                0.0
            }
        }
        ProfileShape::AutoContour => AUTO_CONTOUR_RATIO * width.min(height),
    }
}

/// Build a closed profile centered at the origin.
///
/// Inputs are clamped so the result is always a valid closed ring.
/// An arch whose height does not exceed its radius (`width / 2`) collapses
/// into a plain semicircular disc.
pub fn build_profile(shape: ProfileShape, width: f64, height: f64, corner_radius: f64) -> Profile2D {
    let w = sanitize_dimension(width);
    let h = sanitize_dimension(height);
    let radius = effective_corner_radius(shape, w, h, corner_radius);

    let outer = match shape {
        ProfileShape::Rectangle => rectangle_ring(w, h),
        ProfileShape::RoundedRect | ProfileShape::AutoContour => rounded_rect_ring(w, h, radius),
        ProfileShape::Oval => ellipse_ring(w / 2.0, h / 2.0, OVAL_SEGMENTS),
        ProfileShape::Arch => {
            let arch = ArchFrame::new(w, h);
            arch_ring(arch.radius, arch.spring, arch.bottom)
        }
    };

    Profile2D::new(dedup_ring(outer))
}

/// Inner boundary of a shell with wall `thickness`, concentric with the
/// outer profile built from the same arguments.
pub fn offset_inward(
    shape: ProfileShape,
    width: f64,
    height: f64,
    corner_radius: f64,
    thickness: f64,
) -> Profile2D {
    let t = if thickness.is_finite() { thickness.max(0.0) } else { 0.0 };
    if shape == ProfileShape::Arch {
        // Same arc center, smaller radius, floor raised by the wall
        let arch = ArchFrame::new(sanitize_dimension(width), sanitize_dimension(height));
        let radius = (arch.radius - t).max(min_dimension() / 2.0);
        return Profile2D::new(dedup_ring(arch_ring(radius, arch.spring, arch.bottom + t)));
    }
    let outer_radius = effective_corner_radius(shape, width, height, corner_radius);
    build_profile(
        shape,
        width - 2.0 * t,
        height - 2.0 * t,
        (outer_radius - t).max(0.0),
    )
}

/// Create a rectangular profile
#[inline]
pub fn create_rectangle(width: f64, height: f64) -> Profile2D {
    Profile2D::new(rectangle_ring(width, height))
}

/// Create a circular profile
pub fn create_circle(radius: f64, segments: usize) -> Profile2D {
    Profile2D::new(ellipse_ring(radius, radius, segments.max(3)))
}

fn rectangle_ring(width: f64, height: f64) -> Vec<Point2<f64>> {
    let half_w = width / 2.0;
    let half_h = height / 2.0;

    vec![
        Point2::new(-half_w, -half_h),
        Point2::new(half_w, -half_h),
        Point2::new(half_w, half_h),
        Point2::new(-half_w, half_h),
    ]
}

fn rounded_rect_ring(width: f64, height: f64, radius: f64) -> Vec<Point2<f64>> {
    if radius <= f64::EPSILON {
        return rectangle_ring(width, height);
    }

    let half_w = width / 2.0;
    let half_h = height / 2.0;
    // Corner centers in CCW order starting bottom-right, with start angles
    let corners = [
        (Point2::new(half_w - radius, -half_h + radius), -FRAC_PI_2),
        (Point2::new(half_w - radius, half_h - radius), 0.0),
        (Point2::new(-half_w + radius, half_h - radius), FRAC_PI_2),
        (Point2::new(-half_w + radius, -half_h + radius), PI),
    ];

    let mut ring = Vec::with_capacity(4 * (CORNER_SEGMENTS + 1));
    for (center, start) in corners {
        for i in 0..=CORNER_SEGMENTS {
            let angle = start + FRAC_PI_2 * (i as f64) / (CORNER_SEGMENTS as f64);
            ring.push(Point2::new(
                center.x + radius * angle.cos(),
                center.y + radius * angle.sin(),
            ));
        }
    }
    ring
}

fn ellipse_ring(rx: f64, ry: f64, segments: usize) -> Vec<Point2<f64>> {
    (0..segments)
        .map(|i| {
            let angle = 2.0 * PI * (i as f64) / (segments as f64);
            Point2::new(rx * angle.cos(), ry * angle.sin())
        })
        .collect()
}

/// Arch outline centered on the origin: a semicircle of `radius` on top of
/// straight sides that reach down from the spring line to `bottom`.
#[derive(Debug, Clone, Copy)]
struct ArchFrame {
    radius: f64,
    spring: f64,
    bottom: f64,
}

impl ArchFrame {
    fn new(width: f64, height: f64) -> Self {
        let radius = width / 2.0;
        let straight = (height - radius).max(0.0);
        let bottom = -(straight + radius) / 2.0;
        Self {
            radius,
            spring: bottom + straight,
            bottom,
        }
    }
}

/// Arc of `radius` centered on the spring line, closed by a flat floor.
///
/// A floor above the spring line cuts the arc into a segment.
fn arch_ring(radius: f64, spring: f64, floor: f64) -> Vec<Point2<f64>> {
    let lift = ((floor - spring) / radius).clamp(0.0, 0.95);
    let start = lift.asin();
    let sweep = PI - 2.0 * start;

    let mut ring = Vec::with_capacity(ARCH_SEGMENTS + 3);
    for i in 0..=ARCH_SEGMENTS {
        let angle = start + sweep * (i as f64) / (ARCH_SEGMENTS as f64);
        ring.push(Point2::new(radius * angle.cos(), spring + radius * angle.sin()));
    }
    if floor < spring {
        ring.push(Point2::new(-radius, floor));
        ring.push(Point2::new(radius, floor));
    }
    ring
}

/// Drop consecutive duplicates, including a trailing copy of the first point
fn dedup_ring(mut ring: Vec<Point2<f64>>) -> Vec<Point2<f64>> {
    let eps = min_dimension() * 1e-6;
    ring.dedup_by(|a, b| (*a - *b).norm() <= eps);
    while ring.len() > 3 {
        match (ring.first(), ring.last()) {
            (Some(first), Some(last)) if (first - last).norm() <= eps => {
                ring.pop();
            }
            _ => break,
        }
    }
    ring
}
