// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D Boolean Operations on Profiles
//!
//! Shells (outer profile minus an inset profile) are cut in 2D with the
//! i_overlay crate before extrusion, which is cheaper and more reliable than
//! a 3D boolean on the finished solids.

use crate::error::{Error, Result};
use crate::profile::Profile2D;
use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;

/// Minimum area threshold - polygons smaller than this are considered degenerate
const MIN_AREA_THRESHOLD: f64 = 1e-14;

/// Perform 2D boolean difference: profile - clip
///
/// Returns every resulting shape as its own profile, largest first.
pub fn subtract_2d(profile: &Profile2D, clip: &Profile2D) -> Result<Vec<Profile2D>> {
    if profile.outer.len() < 3 {
        return Err(Error::InvalidProfile(
            "Profile must have at least 3 vertices".to_string(),
        ));
    }

    if clip.outer.len() < 3 {
        return Err(Error::InvalidProfile(
            "Clip contour must have at least 3 vertices".to_string(),
        ));
    }

    let subject = profile_to_paths(profile);
    let clip = profile_to_paths(clip);

    // Result is a list of shapes, each a list of contours (outer first)
    let result = subject.overlay(&clip, OverlayRule::Difference, FillRule::EvenOdd);

    shapes_to_profiles(&result)
}

/// Ring between `outer` and `inner`.
///
/// Falls back to treating `inner` as a hole of `outer` when the overlay
/// produces nothing usable.
pub fn shell_2d(outer: &Profile2D, inner: &Profile2D) -> Vec<Profile2D> {
    match subtract_2d(outer, inner) {
        Ok(profiles) if !profiles.is_empty() => profiles,
        Ok(_) | Err(_) => {
            tracing::debug!("2D shell overlay returned no shapes, using outer+hole ring");
            let mut ring = outer.clone();
            ring.add_hole(inner.outer.clone());
            vec![ring]
        }
    }
}

/// Group loose contours into profiles by nesting depth.
///
/// Even depth contours become outers, odd depth contours become holes of the
/// closest enclosing outer. Orientation of the input is ignored.
pub fn classify_contours(contours: Vec<Vec<Point2<f64>>>) -> Vec<Profile2D> {
    let contours: Vec<_> = contours.into_iter().filter(|c| is_valid_contour(c)).collect();

    // Depth = number of other contours that contain this one
    let depths: Vec<usize> = contours
        .iter()
        .enumerate()
        .map(|(i, c)| {
            contours
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && contour_inside_contour(c, other))
                .count()
        })
        .collect();

    let mut profiles: Vec<(usize, Profile2D)> = Vec::new();
    for (i, contour) in contours.iter().enumerate() {
        if depths[i] % 2 == 0 {
            profiles.push((i, Profile2D::new(ensure_ccw(contour))));
        }
    }

    for (i, contour) in contours.iter().enumerate() {
        if depths[i] % 2 == 1 {
            // Parent is the enclosing outer one level up
            let parent = profiles.iter_mut().find(|(j, _)| {
                depths[*j] + 1 == depths[i] && contour_inside_contour(contour, &contours[*j])
            });
            if let Some((_, profile)) = parent {
                profile.add_hole(contour.clone());
            }
        }
    }

    profiles.into_iter().map(|(_, p)| p).collect()
}

/// Check if a contour is valid (has area, not degenerate)
pub fn is_valid_contour(contour: &[Point2<f64>]) -> bool {
    if contour.len() < 3 {
        return false;
    }

    let area = compute_signed_area(contour).abs();
    area > MIN_AREA_THRESHOLD
}

/// Compute the signed area of a 2D contour
/// Positive = counter-clockwise, Negative = clockwise
pub fn compute_signed_area(contour: &[Point2<f64>]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = contour.len();

    for i in 0..n {
        let j = (i + 1) % n;
        area += contour[i].x * contour[j].y;
        area -= contour[j].x * contour[i].y;
    }

    area * 0.5
}

/// Ensure contour has counter-clockwise winding (positive area)
pub fn ensure_ccw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let area = compute_signed_area(contour);
    if area < 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Ensure contour has clockwise winding (for holes)
pub fn ensure_cw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let area = compute_signed_area(contour);
    if area > 0.0 {
        contour.iter().rev().cloned().collect()
    } else {
        contour.to_vec()
    }
}

/// Check if a point is inside a contour using ray casting
pub fn point_in_contour(point: &Point2<f64>, contour: &[Point2<f64>]) -> bool {
    if contour.len() < 3 {
        return false;
    }

    let mut inside = false;
    let n = contour.len();

    let mut j = n - 1;
    for i in 0..n {
        let pi = &contour[i];
        let pj = &contour[j];

        if ((pi.y > point.y) != (pj.y > point.y))
            && (point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x)
        {
            inside = !inside;
        }
        j = i;
    }

    inside
}

/// Check if contour A is completely inside contour B
pub fn contour_inside_contour(inner: &[Point2<f64>], outer: &[Point2<f64>]) -> bool {
    !inner.is_empty() && inner.iter().all(|p| point_in_contour(p, outer))
}

// ============================================================================
// Internal Helper Functions
// ============================================================================

/// Convert Profile2D to i_overlay path format
fn profile_to_paths(profile: &Profile2D) -> Vec<Vec<[f64; 2]>> {
    let mut paths = Vec::with_capacity(1 + profile.holes.len());

    paths.push(contour_to_path(&ensure_ccw(&profile.outer)));

    for hole in &profile.holes {
        paths.push(contour_to_path(&ensure_cw(hole)));
    }

    paths
}

/// Convert a Point2 contour to i_overlay path format
fn contour_to_path(contour: &[Point2<f64>]) -> Vec<[f64; 2]> {
    contour.iter().map(|p| [p.x, p.y]).collect()
}

fn path_to_contour(path: &[[f64; 2]]) -> Vec<Point2<f64>> {
    path.iter().map(|p| Point2::new(p[0], p[1])).collect()
}

/// Convert i_overlay result shapes back to profiles, largest first
///
/// i_overlay returns Vec<Vec<Vec<[f64; 2]>>> where:
/// - Outer Vec: list of shapes
/// - Middle Vec: list of contours per shape (first is outer, rest are holes)
/// - Inner Vec: list of points per contour
fn shapes_to_profiles(shapes: &[Vec<Vec<[f64; 2]>>]) -> Result<Vec<Profile2D>> {
    let mut profiles: Vec<Profile2D> = shapes
        .iter()
        .filter_map(|shape| {
            let outer = path_to_contour(shape.first()?);
            if !is_valid_contour(&outer) {
                return None;
            }
            let holes = shape
                .iter()
                .skip(1)
                .map(|c| path_to_contour(c))
                .filter(|h| is_valid_contour(h))
                .collect();
            Some(Profile2D::with_holes(outer, holes))
        })
        .collect();

    if profiles.is_empty() {
        return Err(Error::InvalidProfile(
            "Boolean operation resulted in empty geometry".to_string(),
        ));
    }

    profiles.sort_by(|a, b| b.area().total_cmp(&a.area()));
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{build_profile, create_rectangle, offset_inward, ProfileShape};
    use approx::assert_relative_eq;

    fn square(x0: f64, y0: f64, size: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x0 + size, y0),
            Point2::new(x0 + size, y0 + size),
            Point2::new(x0, y0 + size),
        ]
    }

    #[test]
    fn test_compute_signed_area_ccw() {
        let area = compute_signed_area(&square(0.0, 0.0, 1.0));
        assert_relative_eq!(area, 1.0);
    }

    #[test]
    fn test_ensure_cw_reverses_ccw() {
        let cw = ensure_cw(&square(0.0, 0.0, 1.0));
        assert!(compute_signed_area(&cw) < 0.0);
        assert!(compute_signed_area(&ensure_ccw(&cw)) > 0.0);
    }

    #[test]
    fn test_subtract_2d_makes_hole() {
        let profile = create_rectangle(10.0, 10.0);
        let clip = create_rectangle(2.0, 2.0);

        let result = subtract_2d(&profile, &clip).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].holes.len(), 1);
        assert_eq!(result[0].outer.len(), 4);
        assert_relative_eq!(result[0].area(), 96.0, epsilon = 1e-6);
    }

    #[test]
    fn test_shell_2d_rounded_rect() {
        let outer = build_profile(ProfileShape::RoundedRect, 0.3, 0.2, 0.02);
        let inner = offset_inward(ProfileShape::RoundedRect, 0.3, 0.2, 0.02, 0.005);
        let shell = shell_2d(&outer, &inner);
        assert_eq!(shell.len(), 1);
        assert_eq!(shell[0].holes.len(), 1);
        assert!(shell[0].area() > 0.0);
        assert!(shell[0].area() < outer.area());
    }

    #[test]
    fn test_point_in_contour() {
        let contour = square(0.0, 0.0, 10.0);
        assert!(point_in_contour(&Point2::new(5.0, 5.0), &contour));
        assert!(!point_in_contour(&Point2::new(15.0, 5.0), &contour));
        assert!(!point_in_contour(&Point2::new(-1.0, 5.0), &contour));
    }

    #[test]
    fn test_is_valid_contour() {
        assert!(is_valid_contour(&square(0.0, 0.0, 1.0)));

        let degenerate = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
        ];
        assert!(!is_valid_contour(&degenerate));
        assert!(!is_valid_contour(&degenerate[..2]));
    }

    #[test]
    fn test_classify_contours_nesting() {
        // "O" with a dot inside its counter: outer, hole, island
        let contours = vec![
            square(0.0, 0.0, 10.0),
            square(2.0, 2.0, 6.0),
            square(4.0, 4.0, 2.0),
            square(20.0, 0.0, 5.0),
        ];
        let profiles = classify_contours(contours);
        assert_eq!(profiles.len(), 3);
        let with_hole: Vec<_> = profiles.iter().filter(|p| !p.holes.is_empty()).collect();
        assert_eq!(with_hole.len(), 1);
        assert!(compute_signed_area(&with_hole[0].holes[0]) < 0.0);
        assert!(profiles.iter().all(|p| compute_signed_area(&p.outer) > 0.0));
    }
}
