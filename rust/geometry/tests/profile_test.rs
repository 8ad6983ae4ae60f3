// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use signlite_geometry::bool2d::compute_signed_area;
use signlite_geometry::{build_profile, effective_corner_radius, extrude, mm, ProfileShape};

const SHAPES: [ProfileShape; 5] = [
    ProfileShape::Rectangle,
    ProfileShape::RoundedRect,
    ProfileShape::Oval,
    ProfileShape::Arch,
    ProfileShape::AutoContour,
];

#[test]
fn every_shape_is_closed_with_clamped_radius() {
    let sizes = [(0.1, 0.1), (300.0, 120.0), (40.0, 400.0), (5.0, 0.5)];
    let radii = [-5.0, 0.0, 2.0, 60.0, 1e6, f64::NAN];

    for shape in SHAPES {
        for (w, h) in sizes {
            for r in radii {
                let (w, h, r) = (mm(w), mm(h), mm(r));
                let profile = build_profile(shape, w, h, r);

                let closed = profile.closed_outer();
                assert_eq!(closed.first(), closed.last());
                assert!(profile.outer.len() >= 3, "{:?} {} {}", shape, w, h);
                assert!(compute_signed_area(&profile.outer) > 0.0);

                let radius = effective_corner_radius(shape, w, h, r);
                assert!(radius >= 0.0);
                assert!(radius <= w.min(h) / 2.0 + 1e-15, "{:?} r={}", shape, radius);
            }
        }
    }
}

#[test]
fn every_shape_extrudes_to_positive_volume() {
    for shape in SHAPES {
        let profile = build_profile(shape, mm(200.0), mm(150.0), mm(20.0));
        let solid = extrude(&profile, mm(3.0)).unwrap();
        assert!(solid.world_mesh().signed_volume() > 0.0, "{:?}", shape);
    }
}
