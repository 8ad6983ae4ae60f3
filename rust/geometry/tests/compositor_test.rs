// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use signlite_geometry::csg::VOLUME_TOLERANCE;
use signlite_geometry::{
    combine, cuboid, cylinder, mm, BooleanOp, CompositionError, Compositor, Mesh, Solid, Vector3,
    CYLINDER_SEGMENTS,
};
use std::f64::consts::FRAC_PI_2;

/// A tool the solver must never see: one coordinate is NaN
fn broken_tool() -> Solid {
    let mut mesh = cuboid(0.5, 0.5, 4.0).world_mesh();
    for v in mesh.positions.iter_mut().step_by(7) {
        *v = f32::NAN;
    }
    Solid::new(mesh)
}

fn same_geometry(a: &Mesh, b: &Mesh) -> bool {
    a.positions == b.positions && a.indices == b.indices
}

#[test]
fn failed_subtract_returns_base_unchanged() {
    let base = cuboid(2.0, 2.0, 2.0)
        .with_tag("back_plate")
        .translated(Vector3::new(1.0, 0.0, 0.0));
    let expected = base.world_mesh();

    assert!(matches!(
        combine(&base, &broken_tool(), BooleanOp::Subtract),
        Err(CompositionError::NonFiniteGeometry(_))
    ));

    let mut compositor = Compositor::new();
    let result = compositor.combine_or_base(base, &broken_tool(), BooleanOp::Subtract, "back_plate");

    assert!(same_geometry(&result.world_mesh(), &expected));
    assert_eq!(result.tag(), Some("back_plate"));
    assert_eq!(compositor.report().attempted, 1);
    assert_eq!(compositor.report().failed, 1);
    assert!(compositor.report().failures[0].starts_with("back_plate: subtract"));
}

#[test]
fn empty_tool_falls_back() {
    let base = cuboid(1.0, 1.0, 1.0);
    let expected = base.world_mesh();
    let mut compositor = Compositor::new();
    let result = compositor.combine_or_base(base, &Solid::new(Mesh::new()), BooleanOp::Union, "face_plate");
    assert!(same_geometry(&result.world_mesh(), &expected));
    assert!(!compositor.report().is_clean());
}

#[test]
fn bore_through_plate_removes_volume() {
    let plate = cuboid(10.0, 10.0, 1.0);
    let bore = cylinder(1.0, 3.0, 32);
    let mut compositor = Compositor::new();
    let result = compositor.combine_or_base(plate, &bore, BooleanOp::Subtract, "plate");

    let volume = result.world_mesh().signed_volume();
    let bore_area = 0.5 * 32.0 * (2.0 * std::f64::consts::PI / 32.0).sin();
    assert_relative_eq!(volume, 100.0 - bore_area, epsilon = 1e-2);
    assert!(compositor.report().is_clean());
}

#[test]
fn union_all_folds_overlapping_tools() {
    let plate = cuboid(10.0, 2.0, 1.0);
    let studs: Vec<Solid> = (0..3)
        .map(|i| cuboid(1.0, 1.0, 1.0).translated(Vector3::new(-3.0 + 3.0 * i as f64, 0.0, 0.5)))
        .collect();

    let mut compositor = Compositor::new();
    let result = compositor.union_all(plate, &studs, "face_plate");

    // Each stud overlaps the plate by half its depth
    assert_relative_eq!(result.world_mesh().signed_volume(), 20.0 + 3.0 * 0.5, epsilon = 1e-2);
    assert_eq!(compositor.report().attempted, 3);
    assert_eq!(compositor.report().merged_without_solver, 0);
}

#[test]
fn union_all_survives_a_bad_tool() {
    let plate = cuboid(10.0, 2.0, 1.0);
    let tools = vec![
        cuboid(1.0, 1.0, 1.0).translated(Vector3::new(0.0, 0.0, 0.75)),
        broken_tool(),
    ];
    let mut compositor = Compositor::new();
    let result = compositor.union_all(plate, &tools, "face_plate");
    assert!(result.world_mesh().is_finite());
    assert_eq!(compositor.report().failed, 1);
}

#[test]
fn cable_bore_never_grows_the_wall() {
    let wall = cuboid(mm(200.0), mm(3.0), mm(40.0));
    let bore = cylinder(mm(6.25), mm(12.0), CYLINDER_SEGMENTS).rotated_x(FRAC_PI_2);
    let wall_volume = wall.world_mesh().signed_volume();
    let bore_volume = bore.world_mesh().signed_volume();
    let expected = wall.world_mesh();

    let mut compositor = Compositor::new();
    let result = compositor.combine_or_base(wall, &bore, BooleanOp::Subtract, "back_plate: cable gland");

    let volume = result.world_mesh().signed_volume();
    let slack = VOLUME_TOLERANCE * wall_volume;
    assert!(volume <= wall_volume + slack, "{} > {}", volume, wall_volume);
    assert!(volume >= wall_volume - bore_volume - slack, "{}", volume);
    if !compositor.report().is_clean() {
        assert!(same_geometry(&result.world_mesh(), &expected));
    }
}
