// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boolean composition of solids
//!
//! Union, subtract and intersect are evaluated by the csgrs BSP solver on
//! world-space meshes. The solver is numerically fragile, so every call is
//! checked and callers choose between the strict [`combine`] and the
//! fall-back-to-base [`Compositor::combine_or_base`].

use crate::mesh::Mesh;
use crate::solid::Solid;
use nalgebra::{Point3, Vector3};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;

/// Boolean operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanOp {
    Union,
    Subtract,
    Intersect,
}

impl fmt::Display for BooleanOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BooleanOp::Union => "union",
            BooleanOp::Subtract => "subtract",
            BooleanOp::Intersect => "intersect",
        })
    }
}

/// Relative slack when checking a result volume against its operands
pub const VOLUME_TOLERANCE: f64 = 1e-3;

/// Cross products at or below this norm mark a degenerate triangle
const DEGENERATE_AREA: f64 = 1e-14;

/// Which side of a boolean an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Base,
    Tool,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operand::Base => "base",
            Operand::Tool => "tool",
        })
    }
}

/// Reasons a boolean could not produce a usable solid
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompositionError {
    #[error("{0} operand has no triangles")]
    EmptyOperand(Operand),

    #[error("{0} operand has non-finite coordinates")]
    NonFiniteGeometry(Operand),

    #[error("{op} produced a degenerate result: {reason}")]
    DegenerateResult { op: BooleanOp, reason: String },

    #[error("boolean solver panicked: {0}")]
    SolverPanicked(String),
}

/// Combine two solids in world space.
///
/// Both transforms are realized first. The result owns fresh geometry with
/// an identity placement and carries the base's tag.
pub fn combine(base: &Solid, tool: &Solid, op: BooleanOp) -> Result<Solid, CompositionError> {
    let base_mesh = base.world_mesh();
    let tool_mesh = tool.world_mesh();
    check_operand(&base_mesh, Operand::Base)?;
    check_operand(&tool_mesh, Operand::Tool)?;

    let base_bounds = base_mesh.bounds();
    let tool_bounds = tool_mesh.bounds();

    // Disjoint operands need no solver
    if !base_bounds.overlaps(&tool_bounds) {
        let mesh = match op {
            BooleanOp::Union => {
                let mut merged = base_mesh;
                merged.merge(&tool_mesh);
                merged
            }
            BooleanOp::Subtract => base_mesh,
            BooleanOp::Intersect => Mesh::new(),
        };
        return Ok(with_base_tag(mesh, base));
    }

    let base_volume = base_mesh.signed_volume();
    let tool_volume = tool_mesh.signed_volume();
    let mesh = run_solver(&base_mesh, &tool_mesh, op)?;

    if !mesh.is_finite() {
        return Err(CompositionError::DegenerateResult {
            op,
            reason: "non-finite coordinates".to_string(),
        });
    }
    if mesh.is_empty() {
        if op == BooleanOp::Intersect {
            return Ok(with_base_tag(mesh, base));
        }
        return Err(CompositionError::DegenerateResult {
            op,
            reason: "no triangles".to_string(),
        });
    }
    let volume = mesh.signed_volume();
    if op != BooleanOp::Intersect && volume <= 0.0 {
        return Err(CompositionError::DegenerateResult {
            op,
            reason: "non-positive volume".to_string(),
        });
    }
    check_volume(op, base_volume, tool_volume, volume)?;

    Ok(with_base_tag(mesh, base))
}

/// Reject results whose volume no correct boolean of these operands could
/// have. The BSP solver sometimes returns closed but wrong solids.
fn check_volume(op: BooleanOp, base: f64, tool: f64, result: f64) -> Result<(), CompositionError> {
    let (low, high) = match op {
        BooleanOp::Union => (base.max(tool), base + tool),
        BooleanOp::Subtract => (base - tool, base),
        BooleanOp::Intersect => (0.0, base.min(tool)),
    };
    let slack = VOLUME_TOLERANCE * base.abs().max(tool.abs());
    if result < low - slack || result > high + slack {
        return Err(CompositionError::DegenerateResult {
            op,
            reason: format!("volume {:.4e} outside [{:.4e}, {:.4e}]", result, low, high),
        });
    }
    Ok(())
}

fn with_base_tag(mesh: Mesh, base: &Solid) -> Solid {
    let solid = Solid::new(mesh);
    match base.tag() {
        Some(tag) => solid.with_tag(tag),
        None => solid,
    }
}

fn check_operand(mesh: &Mesh, operand: Operand) -> Result<(), CompositionError> {
    if mesh.is_empty() {
        return Err(CompositionError::EmptyOperand(operand));
    }
    if !mesh.is_finite() {
        return Err(CompositionError::NonFiniteGeometry(operand));
    }
    Ok(())
}

fn run_solver(base: &Mesh, tool: &Mesh, op: BooleanOp) -> Result<Mesh, CompositionError> {
    use csgrs::traits::CSG;

    let a = mesh_to_csgrs(base);
    let b = mesh_to_csgrs(tool);

    let result = catch_unwind(AssertUnwindSafe(|| match op {
        BooleanOp::Union => a.union(&b),
        BooleanOp::Subtract => a.difference(&b),
        BooleanOp::Intersect => a.intersection(&b),
    }))
    .map_err(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        CompositionError::SolverPanicked(message)
    })?;

    Ok(csgrs_to_mesh(&result))
}

/// Convert our Mesh format to csgrs Mesh format
fn mesh_to_csgrs(mesh: &Mesh) -> csgrs::mesh::Mesh<()> {
    use csgrs::mesh::{polygon::Polygon, vertex::Vertex, Mesh as CSGMesh};
    use std::sync::OnceLock;

    if mesh.is_empty() {
        return CSGMesh {
            polygons: Vec::new(),
            bounding_box: OnceLock::new(),
            metadata: None,
        };
    }

    let mut polygons = Vec::with_capacity(mesh.triangle_count());

    for [v0, v1, v2] in mesh.triangles() {
        // Skip degenerate triangles to avoid NaN propagation
        let face_normal = match (v1 - v0).cross(&(v2 - v0)).try_normalize(DEGENERATE_AREA) {
            Some(n) => n,
            None => continue,
        };

        let vertices = vec![
            Vertex::new(v0, face_normal),
            Vertex::new(v1, face_normal),
            Vertex::new(v2, face_normal),
        ];

        polygons.push(Polygon::new(vertices, None));
    }

    CSGMesh::from_polygons(&polygons, None)
}

/// Convert csgrs Mesh format back to our Mesh format.
///
/// Solver polygons are convex and planar, so each one becomes a fan.
fn csgrs_to_mesh(csg_mesh: &csgrs::mesh::Mesh<()>) -> Mesh {
    let mut mesh = Mesh::new();

    for polygon in &csg_mesh.polygons {
        let points: Vec<Point3<f64>> = polygon
            .vertices
            .iter()
            .map(|v| Point3::new(v.pos[0], v.pos[1], v.pos[2]))
            .collect();
        if points.len() < 3 {
            continue;
        }

        let fan_cross = |i: usize| (points[i] - points[0]).cross(&(points[i + 1] - points[0]));
        let area = (1..points.len() - 1).fold(Vector3::zeros(), |acc, i| acc + fan_cross(i));
        let Some(mut normal) = area.try_normalize(DEGENERATE_AREA) else {
            continue;
        };

        // Keep the winding the solver's plane normal asks for
        let plane = polygon.vertices[0].normal;
        let plane = Vector3::new(plane[0], plane[1], plane[2]);
        let flip = plane.iter().all(|c| c.is_finite()) && plane.dot(&normal) < 0.0;
        if flip {
            normal = -normal;
        }

        let base_idx = mesh.vertex_count() as u32;
        for p in &points {
            mesh.add_vertex(*p, normal);
        }
        for i in 1..points.len() - 1 {
            if fan_cross(i).norm() <= DEGENERATE_AREA {
                continue;
            }
            let (b, c) = if flip { (i + 1, i) } else { (i, i + 1) };
            mesh.add_triangle(base_idx, base_idx + b as u32, base_idx + c as u32);
        }
    }

    mesh
}

/// Counts of boolean work done during one generation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositionReport {
    /// Operations handed to `combine`
    pub attempted: usize,
    /// Operations that fell back to their base
    pub failed: usize,
    /// Unions resolved by a plain merge of disjoint meshes
    pub merged_without_solver: usize,
    /// One line per fallback: `label: op: reason`
    pub failures: Vec<String>,
}

impl CompositionReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// Applies the assembly fallback policy and keeps a tally of what happened
#[derive(Debug, Default)]
pub struct Compositor {
    report: CompositionReport,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict boolean that still counts toward the report
    pub fn combine(
        &mut self,
        base: &Solid,
        tool: &Solid,
        op: BooleanOp,
    ) -> Result<Solid, CompositionError> {
        self.report.attempted += 1;
        combine(base, tool, op)
    }

    /// Boolean that returns `base` unchanged when the operation fails.
    ///
    /// Used for cosmetic features where a failed cut should degrade one part
    /// rather than abort the run.
    pub fn combine_or_base(&mut self, base: Solid, tool: &Solid, op: BooleanOp, label: &str) -> Solid {
        match self.combine(&base, tool, op) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(part = label, op = %op, error = %err, "boolean failed, keeping base");
                self.report.failed += 1;
                self.report.failures.push(format!("{}: {}: {}", label, op, err));
                base
            }
        }
    }

    /// Left-fold union of `tools` into `base`, falling back per step.
    ///
    /// Tools whose bounds miss the accumulated solid are merged directly.
    pub fn union_all(&mut self, base: Solid, tools: &[Solid], label: &str) -> Solid {
        let mut acc = base;
        let mut acc_bounds = acc.bounds();

        for tool in tools {
            let tool_mesh = tool.world_mesh();
            if tool_mesh.is_empty() || !tool_mesh.is_finite() {
                acc = self.combine_or_base(acc, tool, BooleanOp::Union, label);
                continue;
            }

            let tool_bounds = tool_mesh.bounds();
            if !acc_bounds.overlaps(&tool_bounds) {
                let mut merged = acc.world_mesh();
                merged.merge(&tool_mesh);
                acc = with_base_tag(merged, &acc);
                self.report.merged_without_solver += 1;
            } else {
                acc = self.combine_or_base(acc, tool, BooleanOp::Union, label);
            }
            acc_bounds = acc.bounds();
        }

        acc
    }

    pub fn report(&self) -> &CompositionReport {
        &self.report
    }

    pub fn into_report(self) -> CompositionReport {
        self.report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::cuboid;
    use approx::assert_relative_eq;

    fn poisoned() -> Solid {
        let mut mesh = cuboid(1.0, 1.0, 1.0).world_mesh();
        mesh.positions[0] = f32::NAN;
        Solid::new(mesh)
    }

    #[test]
    fn test_subtract_overlapping_boxes() {
        let base = cuboid(2.0, 2.0, 2.0);
        let tool = cuboid(1.0, 1.0, 4.0);
        let result = combine(&base, &tool, BooleanOp::Subtract).unwrap();
        // The tool runs through the cube, removing a 1x1x2 core
        assert_relative_eq!(result.world_mesh().signed_volume(), 8.0 - 2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_union_overlapping_boxes() {
        let base = cuboid(2.0, 2.0, 2.0);
        let tool = cuboid(2.0, 2.0, 2.0).translated(Vector3::new(1.0, 0.0, 0.0));
        let result = combine(&base, &tool, BooleanOp::Union).unwrap();
        assert_relative_eq!(result.world_mesh().signed_volume(), 12.0, epsilon = 1e-3);
        assert_relative_eq!(result.bounds().width(), 3.0, epsilon = 1e-5);
    }

    #[test]
    fn test_intersect_disjoint_is_empty() {
        let base = cuboid(1.0, 1.0, 1.0);
        let tool = cuboid(1.0, 1.0, 1.0).translated(Vector3::new(5.0, 0.0, 0.0));
        let result = combine(&base, &tool, BooleanOp::Intersect).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_subtract_disjoint_keeps_base() {
        let base = cuboid(1.0, 1.0, 1.0);
        let tool = cuboid(1.0, 1.0, 1.0).translated(Vector3::new(5.0, 0.0, 0.0));
        let result = combine(&base, &tool, BooleanOp::Subtract).unwrap();
        assert_eq!(result.triangle_count(), 12);
    }

    #[test]
    fn test_non_finite_tool_is_rejected() {
        let base = cuboid(1.0, 1.0, 1.0);
        let err = combine(&base, &poisoned(), BooleanOp::Subtract).unwrap_err();
        assert_eq!(err, CompositionError::NonFiniteGeometry(Operand::Tool));
    }

    #[test]
    fn test_empty_operand_is_rejected() {
        let base = cuboid(1.0, 1.0, 1.0);
        let err = combine(&base, &Solid::new(Mesh::new()), BooleanOp::Union).unwrap_err();
        assert_eq!(err, CompositionError::EmptyOperand(Operand::Tool));
    }

    #[test]
    fn test_result_inherits_base_tag() {
        let base = cuboid(2.0, 2.0, 2.0).with_tag("housing");
        let tool = cuboid(1.0, 1.0, 4.0).with_tag("bore");
        let result = combine(&base, &tool, BooleanOp::Subtract).unwrap();
        assert_eq!(result.tag(), Some("housing"));
    }

    #[test]
    fn test_volume_bounds_per_operator() {
        // A subtract that grows the base is rejected
        assert!(check_volume(BooleanOp::Subtract, 24.0, 1.5, 23.0).is_ok());
        assert!(check_volume(BooleanOp::Subtract, 24.0, 1.5, 35.0).is_err());
        assert!(check_volume(BooleanOp::Subtract, 24.0, 1.5, 15.7).is_err());

        assert!(check_volume(BooleanOp::Union, 10.0, 4.0, 12.0).is_ok());
        assert!(check_volume(BooleanOp::Union, 10.0, 4.0, 9.0).is_err());
        assert!(check_volume(BooleanOp::Union, 10.0, 4.0, 15.0).is_err());

        assert!(check_volume(BooleanOp::Intersect, 10.0, 4.0, 3.0).is_ok());
        assert!(check_volume(BooleanOp::Intersect, 10.0, 4.0, 5.0).is_err());
    }

    #[test]
    fn test_volume_bounds_allow_rounding() {
        let exact = 24.0 - 1.5;
        assert!(check_volume(BooleanOp::Subtract, 24.0, 1.5, exact - 1e-3).is_ok());
        assert!(check_volume(BooleanOp::Subtract, 24.0, 1.5, 24.0 + 1e-3).is_ok());
    }

    #[test]
    fn test_csgrs_polygons_become_fans() {
        let cube = mesh_to_csgrs(&cuboid(2.0, 2.0, 2.0).world_mesh());
        let mesh = csgrs_to_mesh(&cube);
        assert_eq!(mesh.triangle_count(), 12);
        assert_relative_eq!(mesh.signed_volume(), 8.0, epsilon = 1e-4);
    }

    #[test]
    fn test_union_all_merges_disjoint_tools() {
        let base = cuboid(1.0, 1.0, 1.0);
        let tools: Vec<Solid> = (1..4)
            .map(|i| cuboid(1.0, 1.0, 1.0).translated(Vector3::new(2.0 * i as f64, 0.0, 0.0)))
            .collect();
        let mut compositor = Compositor::new();
        let result = compositor.union_all(base, &tools, "test");
        assert_eq!(result.triangle_count(), 48);
        assert_eq!(compositor.report().merged_without_solver, 3);
        assert_eq!(compositor.report().attempted, 0);
    }
}
