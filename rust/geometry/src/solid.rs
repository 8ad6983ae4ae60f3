// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solids: a local mesh placed in the world by a transform

use crate::mesh::{Bounds, Mesh};
use nalgebra::{Matrix4, Vector3};

/// A triangle mesh with a world transform.
///
/// The stored mesh is never modified by placement; [`Solid::world_mesh`]
/// realizes the transform into a fresh mesh on demand.
#[derive(Debug, Clone)]
pub struct Solid {
    mesh: Mesh,
    transform: Matrix4<f64>,
    tag: Option<String>,
}

impl Solid {
    /// Solid with identity placement
    pub fn new(mesh: Mesh) -> Self {
        Self {
            mesh,
            transform: Matrix4::identity(),
            tag: None,
        }
    }

    /// Attach a material/usage tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Mesh in local coordinates
    pub fn local_mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn transform(&self) -> &Matrix4<f64> {
        &self.transform
    }

    /// Mesh with the world transform applied
    pub fn world_mesh(&self) -> Mesh {
        if self.transform == Matrix4::identity() {
            self.mesh.clone()
        } else {
            self.mesh.transformed(&self.transform)
        }
    }

    /// World-space bounds
    pub fn bounds(&self) -> Bounds {
        self.world_mesh().bounds()
    }

    pub fn triangle_count(&self) -> usize {
        self.mesh.triangle_count()
    }

    pub fn is_empty(&self) -> bool {
        self.mesh.is_empty()
    }

    /// Pre-multiply the placement by `matrix`
    pub fn transformed(mut self, matrix: &Matrix4<f64>) -> Self {
        self.transform = matrix * self.transform;
        self
    }

    pub fn translated(self, offset: Vector3<f64>) -> Self {
        self.transformed(&Matrix4::new_translation(&offset))
    }

    pub fn rotated_x(self, angle: f64) -> Self {
        self.transformed(&Matrix4::from_axis_angle(&Vector3::x_axis(), angle))
    }

    pub fn rotated_z(self, angle: f64) -> Self {
        self.transformed(&Matrix4::from_axis_angle(&Vector3::z_axis(), angle))
    }

    /// Bake the transform into the mesh, leaving an identity placement
    pub fn realized(&self) -> Solid {
        Solid {
            mesh: self.world_mesh(),
            transform: Matrix4::identity(),
            tag: self.tag.clone(),
        }
    }

    /// Consume the solid and return its world mesh
    pub fn into_world_mesh(self) -> Mesh {
        if self.transform == Matrix4::identity() {
            self.mesh
        } else {
            self.mesh.transformed(&self.transform)
        }
    }
}

impl From<Mesh> for Solid {
    fn from(mesh: Mesh) -> Self {
        Solid::new(mesh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::cuboid;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_translation_does_not_touch_local_mesh() {
        let solid = cuboid(1.0, 1.0, 1.0).translated(Vector3::new(5.0, 0.0, 0.0));
        assert_relative_eq!(solid.local_mesh().bounds().min.x, -0.5);
        assert_relative_eq!(solid.bounds().min.x, 4.5);
    }

    #[test]
    fn test_transforms_compose_in_call_order() {
        // Rotate first, then move
        let solid = cuboid(2.0, 1.0, 1.0)
            .rotated_z(FRAC_PI_2)
            .translated(Vector3::new(0.0, 10.0, 0.0));
        let bounds = solid.bounds();
        assert_relative_eq!(bounds.width(), 1.0, epsilon = 1e-5);
        assert_relative_eq!(bounds.height(), 2.0, epsilon = 1e-5);
        assert_relative_eq!(bounds.center().y, 10.0, epsilon = 1e-5);
    }

    #[test]
    fn test_realized_keeps_tag() {
        let solid = cuboid(1.0, 1.0, 1.0)
            .with_tag("plate")
            .translated(Vector3::new(0.0, 0.0, 1.0));
        let realized = solid.realized();
        assert_eq!(realized.tag(), Some("plate"));
        assert_eq!(realized.transform(), &Matrix4::identity());
        assert_relative_eq!(realized.local_mesh().bounds().min.z, 0.5);
    }
}
