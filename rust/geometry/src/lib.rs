// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SignLite Geometry
//!
//! Profiles, primitives, boolean composition and text layout for parametric
//! signs, built on earcutr triangulation, i_overlay 2D booleans, csgrs 3D
//! booleans and nalgebra transforms.
//!
//! All geometry is built in model units; one unit is [`MM_PER_UNIT`]
//! millimeters.

pub mod bool2d;
pub mod csg;
pub mod error;
pub mod extrusion;
pub mod mesh;
pub mod outline;
pub mod primitives;
pub mod profile;
pub mod solid;
pub mod text;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector2, Vector3};

pub use csg::{combine, BooleanOp, CompositionError, CompositionReport, Compositor};
pub use error::{Error, Result};
pub use extrusion::extrude_profile;
pub use mesh::{Bounds, Mesh};
pub use outline::{CachedOutlines, GlyphOutline, OutlineProvider, TrueTypeOutlines};
pub use primitives::{cuboid, cylinder, extrude, wedge, BevelFace, CYLINDER_SEGMENTS};
pub use profile::{build_profile, effective_corner_radius, offset_inward, Profile2D, ProfileShape};
pub use solid::Solid;
pub use text::{layout, normalize_text, Alignment, GlyphSolid, LineLayout, TextLayout, TextLine};

/// Millimeters per model unit
pub const MM_PER_UNIT: f64 = 1000.0;

/// Convert millimeters to model units
#[inline]
pub fn mm(value: f64) -> f64 {
    value / MM_PER_UNIT
}
