// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Assembly builder: turns laid-out glyphs into the physical parts.
//!
//! Frame: the sign face lies in XY with +Z toward the viewer. The face plate
//! spans `z ∈ [0, plate_thickness]` with the glyphs standing on it, the
//! housing spans `z ∈ [-housing_depth, 0]`, and the cleats hang behind the
//! housing.
//!
//! Every cut or attachment on a part goes through
//! [`Compositor::combine_or_base`], so a failed boolean leaves that part
//! without the feature instead of aborting the run.

use crate::assembly::{Assembly, PartName};
use crate::error::Result;
use crate::params::{hardware, Dimensions, MountType, Parameters, ReflectorStyle};
use signlite_geometry::bool2d::{point_in_contour, shell_2d};
use signlite_geometry::{
    build_profile, cuboid, cylinder, extrude, mm, offset_inward, wedge, BevelFace, BooleanOp,
    Bounds, Compositor, GlyphSolid, Mesh, Point2, Profile2D, ProfileShape, Solid, Vector2,
    Vector3, CYLINDER_SEGMENTS,
};
use smallvec::SmallVec;
use std::f64::consts::FRAC_PI_2;

/// Steps used when pulling a mounting point inside a curved outline
const HOLE_PULL_STEPS: usize = 20;

/// Outline shared by the face plate and the housing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub shape: ProfileShape,
    pub center: Point2<f64>,
    pub width: f64,
    pub height: f64,
    pub corner_radius: f64,
}

impl Footprint {
    /// Glyph block bounds grown by `padding` on every side
    pub fn around(block: &Bounds, padding: f64, shape: ProfileShape, corner_radius: f64) -> Self {
        let center = block.center();
        Self {
            shape,
            center: Point2::new(center.x, center.y),
            width: block.width() + 2.0 * padding,
            height: block.height() + 2.0 * padding,
            corner_radius,
        }
    }

    pub fn outer(&self) -> Profile2D {
        self.place(build_profile(
            self.shape,
            self.width,
            self.height,
            self.corner_radius,
        ))
    }

    /// Concentric outline `thickness` inside the outer one
    pub fn inset(&self, thickness: f64) -> Profile2D {
        self.place(offset_inward(
            self.shape,
            self.width,
            self.height,
            self.corner_radius,
            thickness,
        ))
    }

    pub fn left(&self) -> f64 {
        self.center.x - self.width / 2.0
    }

    pub fn right(&self) -> f64 {
        self.center.x + self.width / 2.0
    }

    pub fn top(&self) -> f64 {
        self.center.y + self.height / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.center.y - self.height / 2.0
    }

    fn place(&self, profile: Profile2D) -> Profile2D {
        profile.scaled_translated(1.0, Vector2::new(self.center.x, self.center.y))
    }
}

/// Extrude several profiles into one solid spanning `[-depth/2, depth/2]`
fn extrude_all(profiles: &[Profile2D], depth: f64) -> Result<Solid> {
    let mut mesh = Mesh::new();
    for profile in profiles {
        mesh.merge(&extrude(profile, depth)?.into_world_mesh());
    }
    Ok(Solid::new(mesh))
}

/// Builds every part of one sign from its laid-out glyphs
pub struct AssemblyBuilder<'a> {
    params: &'a Parameters,
    dims: Dimensions,
    compositor: &'a mut Compositor,
}

impl<'a> AssemblyBuilder<'a> {
    pub fn new(params: &'a Parameters, compositor: &'a mut Compositor) -> Self {
        Self {
            params,
            dims: Dimensions::from_parameters(params),
            compositor,
        }
    }

    /// Build the assembly. `glyphs` come straight from the layout engine,
    /// centered on `z = 0`.
    pub fn build(mut self, glyphs: Vec<GlyphSolid>) -> Result<Assembly> {
        let mut assembly = Assembly::new();

        if !self.params.housing {
            for (index, glyph) in glyphs.into_iter().enumerate() {
                let solid = glyph.solid.with_tag("letter");
                assembly.insert(PartName::Letter { index, ch: glyph.ch }, solid);
            }
            tracing::debug!(parts = assembly.len(), "standalone letters built");
            return Ok(assembly);
        }

        let block = glyphs
            .iter()
            .fold(Bounds::empty(), |acc, g| acc.union(&g.solid.bounds()));
        let footprint = Footprint::around(
            &block,
            self.dims.padding,
            self.params.backplate_shape.into(),
            self.dims.corner_radius,
        );

        // Stand the glyphs on the face plate, sunk slightly into it
        let lift = self.dims.plate_thickness + self.dims.text_depth / 2.0 - mm(hardware::GLYPH_EMBED);
        let glyphs: Vec<GlyphSolid> = glyphs
            .into_iter()
            .map(|g| GlyphSolid {
                solid: g.solid.translated(Vector3::new(0.0, 0.0, lift)),
                ..g
            })
            .collect();

        assembly.insert(PartName::FacePlate, self.face_plate(&footprint, &glyphs)?);
        assembly.insert(PartName::BackPlate, self.back_plate(&footprint, &block, &glyphs)?);
        if self.params.mount_type == MountType::FrenchCleat {
            assembly.insert(PartName::WallCleat, self.wall_cleat(&footprint)?);
        }
        assembly.insert(PartName::Diffuser, self.diffuser(&footprint)?);

        tracing::debug!(
            parts = assembly.len(),
            triangles = assembly.triangle_count(),
            width_mm = footprint.width * signlite_geometry::MM_PER_UNIT,
            height_mm = footprint.height * signlite_geometry::MM_PER_UNIT,
            "assembly built"
        );
        Ok(assembly)
    }

    /// Plate under the text, fused with every glyph
    fn face_plate(&mut self, footprint: &Footprint, glyphs: &[GlyphSolid]) -> Result<Solid> {
        let t = self.dims.plate_thickness;
        let plate = extrude(&footprint.outer(), t)?
            .translated(Vector3::new(0.0, 0.0, t / 2.0))
            .with_tag("face_plate");

        let solids: Vec<Solid> = glyphs.iter().map(|g| g.solid.clone()).collect();
        Ok(self.compositor.union_all(plate, &solids, "face_plate"))
    }

    /// Housing: back panel plus rim, with channels, bores and mounting
    fn back_plate(
        &mut self,
        footprint: &Footprint,
        block: &Bounds,
        glyphs: &[GlyphSolid],
    ) -> Result<Solid> {
        let d = self.dims;
        let depth = d.housing_depth;
        let panel_t = d.panel_thickness();
        let floor_z = -depth + panel_t;

        let tag = match self.params.reflector {
            ReflectorStyle::WhiteBacking => "back_plate:white_backing",
            _ => "back_plate",
        };
        let panel = extrude(&footprint.outer(), panel_t)?
            .translated(Vector3::new(0.0, 0.0, -depth + panel_t / 2.0))
            .with_tag(tag);

        // Rim overlaps the upper half of the panel so the union has shared volume
        let rim_depth = depth - panel_t / 2.0;
        let rim = extrude_all(&shell_2d(&footprint.outer(), &footprint.inset(d.wall_thickness)), rim_depth)?
            .translated(Vector3::new(0.0, 0.0, -rim_depth / 2.0));
        let mut housing = self
            .compositor
            .combine_or_base(panel, &rim, BooleanOp::Union, "back_plate");

        // LED channel behind each glyph
        for glyph in glyphs {
            let center = glyph.center();
            let channel = cuboid(
                glyph.advance.max(d.channel_width),
                d.channel_width,
                2.0 * d.channel_depth,
            )
            .translated(Vector3::new(center.x, center.y, floor_z));
            housing = self.compositor.combine_or_base(
                housing,
                &channel,
                BooleanOp::Subtract,
                "back_plate: led channel",
            );
        }

        // Wiring channel along the bottom of the cavity floor
        let inner_width = footprint.width - 2.0 * d.wall_thickness;
        let wiring_y = footprint.bottom() + d.wall_thickness + d.channel_width;
        let wiring_length = self.chord_at(footprint, wiring_y, inner_width * hardware::WIRING_LENGTH_RATIO);
        let wiring = cuboid(wiring_length, d.channel_width, 2.0 * d.channel_depth)
            .translated(Vector3::new(footprint.center.x, wiring_y, floor_z));
        housing = self
            .compositor
            .combine_or_base(housing, &wiring, BooleanOp::Subtract, "back_plate: wiring channel");

        // Cable gland through the bottom wall, mid-cavity
        let gland = cylinder(
            mm(hardware::CABLE_GLAND_DIAMETER) / 2.0,
            4.0 * d.wall_thickness,
            CYLINDER_SEGMENTS,
        )
        .rotated_x(FRAC_PI_2)
        .translated(Vector3::new(
            footprint.center.x,
            footprint.bottom() + d.wall_thickness / 2.0,
            floor_z / 2.0,
        ));
        housing = self
            .compositor
            .combine_or_base(housing, &gland, BooleanOp::Subtract, "back_plate: cable gland");

        if self.params.weather_seal {
            let third = d.wall_thickness / 3.0;
            let groove_depth = mm(hardware::SEAL_GROOVE_DEPTH);
            let groove = extrude_all(&shell_2d(&footprint.inset(third), &footprint.inset(2.0 * third)), 2.0 * groove_depth)?;
            housing = self
                .compositor
                .combine_or_base(housing, &groove, BooleanOp::Subtract, "back_plate: seal groove");
        }

        if self.params.reflector == ReflectorStyle::TapePocket {
            let center = block.center();
            let pocket = cuboid(block.width(), block.height(), 2.0 * mm(hardware::TAPE_POCKET_DEPTH))
                .translated(Vector3::new(center.x, center.y, floor_z));
            housing = self
                .compositor
                .combine_or_base(housing, &pocket, BooleanOp::Subtract, "back_plate: tape pocket");
        }

        housing = match self.params.mount_type {
            MountType::FrenchCleat => {
                let cleat = self.sign_cleat(footprint)?;
                self.compositor
                    .combine_or_base(housing, &cleat, BooleanOp::Union, "back_plate: french cleat")
            }
            mount => self.cut_mounting_holes(housing, footprint, mount),
        };

        Ok(housing)
    }

    /// Width of the cavity at height `y`, capped at `max`
    fn chord_at(&self, footprint: &Footprint, y: f64, max: f64) -> f64 {
        if footprint.shape != ProfileShape::Oval {
            return max;
        }
        let a = footprint.width / 2.0 - self.dims.wall_thickness;
        let b = footprint.height / 2.0 - self.dims.wall_thickness;
        if a <= 0.0 || b <= 0.0 {
            return max;
        }
        let dy = ((y - footprint.center.y) / b).clamp(-1.0, 1.0);
        let chord = 2.0 * a * (1.0 - dy * dy).sqrt() - self.dims.channel_width;
        chord.clamp(self.dims.channel_width, max)
    }

    /// Hole centers, inset from the corners and kept inside curved outlines
    pub fn mounting_positions(&self, footprint: &Footprint, mount: MountType) -> SmallVec<[Point2<f64>; 4]> {
        let inset = self.dims.wall_thickness + self.dims.hole_diameter;
        let (left, right) = (footprint.left() + inset, footprint.right() - inset);
        let (top, bottom) = (footprint.top() - inset, footprint.bottom() + inset);

        let mut corners: SmallVec<[Point2<f64>; 4]> = SmallVec::new();
        match mount {
            MountType::TwoHole | MountType::Keyhole => {
                corners.push(Point2::new(left, top));
                corners.push(Point2::new(right, top));
            }
            MountType::FourHole => {
                corners.push(Point2::new(left, top));
                corners.push(Point2::new(right, top));
                corners.push(Point2::new(left, bottom));
                corners.push(Point2::new(right, bottom));
            }
            MountType::None | MountType::FrenchCleat => {}
        }

        // Pull each point toward the center until the hole clears the wall
        let ring = footprint
            .inset(self.dims.wall_thickness + self.dims.hole_diameter / 2.0)
            .outer;
        corners
            .into_iter()
            .map(|corner| {
                (0..=HOLE_PULL_STEPS)
                    .map(|step| {
                        let t = step as f64 / HOLE_PULL_STEPS as f64;
                        corner + (footprint.center - corner) * t
                    })
                    .find(|p| point_in_contour(p, &ring))
                    .unwrap_or(footprint.center)
            })
            .collect()
    }

    fn cut_mounting_holes(&mut self, mut housing: Solid, footprint: &Footprint, mount: MountType) -> Solid {
        let d = self.dims;
        let panel_t = d.panel_thickness();
        let z = -d.housing_depth + panel_t / 2.0;
        let bore_length = 2.0 * panel_t;

        for p in self.mounting_positions(footprint, mount) {
            match mount {
                MountType::Keyhole => {
                    let head = cylinder(d.hole_diameter, bore_length, CYLINDER_SEGMENTS)
                        .translated(Vector3::new(p.x, p.y, z));
                    housing = self
                        .compositor
                        .combine_or_base(housing, &head, BooleanOp::Subtract, "back_plate: keyhole");
                    let slot_length = 1.5 * d.hole_diameter;
                    let slot = cuboid(d.hole_diameter, slot_length, bore_length)
                        .translated(Vector3::new(p.x, p.y + slot_length / 2.0, z));
                    housing = self
                        .compositor
                        .combine_or_base(housing, &slot, BooleanOp::Subtract, "back_plate: keyhole slot");
                }
                _ => {
                    let bore = cylinder(d.hole_diameter / 2.0, bore_length, CYLINDER_SEGMENTS)
                        .translated(Vector3::new(p.x, p.y, z));
                    housing = self
                        .compositor
                        .combine_or_base(housing, &bore, BooleanOp::Subtract, "back_plate: mounting hole");
                }
            }
        }
        housing
    }

    fn cleat_size(&self, footprint: &Footprint) -> (f64, f64, f64) {
        (
            footprint.width * hardware::CLEAT_WIDTH_RATIO,
            mm(hardware::CLEAT_HEIGHT),
            mm(hardware::CLEAT_THICKNESS),
        )
    }

    /// Center of the housing-side cleat
    fn sign_cleat_center(&self, footprint: &Footprint) -> Vector3<f64> {
        let (_, height, thickness) = self.cleat_size(footprint);
        Vector3::new(
            footprint.center.x,
            footprint.top() - self.dims.wall_thickness - height / 2.0,
            -self.dims.housing_depth - thickness / 2.0 + mm(hardware::GLYPH_EMBED),
        )
    }

    /// Cleat fixed to the housing back, bevel facing down
    fn sign_cleat(&self, footprint: &Footprint) -> Result<Solid> {
        let (width, height, thickness) = self.cleat_size(footprint);
        Ok(wedge(width, height, thickness, BevelFace::Bottom)?.translated(self.sign_cleat_center(footprint)))
    }

    /// Companion cleat for the wall, placed mated under the sign cleat
    fn wall_cleat(&mut self, footprint: &Footprint) -> Result<Solid> {
        let (width, height, thickness) = self.cleat_size(footprint);
        let sign = self.sign_cleat_center(footprint);
        // Bevel planes coincide when the wall cleat sits `height - cut` lower
        let cut = thickness.min(height * 0.9);
        let center = Vector3::new(sign.x, sign.y - height + cut, sign.z);

        let mut cleat = wedge(width, height, thickness, BevelFace::Top)?
            .translated(center)
            .with_tag("wall_cleat");

        let screw_radius = mm(hardware::CLEAT_SCREW_DIAMETER) / 2.0;
        for dx in [-width / 4.0, width / 4.0] {
            let bore = cylinder(screw_radius, 2.0 * thickness, CYLINDER_SEGMENTS)
                .translated(center + Vector3::new(dx, -height / 4.0, 0.0));
            cleat = self
                .compositor
                .combine_or_base(cleat, &bore, BooleanOp::Subtract, "wall_cleat: screw bore");
        }
        Ok(cleat)
    }

    /// Loose cover panel just behind the face plate
    fn diffuser(&self, footprint: &Footprint) -> Result<Solid> {
        let thickness = mm(hardware::DIFFUSER_THICKNESS);
        let profile = footprint.inset(self.dims.wall_thickness + mm(hardware::DIFFUSER_CLEARANCE));
        Ok(extrude(&profile, thickness)?
            .translated(Vector3::new(0.0, 0.0, -thickness / 2.0))
            .with_tag("diffuser"))
    }
}
