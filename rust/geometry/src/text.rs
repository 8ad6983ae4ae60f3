// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Text layout: lines of characters to positioned glyph solids
//!
//! Each glyph is extruded from its outline, anchored at its left edge and
//! centered on its own vertical extents, then placed on a line. Lines are
//! stacked as a block centered on the origin and aligned against the widest
//! line.

use crate::error::{Error, Result};
use crate::extrusion::extrude_profile;
use crate::mesh::{Bounds, Mesh};
use crate::outline::OutlineProvider;
use crate::solid::Solid;
use nalgebra::{Matrix4, Vector3};

/// Advance of a space, as a fraction of text height
pub const SPACE_ADVANCE: f64 = 0.30;
/// Gap between consecutive characters, as a fraction of text height
pub const CHARACTER_GAP: f64 = 0.03;
/// Tag carried by glyph solids
pub const GLYPH_TAG: &str = "glyph";

/// Horizontal alignment of one line against the widest line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

/// One line of input text
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextLine {
    pub text: String,
    pub alignment: Alignment,
}

impl TextLine {
    pub fn new(text: impl Into<String>, alignment: Alignment) -> Self {
        Self {
            text: text.into(),
            alignment,
        }
    }

    pub fn centered(text: impl Into<String>) -> Self {
        Self::new(text, Alignment::Center)
    }
}

/// Whether a (normalized) character survives normalization
#[inline]
pub fn is_allowed_char(ch: char) -> bool {
    ch.is_ascii_uppercase() || ch.is_ascii_digit() || matches!(ch, ' ' | '.' | '#' | '-')
}

/// Uppercase and strip everything outside `A-Z 0-9 space . # -`
pub fn normalize_text(text: &str) -> String {
    text.chars()
        .flat_map(char::to_uppercase)
        .filter(|ch| is_allowed_char(*ch))
        .collect()
}

/// True when at least one line has a character that would draw geometry
pub fn has_drawable_chars(lines: &[TextLine]) -> bool {
    lines
        .iter()
        .any(|line| normalize_text(&line.text).chars().any(|ch| ch != ' '))
}

/// One extruded, positioned character
#[derive(Debug, Clone)]
pub struct GlyphSolid {
    pub ch: char,
    /// Line index in the stack
    pub line: usize,
    /// Measured width before layout
    pub advance: f64,
    /// Final placed solid
    pub solid: Solid,
}

impl GlyphSolid {
    /// World-space centroid of the glyph's bounding box
    pub fn center(&self) -> nalgebra::Point3<f64> {
        self.solid.bounds().center()
    }
}

/// Glyphs of one line plus its measured width
#[derive(Debug, Clone)]
pub struct LineLayout {
    pub glyphs: Vec<GlyphSolid>,
    pub width: f64,
    pub alignment: Alignment,
}

/// Result of laying out all lines
#[derive(Debug, Clone)]
pub struct TextLayout {
    pub lines: Vec<LineLayout>,
    pub max_width: f64,
    pub total_height: f64,
}

impl TextLayout {
    /// Glyphs in line-major, left-to-right order
    pub fn glyphs(&self) -> impl Iterator<Item = &GlyphSolid> {
        self.lines.iter().flat_map(|line| line.glyphs.iter())
    }

    pub fn glyph_count(&self) -> usize {
        self.lines.iter().map(|line| line.glyphs.len()).sum()
    }

    /// Flat list of positioned solids in output order
    pub fn into_solids(self) -> Vec<Solid> {
        self.lines
            .into_iter()
            .flat_map(|line| line.glyphs.into_iter().map(|g| g.solid))
            .collect()
    }

    /// Combined world bounds of every glyph
    pub fn bounds(&self) -> Bounds {
        self.glyphs()
            .fold(Bounds::empty(), |acc, g| acc.union(&g.solid.bounds()))
    }
}

/// A glyph extruded and re-centered, not yet placed
struct ShapedGlyph {
    ch: char,
    mesh: Mesh,
    width: f64,
}

enum Shaped {
    Space,
    Glyph(ShapedGlyph),
}

fn shape_char(
    ch: char,
    text_height: f64,
    text_depth: f64,
    provider: &dyn OutlineProvider,
) -> Option<Shaped> {
    if ch == ' ' {
        return Some(Shaped::Space);
    }

    let outline = match provider.outline(ch, text_height) {
        Some(outline) => outline,
        None => {
            tracing::warn!(ch = %ch, "no outline for character, skipping");
            return None;
        }
    };

    let mut mesh = Mesh::new();
    for profile in &outline.profiles {
        match extrude_profile(profile, text_depth) {
            Ok(part) => mesh.merge(&part),
            Err(err) => tracing::warn!(ch = %ch, error = %err, "glyph contour skipped"),
        }
    }
    if mesh.is_empty() {
        tracing::warn!(ch = %ch, "glyph produced no geometry, skipping");
        return None;
    }

    // Left edge at x = 0, vertical center on the midpoint of the extents
    let bounds = mesh.bounds();
    let recenter = Matrix4::new_translation(&Vector3::new(
        -bounds.min.x,
        -(bounds.min.y + bounds.max.y) / 2.0,
        0.0,
    ));
    mesh.apply_transform(&recenter);

    Some(Shaped::Glyph(ShapedGlyph {
        ch,
        mesh,
        width: bounds.width(),
    }))
}

/// Lay out `lines` into positioned glyph solids.
///
/// Lines that normalize to nothing keep their row in the stack but carry no
/// glyphs. Characters the provider cannot draw are skipped.
pub fn layout(
    lines: &[TextLine],
    text_height: f64,
    text_depth: f64,
    line_spacing: f64,
    provider: &dyn OutlineProvider,
) -> Result<TextLayout> {
    if !(text_height.is_finite() && text_height > 0.0) {
        return Err(Error::InvalidExtrusion(format!(
            "Text height must be positive, got {}",
            text_height
        )));
    }
    if !(text_depth.is_finite() && text_depth > 0.0) {
        return Err(Error::InvalidExtrusion(format!(
            "Text depth must be positive, got {}",
            text_depth
        )));
    }
    let line_spacing = if line_spacing.is_finite() { line_spacing } else { 0.0 };

    let space = SPACE_ADVANCE * text_height;
    let gap = CHARACTER_GAP * text_height;

    // Shape every line and measure it
    let mut shaped_lines = Vec::with_capacity(lines.len());
    for line in lines {
        let shaped: Vec<Shaped> = normalize_text(&line.text)
            .chars()
            .filter_map(|ch| shape_char(ch, text_height, text_depth, provider))
            .collect();
        let advances: f64 = shaped
            .iter()
            .map(|s| match s {
                Shaped::Space => space,
                Shaped::Glyph(g) => g.width,
            })
            .sum();
        let width = if shaped.is_empty() {
            0.0
        } else {
            advances + (shaped.len() - 1) as f64 * gap
        };
        shaped_lines.push((shaped, width, line.alignment));
    }

    let n = lines.len();
    let max_width = shaped_lines
        .iter()
        .map(|(_, width, _)| *width)
        .fold(0.0, f64::max);
    let total_height = if n == 0 {
        0.0
    } else {
        n as f64 * text_height + (n - 1) as f64 * line_spacing
    };

    let mut out = Vec::with_capacity(n);
    for (index, (shaped, width, alignment)) in shaped_lines.into_iter().enumerate() {
        let y = total_height / 2.0 - text_height / 2.0 - index as f64 * (text_height + line_spacing);
        let start_x = match alignment {
            Alignment::Left => -max_width / 2.0,
            Alignment::Right => max_width / 2.0 - width,
            Alignment::Center => -width / 2.0,
        };

        let mut cursor = start_x;
        let mut glyphs = Vec::new();
        for item in shaped {
            match item {
                Shaped::Space => cursor += space + gap,
                Shaped::Glyph(glyph) => {
                    let solid = Solid::new(glyph.mesh)
                        .with_tag(GLYPH_TAG)
                        .translated(Vector3::new(cursor, y, 0.0));
                    cursor += glyph.width + gap;
                    glyphs.push(GlyphSolid {
                        ch: glyph.ch,
                        line: index,
                        advance: glyph.width,
                        solid,
                    });
                }
            }
        }

        out.push(LineLayout {
            glyphs,
            width,
            alignment,
        });
    }

    tracing::debug!(
        lines = n,
        glyphs = out.iter().map(|l| l.glyphs.len()).sum::<usize>(),
        max_width,
        total_height,
        "text laid out"
    );

    Ok(TextLayout {
        lines: out,
        max_width,
        total_height,
    })
}
