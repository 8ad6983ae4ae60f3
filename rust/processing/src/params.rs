// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sign parameters.
//!
//! Every length is in millimeters. Conversion to model units happens once,
//! in [`Dimensions::from_parameters`], before any geometry is built.

use crate::error::GenerationError;
use serde::{Deserialize, Serialize};
use signlite_geometry::{mm, Alignment, ProfileShape, TextLine};

/// Horizontal alignment of a text line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineAlignment {
    Left,
    #[default]
    Center,
    Right,
}

impl From<LineAlignment> for Alignment {
    fn from(value: LineAlignment) -> Self {
        match value {
            LineAlignment::Left => Alignment::Left,
            LineAlignment::Center => Alignment::Center,
            LineAlignment::Right => Alignment::Right,
        }
    }
}

/// One line of sign text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineSpec {
    pub text: String,
    #[serde(default)]
    pub alignment: LineAlignment,
}

impl LineSpec {
    pub fn new(text: impl Into<String>, alignment: LineAlignment) -> Self {
        Self {
            text: text.into(),
            alignment,
        }
    }
}

/// Outline of the face plate and housing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackplateShape {
    Rectangle,
    #[default]
    RoundedRect,
    Oval,
    Arch,
    AutoContour,
}

impl From<BackplateShape> for ProfileShape {
    fn from(value: BackplateShape) -> Self {
        match value {
            BackplateShape::Rectangle => ProfileShape::Rectangle,
            BackplateShape::RoundedRect => ProfileShape::RoundedRect,
            BackplateShape::Oval => ProfileShape::Oval,
            BackplateShape::Arch => ProfileShape::Arch,
            BackplateShape::AutoContour => ProfileShape::AutoContour,
        }
    }
}

/// LED product the housing channels are cut for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedType {
    #[serde(rename = "strip_5mm")]
    Strip5mm,
    #[default]
    #[serde(rename = "strip_8mm")]
    Strip8mm,
    #[serde(rename = "strip_10mm")]
    Strip10mm,
    #[serde(rename = "neon_6mm")]
    Neon6mm,
    #[serde(rename = "cob_8mm")]
    Cob8mm,
}

/// Cross-section of an LED channel in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelSize {
    pub width: f64,
    pub depth: f64,
}

impl LedType {
    /// Channel width and depth for this LED type
    pub fn channel(self) -> ChannelSize {
        let (width, depth) = match self {
            LedType::Strip5mm => (6.0, 3.0),
            LedType::Strip8mm => (10.0, 4.0),
            LedType::Strip10mm => (12.0, 5.0),
            LedType::Neon6mm => (8.0, 8.0),
            LedType::Cob8mm => (10.0, 3.0),
        };
        ChannelSize { width, depth }
    }
}

/// How the sign attaches to a wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MountType {
    None,
    #[serde(rename = "2hole")]
    TwoHole,
    #[default]
    #[serde(rename = "4hole")]
    FourHole,
    Keyhole,
    FrenchCleat,
}

/// Treatment of the cavity floor behind the letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReflectorStyle {
    #[default]
    None,
    TapePocket,
    WhiteBacking,
}

/// Immutable input of one generation run.
///
/// Missing fields in a JSON document take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    /// Text lines, top to bottom
    pub lines: Vec<LineSpec>,
    /// Glyph height (mm)
    pub text_height: f64,
    /// Glyph extrusion depth (mm)
    pub text_depth: f64,
    /// Margin between the text block and the plate edge (mm)
    pub padding: f64,
    /// Housing wall thickness (mm)
    pub wall_thickness: f64,
    /// Plate corner radius (mm)
    pub corner_radius: f64,
    /// Mounting screw hole diameter (mm)
    pub hole_diameter: f64,
    /// Vertical gap between lines (mm)
    pub line_spacing: f64,
    /// Face plate thickness (mm)
    pub plate_thickness: f64,
    /// Housing depth behind the face plate (mm)
    pub housing_depth: f64,
    /// Uniform factor for the design dimensions
    pub scale: f64,
    pub housing: bool,
    pub led_type: LedType,
    pub backplate_shape: BackplateShape,
    pub mount_type: MountType,
    pub reflector: ReflectorStyle,
    pub weather_seal: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            lines: vec![LineSpec::new("OPEN", LineAlignment::Center)],
            text_height: 60.0,
            text_depth: 8.0,
            padding: 15.0,
            wall_thickness: 3.0,
            corner_radius: 10.0,
            hole_diameter: 5.0,
            line_spacing: 10.0,
            plate_thickness: 3.0,
            housing_depth: 40.0,
            scale: 1.0,
            housing: true,
            led_type: LedType::default(),
            backplate_shape: BackplateShape::default(),
            mount_type: MountType::default(),
            reflector: ReflectorStyle::default(),
            weather_seal: false,
        }
    }
}

impl Parameters {
    /// Parse a JSON document, filling gaps with defaults
    pub fn from_json(json: &str) -> Result<Self, GenerationError> {
        serde_json::from_str(json).map_err(|e| GenerationError::InvalidParameters(e.to_string()))
    }

    /// Single-line parameters with everything else at defaults
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            lines: vec![LineSpec::new(text, LineAlignment::Center)],
            ..Self::default()
        }
    }

    /// Text lines in the form the layout engine takes
    pub fn text_lines(&self) -> Vec<TextLine> {
        self.lines
            .iter()
            .map(|line| TextLine::new(line.text.clone(), line.alignment.into()))
            .collect()
    }

    /// Reject values no geometry can be built from
    pub fn validate(&self) -> Result<(), GenerationError> {
        let positive = [
            ("text_height", self.text_height),
            ("text_depth", self.text_depth),
            ("wall_thickness", self.wall_thickness),
            ("hole_diameter", self.hole_diameter),
            ("plate_thickness", self.plate_thickness),
            ("housing_depth", self.housing_depth),
            ("scale", self.scale),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(GenerationError::InvalidParameters(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        let non_negative = [
            ("padding", self.padding),
            ("corner_radius", self.corner_radius),
            ("line_spacing", self.line_spacing),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(GenerationError::InvalidParameters(format!(
                    "{} must not be negative, got {}",
                    name, value
                )));
            }
        }

        if self.housing {
            let panel = self.wall_thickness + self.led_type.channel().depth;
            if self.housing_depth <= panel {
                return Err(GenerationError::InvalidParameters(format!(
                    "housing_depth {} leaves no cavity behind a {} back panel",
                    self.housing_depth, panel
                )));
            }
        }
        Ok(())
    }
}

/// Fixed hardware dimensions (mm)
pub mod hardware {
    /// Depth the glyphs sink into the face plate
    pub const GLYPH_EMBED: f64 = 0.2;
    pub const CABLE_GLAND_DIAMETER: f64 = 12.5;
    pub const SEAL_GROOVE_DEPTH: f64 = 1.5;
    pub const TAPE_POCKET_DEPTH: f64 = 0.5;
    pub const CLEAT_THICKNESS: f64 = 10.0;
    pub const CLEAT_HEIGHT: f64 = 25.0;
    /// Cleat width as a fraction of the plate width
    pub const CLEAT_WIDTH_RATIO: f64 = 0.6;
    pub const CLEAT_SCREW_DIAMETER: f64 = 4.5;
    pub const DIFFUSER_CLEARANCE: f64 = 0.5;
    pub const DIFFUSER_THICKNESS: f64 = 2.0;
    /// Wiring channel length as a fraction of the inner width
    pub const WIRING_LENGTH_RATIO: f64 = 0.9;
}

/// Parameters converted to model units, with `scale` applied to the
/// design dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimensions {
    pub text_height: f64,
    pub text_depth: f64,
    pub padding: f64,
    pub corner_radius: f64,
    pub line_spacing: f64,
    pub wall_thickness: f64,
    pub hole_diameter: f64,
    pub plate_thickness: f64,
    pub housing_depth: f64,
    pub channel_width: f64,
    pub channel_depth: f64,
}

impl Dimensions {
    pub fn from_parameters(params: &Parameters) -> Self {
        let s = params.scale;
        let channel = params.led_type.channel();
        Self {
            text_height: mm(params.text_height * s),
            text_depth: mm(params.text_depth * s),
            padding: mm(params.padding * s),
            corner_radius: mm(params.corner_radius * s),
            line_spacing: mm(params.line_spacing * s),
            wall_thickness: mm(params.wall_thickness),
            hole_diameter: mm(params.hole_diameter),
            plate_thickness: mm(params.plate_thickness),
            housing_depth: mm(params.housing_depth),
            channel_width: mm(channel.width),
            channel_depth: mm(channel.depth),
        }
    }

    /// Back panel thickness: a floor of wall thickness under the channels
    pub fn panel_thickness(&self) -> f64 {
        self.wall_thickness + self.channel_depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_partial_json_takes_defaults() {
        let params = Parameters::from_json(
            r#"{"lines":[{"text":"EXIT","alignment":"left"}],"mount_type":"2hole","led_type":"neon_6mm"}"#,
        )
        .unwrap();
        assert_eq!(params.lines, vec![LineSpec::new("EXIT", LineAlignment::Left)]);
        assert_eq!(params.mount_type, MountType::TwoHole);
        assert_eq!(params.led_type, LedType::Neon6mm);
        assert_eq!(params.text_height, Parameters::default().text_height);
        assert!(params.housing);
    }

    #[test]
    fn test_enum_names() {
        let json = serde_json::to_string(&MountType::FrenchCleat).unwrap();
        assert_eq!(json, "\"french_cleat\"");
        let json = serde_json::to_string(&BackplateShape::RoundedRect).unwrap();
        assert_eq!(json, "\"rounded_rect\"");
        let line: LineSpec = serde_json::from_str(r#"{"text":"A"}"#).unwrap();
        assert_eq!(line.alignment, LineAlignment::Center);
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let err = Parameters::from_json(r#"{"mount_type":"glue"}"#).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidParameters(_)));
    }

    #[test]
    fn test_validate() {
        assert!(Parameters::default().validate().is_ok());

        let bad = Parameters {
            text_height: 0.0,
            ..Parameters::default()
        };
        assert!(bad.validate().is_err());

        let bad = Parameters {
            padding: f64::NAN,
            ..Parameters::default()
        };
        assert!(bad.validate().is_err());

        let shallow = Parameters {
            housing_depth: 5.0,
            ..Parameters::default()
        };
        assert!(shallow.validate().is_err());
        let letters_only = Parameters {
            housing: false,
            ..shallow
        };
        assert!(letters_only.validate().is_ok());
    }

    #[test]
    fn test_scale_applies_to_design_dimensions_only() {
        let params = Parameters {
            scale: 2.0,
            ..Parameters::default()
        };
        let dims = Dimensions::from_parameters(&params);
        assert_relative_eq!(dims.text_height, mm(120.0));
        assert_relative_eq!(dims.padding, mm(30.0));
        assert_relative_eq!(dims.wall_thickness, mm(3.0));
        assert_relative_eq!(dims.channel_width, mm(10.0));
        assert_relative_eq!(dims.panel_thickness(), mm(7.0));
    }
}
