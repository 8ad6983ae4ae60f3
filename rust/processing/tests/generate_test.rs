// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use signlite_export::ExportFormat;
use signlite_geometry::profile::create_rectangle;
use signlite_geometry::{mm, GlyphOutline, OutlineProvider, Point2};
use signlite_processing::{
    export_assembly, generate, BackplateShape, Dimensions, Footprint, Generation, GenerationError,
    GenerationStatus, LineAlignment, LineSpec, MountType, Parameters, PartName, Session,
};

/// Every drawable character is a solid block 0.6 em wide
struct Blocks;

impl OutlineProvider for Blocks {
    fn outline(&self, _ch: char, size: f64) -> Option<GlyphOutline> {
        GlyphOutline::from_profiles(vec![create_rectangle(0.6 * size, size)])
    }
}

/// A font that has not finished loading
struct Loading;

impl OutlineProvider for Loading {
    fn outline(&self, _ch: char, _size: f64) -> Option<GlyphOutline> {
        None
    }

    fn is_ready(&self) -> bool {
        false
    }
}

/// A font whose outline lookup blows up
struct Corrupt;

impl OutlineProvider for Corrupt {
    fn outline(&self, _ch: char, _size: f64) -> Option<GlyphOutline> {
        panic!("glyf table truncated")
    }
}

const SHAPES: [BackplateShape; 5] = [
    BackplateShape::Rectangle,
    BackplateShape::RoundedRect,
    BackplateShape::Oval,
    BackplateShape::Arch,
    BackplateShape::AutoContour,
];

fn cleat_sign(text: &str) -> Parameters {
    Parameters {
        mount_type: MountType::FrenchCleat,
        ..Parameters::with_text(text)
    }
}

#[test]
fn french_cleat_sign_has_four_parts() {
    let generation = generate(&cleat_sign("1234"), &Blocks).unwrap();
    let names: Vec<String> = generation.assembly.names().map(|n| n.to_string()).collect();

    assert_eq!(names, ["face_plate", "back_plate", "wall_cleat", "diffuser"]);
    assert_eq!(generation.assembly.letter_count(), 0);
    assert_eq!(generation.stats.glyph_count, 4);
    for (name, solid) in generation.assembly.iter() {
        assert!(!solid.is_empty(), "{} is empty", name);
        assert!(solid.world_mesh().is_finite(), "{} is not finite", name);
    }
}

fn part_volume(generation: &Generation, name: &PartName) -> f64 {
    generation.assembly.get(name).unwrap().world_mesh().signed_volume()
}

/// Panel plus rim before any channel, bore or pocket is cut
fn uncut_housing_volume(params: &Parameters, generation: &Generation) -> f64 {
    let dims = Dimensions::from_parameters(params);
    let plate = generation.assembly.get(&PartName::FacePlate).unwrap().bounds();
    let center = plate.center();
    let footprint = Footprint {
        shape: params.backplate_shape.into(),
        center: Point2::new(center.x, center.y),
        width: plate.width(),
        height: plate.height(),
        corner_radius: dims.corner_radius,
    };
    let outer = footprint.outer().area();
    let ring = outer - footprint.inset(dims.wall_thickness).area();
    let panel_t = dims.panel_thickness();
    outer * panel_t + ring * (dims.housing_depth - panel_t)
}

#[test]
fn cuts_never_add_material_to_the_back_plate() {
    let mounts = [MountType::None, MountType::TwoHole, MountType::FourHole, MountType::Keyhole];
    for shape in SHAPES {
        let mut volumes = Vec::new();
        for mount in mounts {
            let params = Parameters {
                backplate_shape: shape,
                mount_type: mount,
                ..Parameters::with_text("1234")
            };
            let generation = generate(&params, &Blocks).unwrap();
            let report = &generation.report;
            assert_eq!(report.failures.len(), report.failed, "{:?} {:?}", shape, mount);
            assert!(report.failed <= report.attempted);
            assert_eq!(generation.stats.boolean_failures, report.failed);

            let back = part_volume(&generation, &PartName::BackPlate);
            let uncut = uncut_housing_volume(&params, &generation);
            assert!(back > 0.0);
            assert!(back <= uncut * 1.01, "{:?} {:?}: {} > {}", shape, mount, back, uncut);
            if report.is_clean() {
                assert!(back < uncut, "{:?} {:?}: clean run removed nothing", shape, mount);
            }
            volumes.push(back);
        }

        // Mounting cuts come last, after an identical sequence of features
        let none = volumes[0];
        let slack = none * 0.005;
        assert!(volumes[1] <= none + slack, "{:?}: two holes added volume", shape);
        assert!(volumes[2] <= volumes[1] + slack, "{:?}: four holes added volume", shape);
        assert!(volumes[3] <= none + slack, "{:?}: keyholes added volume", shape);
    }
}

#[test]
fn french_cleat_report_accounts_for_every_fallback() {
    for shape in SHAPES {
        let params = Parameters {
            backplate_shape: shape,
            weather_seal: true,
            ..cleat_sign("1234")
        };
        let generation = generate(&params, &Blocks).unwrap();
        let report = &generation.report;
        assert_eq!(report.failures.len(), report.failed);
        for line in &report.failures {
            assert!(
                line.starts_with("back_plate") || line.starts_with("face_plate") || line.starts_with("wall_cleat"),
                "{}",
                line
            );
        }
        for (name, solid) in generation.assembly.iter() {
            assert!(solid.world_mesh().signed_volume() > 0.0, "{:?} {} has no volume", shape, name);
        }
    }
}

#[test]
fn face_plate_covers_text_with_padding() {
    let params = cleat_sign("1234");
    let generation = generate(&params, &Blocks).unwrap();
    let plate = generation.assembly.get(&PartName::FacePlate).unwrap().bounds();

    // Four 36 mm glyphs, three 1.8 mm gaps, 15 mm padding each side
    let expected = mm(4.0 * 36.0 + 3.0 * 1.8 + 30.0);
    assert!((plate.width() - expected).abs() < mm(0.01));
    // Glyphs stand on the plate
    assert!(plate.max.z > mm(params.plate_thickness + params.text_depth - 0.5));
}

#[test]
fn empty_text_has_no_valid_characters() {
    for text in ["", "   ", "@@@"] {
        let err = generate(&Parameters::with_text(text), &Blocks).unwrap_err();
        assert!(matches!(err, GenerationError::NoValidCharacters), "{:?}", text);
    }
}

#[test]
fn unloaded_font_is_not_ready() {
    let err = generate(&Parameters::default(), &Loading).unwrap_err();
    assert!(matches!(err, GenerationError::NotReady));
}

#[test]
fn housing_disabled_yields_standalone_letters() {
    let params = Parameters {
        housing: false,
        lines: vec![
            LineSpec::new("AB", LineAlignment::Left),
            LineSpec::new("C", LineAlignment::Right),
        ],
        ..Parameters::default()
    };
    let generation = generate(&params, &Blocks).unwrap();
    let names: Vec<String> = generation.assembly.names().map(|n| n.to_string()).collect();
    assert_eq!(names, ["letter_00_A", "letter_01_B", "letter_02_C"]);
    assert_eq!(generation.stats.boolean_ops, 0);
}

#[test]
fn session_keeps_previous_assembly_on_failure() {
    let mut session = Session::new();
    assert_eq!(*session.status(), GenerationStatus::Ready);

    let params = Parameters {
        housing: false,
        ..Parameters::with_text("OK")
    };
    assert_eq!(*session.regenerate(&params, &Blocks), GenerationStatus::Done { parts: 2 });

    let status = session.regenerate(&Parameters::with_text(" "), &Blocks).clone();
    assert_eq!(status, GenerationStatus::NoValidCharacters);
    assert_eq!(status.to_string(), "No valid characters");
    assert_eq!(session.assembly().map(|a| a.len()), Some(2));

    let status = session.regenerate(&params, &Loading).clone();
    assert_eq!(status, GenerationStatus::NotReady);
    assert_eq!(session.assembly().map(|a| a.len()), Some(2));
}

#[test]
fn session_survives_a_panicking_provider() {
    let mut session = Session::new();
    let params = Parameters {
        housing: false,
        ..Parameters::with_text("OK")
    };
    assert_eq!(*session.regenerate(&params, &Blocks), GenerationStatus::Done { parts: 2 });

    let status = session.regenerate(&params, &Corrupt).clone();
    match &status {
        GenerationStatus::Failed(reason) => assert!(reason.contains("glyf table truncated"), "{}", reason),
        other => panic!("unexpected status {:?}", other),
    }
    assert_eq!(session.assembly().map(|a| a.len()), Some(2));
    assert!(session.assembly().unwrap().contains(&PartName::Letter { index: 1, ch: 'K' }));
}

#[test]
fn exports_every_part_in_every_format() {
    let params = Parameters {
        housing: false,
        ..Parameters::with_text("HI")
    };
    let generation = generate(&params, &Blocks).unwrap();
    let files = export_assembly(&generation.assembly, &ExportFormat::ALL).unwrap();

    let names: Vec<String> = files.iter().map(|f| f.file_name()).collect();
    assert_eq!(
        names,
        ["letter_00_H.stl", "letter_00_H.3mf", "letter_01_I.stl", "letter_01_I.3mf"]
    );
    // Block letter: 12 triangles in binary STL
    assert_eq!(files[0].bytes.len(), 84 + 12 * 50);
    assert_eq!(&files[1].bytes[..4], &[0x50, 0x4b, 0x03, 0x04]);
}
