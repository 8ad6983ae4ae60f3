// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 3MF encoder
//!
//! A 3MF package here is three stored archive entries: the content-type
//! registry, the package relationships and one model document holding a
//! single welded mesh object in millimeters.

use crate::archive::ArchiveWriter;
use crate::error::{Error, Result};
use crate::millimeter_mesh;
use rustc_hash::FxHashMap;
use signlite_geometry::{Mesh, Solid};
use std::fmt::Write;

/// Decimal places used to decide that two vertices coincide
pub const WELD_DECIMALS: i32 = 6;

pub const MODEL_PATH: &str = "3D/3dmodel.model";
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";
pub const RELS_PATH: &str = "_rels/.rels";

const NAMESPACE_3MF: &str = "http://schemas.microsoft.com/3dmanufacturing/core/2015/02";

/// Content types XML for 3MF.
pub const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
</Types>"#;

/// Relationships XML for 3MF.
pub const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Target="/3D/3dmodel.model" Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>"#;

/// Mesh with shared vertices
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeldedMesh {
    pub vertices: Vec<[f64; 3]>,
    pub triangles: Vec<[u32; 3]>,
}

/// Merge vertices whose coordinates agree to [`WELD_DECIMALS`] places.
///
/// Triangles that lose a corner to welding are dropped.
pub fn weld(mesh: &Mesh) -> WeldedMesh {
    let factor = 10f64.powi(WELD_DECIMALS);
    let mut lookup: FxHashMap<(i64, i64, i64), u32> = FxHashMap::default();
    let mut welded = WeldedMesh {
        vertices: Vec::with_capacity(mesh.vertex_count()),
        triangles: Vec::with_capacity(mesh.triangle_count()),
    };

    // Index remap for the source vertices
    let remap: Vec<u32> = (0..mesh.vertex_count())
        .map(|i| {
            let p = mesh.position(i);
            let key = (
                (p.x * factor).round() as i64,
                (p.y * factor).round() as i64,
                (p.z * factor).round() as i64,
            );
            *lookup.entry(key).or_insert_with(|| {
                welded.vertices.push([
                    key.0 as f64 / factor,
                    key.1 as f64 / factor,
                    key.2 as f64 / factor,
                ]);
                (welded.vertices.len() - 1) as u32
            })
        })
        .collect();

    let mut dropped = 0usize;
    for tri in mesh.indices.chunks_exact(3) {
        let t = [
            remap[tri[0] as usize],
            remap[tri[1] as usize],
            remap[tri[2] as usize],
        ];
        if t[0] == t[1] || t[1] == t[2] || t[0] == t[2] {
            dropped += 1;
            continue;
        }
        welded.triangles.push(t);
    }

    if dropped > 0 {
        tracing::debug!(dropped, "triangles collapsed during welding");
    }
    welded
}

fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Generate the 3D model XML content
pub fn model_xml(mesh: &WeldedMesh, name: &str) -> Result<String> {
    // Roughly 60 bytes per vertex and per triangle line
    let mut xml = String::with_capacity(512 + 64 * (mesh.vertices.len() + mesh.triangles.len()));

    writeln!(xml, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        xml,
        r#"<model unit="millimeter" xml:lang="en-US" xmlns="{}">"#,
        NAMESPACE_3MF
    )?;
    writeln!(xml, "  <resources>")?;
    writeln!(
        xml,
        r#"    <object id="1" name="{}" type="model">"#,
        escape_attribute(name)
    )?;
    writeln!(xml, "      <mesh>")?;
    writeln!(xml, "        <vertices>")?;
    for v in &mesh.vertices {
        writeln!(
            xml,
            r#"          <vertex x="{:.6}" y="{:.6}" z="{:.6}"/>"#,
            v[0], v[1], v[2]
        )?;
    }
    writeln!(xml, "        </vertices>")?;
    writeln!(xml, "        <triangles>")?;
    for t in &mesh.triangles {
        writeln!(
            xml,
            r#"          <triangle v1="{}" v2="{}" v3="{}"/>"#,
            t[0], t[1], t[2]
        )?;
    }
    writeln!(xml, "        </triangles>")?;
    writeln!(xml, "      </mesh>")?;
    writeln!(xml, "    </object>")?;
    writeln!(xml, "  </resources>")?;
    writeln!(xml, "  <build>")?;
    writeln!(xml, r#"    <item objectid="1"/>"#)?;
    writeln!(xml, "  </build>")?;
    write!(xml, "</model>")?;

    Ok(xml)
}

/// Encode a solid as a 3MF package in millimeters
pub fn encode_3mf(solid: &Solid, name: &str) -> Result<Vec<u8>> {
    let welded = weld(&millimeter_mesh(solid));
    if welded.triangles.is_empty() {
        return Err(Error::EmptyMesh(format!("{} has no triangles after welding", name)));
    }

    let model = model_xml(&welded, name)?;

    let mut archive = ArchiveWriter::new();
    archive.add_entry(CONTENT_TYPES_PATH, CONTENT_TYPES_XML.as_bytes())?;
    archive.add_entry(RELS_PATH, RELS_XML.as_bytes())?;
    archive.add_entry(MODEL_PATH, model.as_bytes())?;
    archive.finish()
}
