// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SignLite Export
//!
//! Serializes [`Solid`]s for 3D printing. Two formats are supported:
//!
//! - binary STL: a flat triangle list with per-facet normals
//! - 3MF: a welded, indexed mesh packaged in a store-only ZIP archive
//!
//! Both formats are written in millimeters. The archive writer and its
//! CRC-32 live in [`archive`] and have no compression support.

pub mod archive;
pub mod error;
pub mod stl;
pub mod threemf;

pub use archive::{crc32, write_archive, ArchiveWriter};
pub use error::{Error, Result};
pub use stl::{encode_stl, write_stl};
pub use threemf::{encode_3mf, weld, WeldedMesh};

use signlite_geometry::{Matrix4, Mesh, Solid, MM_PER_UNIT};
use std::fmt;

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Stl,
    ThreeMf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 2] = [ExportFormat::Stl, ExportFormat::ThreeMf];

    /// File extension without the dot
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Stl => "stl",
            ExportFormat::ThreeMf => "3mf",
        }
    }

    /// Parse an extension or format name, case-insensitive
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "stl" => Some(ExportFormat::Stl),
            "3mf" | "threemf" => Some(ExportFormat::ThreeMf),
            _ => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// World mesh of a solid, scaled from model units to millimeters
pub fn millimeter_mesh(solid: &Solid) -> Mesh {
    solid
        .clone()
        .transformed(&Matrix4::new_scaling(MM_PER_UNIT))
        .into_world_mesh()
}

/// Encode a solid in the requested format
pub fn encode(solid: &Solid, name: &str, format: ExportFormat) -> Result<Vec<u8>> {
    let bytes = match format {
        ExportFormat::Stl => encode_stl(solid)?,
        ExportFormat::ThreeMf => encode_3mf(solid, name)?,
    };
    tracing::debug!(
        part = name,
        format = format.extension(),
        bytes = bytes.len(),
        "encoded"
    );
    Ok(bytes)
}
