// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Encode every part of an assembly in parallel.

use crate::assembly::{Assembly, PartName};
use crate::error::Result;
use rayon::prelude::*;
use signlite_export::{encode, ExportFormat};

/// One encoded file
#[derive(Debug, Clone)]
pub struct ExportedPart {
    pub part: PartName,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportedPart {
    /// `<part>.<ext>`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.part, self.format.extension())
    }
}

/// Encode each part in each format.
///
/// Output keeps the assembly's part order, formats in the order given.
pub fn export_assembly(assembly: &Assembly, formats: &[ExportFormat]) -> Result<Vec<ExportedPart>> {
    let jobs: Vec<(&PartName, ExportFormat, &signlite_geometry::Solid)> = assembly
        .iter()
        .flat_map(|(name, solid)| formats.iter().map(move |&format| (name, format, solid)))
        .collect();

    let exported = jobs
        .into_par_iter()
        .map(|(name, format, solid)| {
            let bytes = encode(solid, &name.to_string(), format)?;
            Ok(ExportedPart {
                part: name.clone(),
                format,
                bytes,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(
        files = exported.len(),
        bytes = exported.iter().map(|p| p.bytes.len()).sum::<usize>(),
        "Export complete"
    );
    Ok(exported)
}
