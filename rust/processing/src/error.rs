// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for generation
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Reasons a generation run produces no assembly
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Outline provider is not ready")]
    NotReady,

    #[error("No valid characters to generate")]
    NoValidCharacters,

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Geometry error: {0}")]
    Geometry(#[from] signlite_geometry::Error),

    #[error("Export error: {0}")]
    Export(#[from] signlite_export::Error),

    #[error("Generation aborted: {0}")]
    Aborted(String),
}
