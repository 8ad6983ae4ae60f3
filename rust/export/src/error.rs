// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while encoding a solid
#[derive(Error, Debug)]
pub enum Error {
    #[error("Nothing to export: {0}")]
    EmptyMesh(String),

    #[error("Archive holds at most {max} entries")]
    TooManyEntries { max: usize },

    #[error("Archive entry '{name}' is too large ({size} bytes)")]
    EntryTooLarge { name: String, size: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),
}
