// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared sign generation pipeline used by SignLite hosts.
//!
//! [`generate`] takes a [`Parameters`] snapshot and an outline provider and
//! returns a fresh [`Assembly`] of named parts; [`export_assembly`] encodes
//! those parts for printing.

pub mod assembly;
pub mod builder;
pub mod error;
pub mod export;
pub mod generate;
pub mod params;

pub use assembly::{Assembly, PartName};
pub use builder::{AssemblyBuilder, Footprint};
pub use error::{GenerationError, Result};
pub use export::{export_assembly, ExportedPart};
pub use generate::{generate, Generation, GenerationStats, GenerationStatus, Session};
pub use params::{
    BackplateShape, Dimensions, LedType, LineAlignment, LineSpec, MountType, Parameters,
    ReflectorStyle,
};
