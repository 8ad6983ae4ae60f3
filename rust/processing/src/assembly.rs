// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named physical parts of one generation run

use rustc_hash::FxHashMap;
use signlite_geometry::Solid;
use std::fmt;

/// Name of a physical part
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PartName {
    FacePlate,
    BackPlate,
    WallCleat,
    Diffuser,
    /// Standalone letter: position in the text and its character
    Letter { index: usize, ch: char },
}

impl PartName {
    pub fn is_letter(&self) -> bool {
        matches!(self, PartName::Letter { .. })
    }
}

impl fmt::Display for PartName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartName::FacePlate => f.write_str("face_plate"),
            PartName::BackPlate => f.write_str("back_plate"),
            PartName::WallCleat => f.write_str("wall_cleat"),
            PartName::Diffuser => f.write_str("diffuser"),
            PartName::Letter { index, ch } => {
                let ch = match ch {
                    '#' => "hash".to_string(),
                    '.' => "dot".to_string(),
                    '-' => "dash".to_string(),
                    c => c.to_string(),
                };
                write!(f, "letter_{:02}_{}", index, ch)
            }
        }
    }
}

/// Parts in insertion order, addressable by name.
///
/// Built once per run and replaced wholesale on regeneration.
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    parts: Vec<(PartName, Solid)>,
    index: FxHashMap<PartName, usize>,
}

impl Assembly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a part, replacing any part with the same name in place
    pub fn insert(&mut self, name: PartName, solid: Solid) {
        if let Some(&i) = self.index.get(&name) {
            self.parts[i].1 = solid;
        } else {
            self.index.insert(name.clone(), self.parts.len());
            self.parts.push((name, solid));
        }
    }

    pub fn get(&self, name: &PartName) -> Option<&Solid> {
        self.index.get(name).map(|&i| &self.parts[i].1)
    }

    pub fn contains(&self, name: &PartName) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Parts in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&PartName, &Solid)> {
        self.parts.iter().map(|(name, solid)| (name, solid))
    }

    pub fn names(&self) -> impl Iterator<Item = &PartName> {
        self.parts.iter().map(|(name, _)| name)
    }

    pub fn letter_count(&self) -> usize {
        self.names().filter(|name| name.is_letter()).count()
    }

    pub fn triangle_count(&self) -> usize {
        self.parts.iter().map(|(_, solid)| solid.triangle_count()).sum()
    }
}
