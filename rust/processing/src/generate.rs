// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Generation pipeline: parameters in, assembly out.

use crate::assembly::Assembly;
use crate::builder::AssemblyBuilder;
use crate::error::{GenerationError, Result};
use crate::params::{Dimensions, Parameters};
use serde::Serialize;
use signlite_geometry::text::has_drawable_chars;
use signlite_geometry::{layout, CompositionReport, Compositor, OutlineProvider};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

/// Output of a successful run
#[derive(Debug, Clone)]
pub struct Generation {
    pub assembly: Assembly,
    pub report: CompositionReport,
    pub stats: GenerationStats,
}

/// Timing and size of one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationStats {
    pub glyph_count: usize,
    pub part_count: usize,
    pub total_triangles: usize,
    pub boolean_ops: usize,
    pub boolean_failures: usize,
    pub layout_time_ms: u64,
    pub assembly_time_ms: u64,
}

/// Build a fresh assembly from `params`.
///
/// Checks run in order: parameter validation, provider readiness, then
/// whether any line has a drawable character.
pub fn generate(params: &Parameters, provider: &dyn OutlineProvider) -> Result<Generation> {
    params.validate()?;

    if !provider.is_ready() {
        return Err(GenerationError::NotReady);
    }

    let lines = params.text_lines();
    if !has_drawable_chars(&lines) {
        return Err(GenerationError::NoValidCharacters);
    }

    let dims = Dimensions::from_parameters(params);
    let layout_start = Instant::now();
    let text = layout(
        &lines,
        dims.text_height,
        dims.text_depth,
        dims.line_spacing,
        provider,
    )?;
    let layout_time = layout_start.elapsed();

    // Every character may have been missing from the provider
    let glyph_count = text.glyph_count();
    if glyph_count == 0 {
        return Err(GenerationError::NoValidCharacters);
    }
    tracing::info!(
        lines = text.lines.len(),
        glyphs = glyph_count,
        layout_time_ms = layout_time.as_millis(),
        "Text layout complete"
    );

    let assembly_start = Instant::now();
    let mut compositor = Compositor::new();
    let glyphs = text.lines.into_iter().flat_map(|line| line.glyphs).collect();
    let assembly = AssemblyBuilder::new(params, &mut compositor).build(glyphs)?;
    let assembly_time = assembly_start.elapsed();

    let report = compositor.into_report();
    let stats = GenerationStats {
        glyph_count,
        part_count: assembly.len(),
        total_triangles: assembly.triangle_count(),
        boolean_ops: report.attempted,
        boolean_failures: report.failed,
        layout_time_ms: layout_time.as_millis() as u64,
        assembly_time_ms: assembly_time.as_millis() as u64,
    };

    if report.is_clean() {
        tracing::info!(
            parts = stats.part_count,
            triangles = stats.total_triangles,
            boolean_ops = stats.boolean_ops,
            assembly_time_ms = stats.assembly_time_ms,
            "Generation complete"
        );
    } else {
        tracing::warn!(
            parts = stats.part_count,
            failures = report.failed,
            "Generation complete with skipped features"
        );
    }

    Ok(Generation {
        assembly,
        report,
        stats,
    })
}

/// User-visible state of the generator
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenerationStatus {
    #[default]
    Ready,
    Generating,
    Done { parts: usize },
    NoValidCharacters,
    NotReady,
    Failed(String),
}

impl From<&GenerationError> for GenerationStatus {
    fn from(err: &GenerationError) -> Self {
        match err {
            GenerationError::NotReady => GenerationStatus::NotReady,
            GenerationError::NoValidCharacters => GenerationStatus::NoValidCharacters,
            other => GenerationStatus::Failed(other.to_string()),
        }
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationStatus::Ready => f.write_str("Ready"),
            GenerationStatus::Generating => f.write_str("Generating..."),
            GenerationStatus::Done { parts } => write!(f, "Generated {} parts", parts),
            GenerationStatus::NoValidCharacters => f.write_str("No valid characters"),
            GenerationStatus::NotReady => f.write_str("Font not loaded yet"),
            GenerationStatus::Failed(reason) => write!(f, "Error: {}", reason),
        }
    }
}

/// Holds the current assembly across regenerations.
///
/// A run builds into a fresh assembly and only replaces the current one
/// when it succeeds; any failure leaves the previous assembly in place.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<Generation>,
    status: GenerationStatus,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &GenerationStatus {
        &self.status
    }

    pub fn current(&self) -> Option<&Generation> {
        self.current.as_ref()
    }

    pub fn assembly(&self) -> Option<&Assembly> {
        self.current.as_ref().map(|g| &g.assembly)
    }

    /// Run a generation and swap its assembly in on success
    pub fn regenerate(&mut self, params: &Parameters, provider: &dyn OutlineProvider) -> &GenerationStatus {
        self.status = GenerationStatus::Generating;

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| generate(params, provider)))
            .unwrap_or_else(|payload| {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(GenerationError::Aborted(reason))
            });

        self.status = match outcome {
            Ok(generation) => {
                let parts = generation.assembly.len();
                self.current = Some(generation);
                GenerationStatus::Done { parts }
            }
            Err(err) => {
                tracing::error!(error = %err, "Generation failed, keeping previous assembly");
                GenerationStatus::from(&err)
            }
        };
        &self.status
    }
}
