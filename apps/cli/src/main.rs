// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SignLite - parametric LED sign generator.
//!
//! Reads a parameters document (JSON, first argument or stdin), builds the
//! sign assembly and writes one file per part and format.
//!
//! # Environment
//!
//! - `SIGNLITE_FONT` - TrueType/OpenType font for the letters (required)
//! - `SIGNLITE_OUT_DIR` - output directory (default `./out`)
//! - `SIGNLITE_FORMATS` - comma list of `stl`, `3mf` (default both)
//! - `SIGNLITE_WORKERS` - encoder threads (default: CPU count)
//! - `RUST_LOG` - log filter

use anyhow::{bail, Context, Result};
use serde::Serialize;
use signlite_geometry::{CachedOutlines, TrueTypeOutlines};
use signlite_processing::{export_assembly, GenerationStats, GenerationStatus, Parameters, Session};
use std::io::Read;
use std::path::Path;

mod config;

use config::Config;

/// Summary written next to the part files
#[derive(Debug, Serialize)]
struct RunSummary<'a> {
    parameters: &'a Parameters,
    stats: &'a GenerationStats,
    skipped_features: &'a [String],
    files: Vec<String>,
}

fn read_parameters(arg: Option<&str>) -> Result<Parameters> {
    let json = match arg {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read parameters from stdin")?;
            buf
        }
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read parameters from {}", path))?,
    };
    Ok(Parameters::from_json(&json)?)
}

fn load_font(path: Option<&Path>) -> Result<CachedOutlines<TrueTypeOutlines>> {
    let Some(path) = path else {
        bail!("SIGNLITE_FONT must point to a TrueType or OpenType font");
    };
    let data = std::fs::read(path).with_context(|| format!("Failed to read font {}", path.display()))?;
    let outlines = TrueTypeOutlines::from_bytes(data)
        .with_context(|| format!("Failed to parse font {}", path.display()))?;
    Ok(CachedOutlines::new(outlines))
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info,signlite=debug".into()))
        .pretty()
        .init();

    let config = Config::from_env();

    tracing::info!(
        out_dir = %config.out_dir.display(),
        formats = ?config.formats,
        worker_threads = config.worker_threads,
        "Starting SignLite"
    );

    // Initialize rayon thread pool
    rayon::ThreadPoolBuilder::new()
        .num_threads(config.worker_threads)
        .build_global()
        .context("Failed to initialize rayon thread pool")?;

    let arg = std::env::args().nth(1);
    let params = read_parameters(arg.as_deref())?;
    let provider = load_font(config.font.as_deref())?;

    let mut session = Session::new();
    let status = session.regenerate(&params, &provider).clone();
    tracing::info!(status = %status, "Generation finished");

    let generation = match (&status, session.current()) {
        (GenerationStatus::Done { .. }, Some(generation)) => generation,
        _ => bail!("{}", status),
    };
    tracing::debug!(cached_glyphs = provider.cached_len(), "Outline cache");

    let files = export_assembly(&generation.assembly, &config.formats)?;

    std::fs::create_dir_all(&config.out_dir)
        .with_context(|| format!("Failed to create {}", config.out_dir.display()))?;

    let mut written = Vec::with_capacity(files.len());
    for file in &files {
        let path = config.out_dir.join(file.file_name());
        std::fs::write(&path, &file.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), bytes = file.bytes.len(), "Wrote part");
        written.push(file.file_name());
    }

    let summary = RunSummary {
        parameters: &params,
        stats: &generation.stats,
        skipped_features: &generation.report.failures,
        files: written,
    };
    let summary_path = config.out_dir.join("summary.json");
    std::fs::write(&summary_path, serde_json::to_vec_pretty(&summary)?)
        .with_context(|| format!("Failed to write {}", summary_path.display()))?;

    println!("{}", status);
    Ok(())
}
