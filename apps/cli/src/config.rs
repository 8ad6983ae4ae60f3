// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI configuration loaded from environment variables.

use signlite_export::ExportFormat;
use std::path::PathBuf;

/// CLI configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// TrueType/OpenType font used for glyph outlines.
    pub font: Option<PathBuf>,
    /// Directory the part files are written to.
    pub out_dir: PathBuf,
    /// Formats written for every part.
    pub formats: Vec<ExportFormat>,
    /// Number of worker threads for parallel encoding.
    pub worker_threads: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            font: std::env::var("SIGNLITE_FONT").ok().map(PathBuf::from),
            out_dir: std::env::var("SIGNLITE_OUT_DIR")
                .unwrap_or_else(|_| "./out".into())
                .into(),
            formats: parse_formats(
                &std::env::var("SIGNLITE_FORMATS").unwrap_or_else(|_| "stl,3mf".into()),
            ),
            worker_threads: std::env::var("SIGNLITE_WORKERS")
                .unwrap_or_else(|_| num_cpus::get().to_string())
                .parse()
                .unwrap_or_else(|_| num_cpus::get()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Comma-separated format list; unknown names are ignored, an empty result
/// falls back to every format.
fn parse_formats(list: &str) -> Vec<ExportFormat> {
    let mut formats = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match ExportFormat::from_name(name) {
            Some(format) if !formats.contains(&format) => formats.push(format),
            Some(_) => {}
            None => tracing::warn!(format = name, "Unknown export format ignored"),
        }
    }
    if formats.is_empty() {
        formats.extend(ExportFormat::ALL);
    }
    formats
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        assert_eq!(parse_formats("stl"), vec![ExportFormat::Stl]);
        assert_eq!(
            parse_formats(" 3mf , stl ,stl"),
            vec![ExportFormat::ThreeMf, ExportFormat::Stl]
        );
        assert_eq!(parse_formats("obj,"), ExportFormat::ALL.to_vec());
    }
}
