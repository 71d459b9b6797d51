//! Helper functions and utilities for the cellmesh CLI.

pub mod formatting;
pub mod output;

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

pub use output::write_ranked_results;

/// Parse the smoothing factor, validating range (0.0, 1.0).
pub fn parse_alpha(s: &str) -> Result<f64, String> {
    let alpha: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(format!("alpha must be in (0.0, 1.0), got {}", alpha));
    }
    Ok(alpha)
}

/// Read gene symbols from a file, one per line (first tab/space-delimited token).
///
/// Blank lines and `#` comments are skipped. `.gz` files are decompressed.
pub fn read_genes_file(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open genes file: {}", path.display()))?;
    let reader: Box<dyn BufRead> = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let mut genes = Vec::new();
    for line in reader.lines() {
        let line =
            line.with_context(|| format!("Failed to read genes file: {}", path.display()))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(gene) = line.split_whitespace().next() {
            genes.push(gene.to_string());
        }
    }
    Ok(genes)
}
