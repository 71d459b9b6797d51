//! Output format detection and writing for ranked results.

use anyhow::{Context, Result};
use arrow::array::{
    ArrayRef, Float64Builder, ListBuilder, RecordBatch, StringBuilder, UInt32Builder,
};
use arrow::datatypes::{DataType, Field, Schema};
use flate2::write::GzEncoder;
use flate2::Compression;
use parquet::arrow::ArrowWriter;
use parquet::basic::ZstdLevel;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cellmesh::ScoredResult;

use super::formatting::{format_pmids, format_result_row, RESULT_HEADER};

/// Output format auto-detected from file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain TSV (default, .tsv, or no extension)
    Tsv,
    /// Gzip-compressed TSV (.tsv.gz or .gz)
    TsvGz,
    /// Apache Parquet (.parquet)
    Parquet,
}

impl OutputFormat {
    /// Detect output format from file path.
    ///
    /// - `None` or `"-"` → TSV to stdout
    /// - `.parquet` extension → Parquet
    /// - `.gz` extension (including `.tsv.gz`) → Gzip-compressed TSV
    /// - Everything else → Plain TSV
    pub fn detect(path: Option<&PathBuf>) -> Self {
        let Some(p) = path else {
            return OutputFormat::Tsv;
        };
        if p.as_os_str() == "-" {
            return OutputFormat::Tsv;
        }
        match p.extension().and_then(|e| e.to_str()) {
            Some("parquet") => OutputFormat::Parquet,
            Some("gz") => OutputFormat::TsvGz,
            _ => OutputFormat::Tsv,
        }
    }

    /// Returns true if this output goes to stdout (when path is None or "-").
    pub fn is_stdout(path: Option<&PathBuf>) -> bool {
        match path {
            None => true,
            Some(p) => p.as_os_str() == "-",
        }
    }
}

/// Write ranked results in the format implied by `path`.
pub fn write_ranked_results(path: Option<&PathBuf>, results: &[ScoredResult]) -> Result<()> {
    match OutputFormat::detect(path) {
        OutputFormat::Tsv => {
            let output: Box<dyn Write> = match path {
                Some(p) if !OutputFormat::is_stdout(path) => Box::new(
                    File::create(p)
                        .with_context(|| format!("Failed to create output file: {}", p.display()))?,
                ),
                _ => Box::new(io::stdout().lock()),
            };
            let mut writer = BufWriter::new(output);
            write_tsv(&mut writer, results)?;
            writer.flush().context("Failed to flush TSV output")?;
        }
        OutputFormat::TsvGz => {
            let p = path.context("gzip output requires a file path")?;
            let file = File::create(p)
                .with_context(|| format!("Failed to create output file: {}", p.display()))?;
            let mut writer = BufWriter::new(GzEncoder::new(file, Compression::default()));
            write_tsv(&mut writer, results)?;
            let encoder = writer
                .into_inner()
                .map_err(|e| e.into_error())
                .context("Failed to flush gzip output")?;
            encoder.finish().context("Failed to finalize gzip output")?;
        }
        OutputFormat::Parquet => {
            let p = path.context("Parquet output requires a file path")?;
            write_parquet(p, results)?;
        }
    }
    Ok(())
}

fn write_tsv<W: Write>(writer: &mut W, results: &[ScoredResult]) -> Result<()> {
    writer.write_all(RESULT_HEADER.as_bytes())?;
    for (rank, result) in results.iter().enumerate() {
        writer.write_all(format_result_row(rank + 1, result).as_bytes())?;
    }
    Ok(())
}

fn write_parquet(path: &Path, results: &[ScoredResult]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("rank", DataType::UInt32, false),
        Field::new("cell_id", DataType::Utf8, false),
        Field::new("cell_name", DataType::Utf8, false),
        Field::new("score", DataType::Float64, false),
        Field::new(
            "overlapping_genes",
            DataType::List(Arc::new(Field::new("item", DataType::Utf8, true))),
            false,
        ),
        Field::new("pmids", DataType::Utf8, false),
    ]));

    let mut ranks = UInt32Builder::with_capacity(results.len());
    let mut cell_ids = StringBuilder::new();
    let mut cell_names = StringBuilder::new();
    let mut scores = Float64Builder::with_capacity(results.len());
    let mut genes = ListBuilder::new(StringBuilder::new());
    let mut pmids = StringBuilder::new();

    for (rank, result) in results.iter().enumerate() {
        ranks.append_value(rank as u32 + 1);
        cell_ids.append_value(&result.cell_id);
        cell_names.append_value(&result.cell_name);
        scores.append_value(result.score);
        for gene in &result.overlapping_genes {
            genes.values().append_value(gene);
        }
        genes.append(true);
        pmids.append_value(format_pmids(result));
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(ranks.finish()),
        Arc::new(cell_ids.finish()),
        Arc::new(cell_names.finish()),
        Arc::new(scores.finish()),
        Arc::new(genes.finish()),
        Arc::new(pmids.finish()),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    let props = WriterProperties::builder()
        .set_compression(parquet::basic::Compression::ZSTD(ZstdLevel::default()))
        .build();
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}
