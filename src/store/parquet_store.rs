//! Parquet-backed reference store.
//!
//! Tables are read once at open time into a [`MemoryStore`]; lookups after
//! that never touch the file system.

use arrow::array::{Array, ArrayRef, RecordBatch, StringArray, UInt32Array, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::{WriterProperties, WriterVersion};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::manifest::StoreManifest;
use super::memory::MemoryStore;
use super::{files, CatalogCategory, CatalogFilter, ReferenceStore, StoreSummary};
use crate::constants::STORE_ROW_GROUP_SIZE;
use crate::error::{CellMeshError, Result};
use crate::types::{CellType, CooccurrenceRecord, ProfileEntry};

/// Check whether `path` looks like a store directory.
pub fn is_store_dir(path: &Path) -> bool {
    path.is_dir() && path.join(files::MANIFEST).is_file()
}

/// Reference store loaded from a store directory.
#[derive(Debug, Clone)]
pub struct ParquetStore {
    dir: PathBuf,
    manifest: StoreManifest,
    tables: MemoryStore,
}

impl ParquetStore {
    /// Open a store directory, validating the manifest and every table.
    ///
    /// Any missing file, schema mismatch or row-count disagreement with the
    /// manifest yields a `StoreUnavailable`-kind error.
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(CellMeshError::store_unavailable(format!(
                "store directory not found: {}",
                dir.display()
            )));
        }

        let manifest = StoreManifest::load(dir)?;
        let mut tables = MemoryStore::new();

        let cells = read_cells(&dir.join(files::CELLS))?;
        check_count(dir, "cells", manifest.num_cells, cells.len())?;
        for cell in cells {
            tables.add_cell(cell.id, cell.name);
        }

        let genes = read_genes(&dir.join(files::GENES))?;
        check_count(dir, "genes", manifest.num_genes, genes.len())?;
        for (gene, taxid) in genes {
            tables.add_gene(taxid, gene);
        }

        let records = read_cell_gene(&dir.join(files::CELL_GENE))?;
        check_count(dir, "cell_gene", manifest.num_records, records.len())?;
        for record in records {
            tables.add_record(record);
        }

        for category in CatalogCategory::ALL {
            let path = dir.join(category.file_name());
            if path.is_file() {
                let ids = read_id_list(&path)?;
                log::debug!("Loaded {} {} exclusion ids", ids.len(), category.label());
                tables.set_exclusions(category, ids);
            }
        }

        log::info!(
            "Opened store {}: {} cells, {} genes, {} co-occurrence records",
            dir.display(),
            manifest.num_cells,
            manifest.num_genes,
            manifest.num_records
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            manifest,
            tables,
        })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    pub fn manifest(&self) -> &StoreManifest {
        &self.manifest
    }

    pub fn summary(&self) -> StoreSummary {
        self.tables.summary()
    }
}

impl ReferenceStore for ParquetStore {
    fn list_cells(&self, filter: &CatalogFilter) -> Result<Vec<CellType>> {
        self.tables.list_cells(filter)
    }

    fn list_genes(&self, taxonomy_id: u32) -> Result<Vec<String>> {
        self.tables.list_genes(taxonomy_id)
    }

    fn cell_gene_profile(
        &self,
        cell_id: &str,
        taxonomy_id: u32,
        count_threshold: u64,
    ) -> Result<Vec<ProfileEntry>> {
        self.tables
            .cell_gene_profile(cell_id, taxonomy_id, count_threshold)
    }
}

fn check_count(dir: &Path, table: &str, expected: u64, actual: usize) -> Result<()> {
    if expected != actual as u64 {
        return Err(CellMeshError::format(
            dir.join(files::MANIFEST),
            format!(
                "manifest lists {} rows for table '{}', found {}",
                expected, table, actual
            ),
        ));
    }
    Ok(())
}

// ============================================================================
// Schemas
// ============================================================================

fn cells_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("cell_id", DataType::Utf8, false),
        Field::new("cell_name", DataType::Utf8, false),
    ]))
}

fn genes_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("gene", DataType::Utf8, false),
        Field::new("taxid", DataType::UInt32, false),
    ]))
}

fn cell_gene_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("cell_id", DataType::Utf8, false),
        Field::new("gene", DataType::Utf8, false),
        Field::new("taxid", DataType::UInt32, false),
        Field::new("count", DataType::UInt64, false),
        Field::new("pmids", DataType::Utf8, false),
    ]))
}

// ============================================================================
// Writing
// ============================================================================

fn write_table(path: &Path, schema: SchemaRef, columns: Vec<ArrayRef>) -> Result<()> {
    let props = WriterProperties::builder()
        .set_writer_version(WriterVersion::PARQUET_2_0)
        .set_compression(Compression::ZSTD(ZstdLevel::default()))
        .set_max_row_group_size(STORE_ROW_GROUP_SIZE)
        .build();

    let file = File::create(path).map_err(|e| CellMeshError::io(path, "create table file", e))?;
    let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
    let batch = RecordBatch::try_new(schema, columns)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

pub(crate) fn write_cells(store_dir: &Path, cells: &[CellType]) -> Result<()> {
    let ids: Vec<&str> = cells.iter().map(|c| c.id.as_str()).collect();
    let names: Vec<&str> = cells.iter().map(|c| c.name.as_str()).collect();
    write_table(
        &store_dir.join(files::CELLS),
        cells_schema(),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(StringArray::from(names)),
        ],
    )
}

pub(crate) fn write_genes(store_dir: &Path, genes: &[(String, u32)]) -> Result<()> {
    let symbols: Vec<&str> = genes.iter().map(|(g, _)| g.as_str()).collect();
    let taxids: Vec<u32> = genes.iter().map(|(_, t)| *t).collect();
    write_table(
        &store_dir.join(files::GENES),
        genes_schema(),
        vec![
            Arc::new(StringArray::from(symbols)),
            Arc::new(UInt32Array::from(taxids)),
        ],
    )
}

pub(crate) fn write_cell_gene(store_dir: &Path, records: &[CooccurrenceRecord]) -> Result<()> {
    let cell_ids: Vec<&str> = records.iter().map(|r| r.cell_id.as_str()).collect();
    let genes: Vec<&str> = records.iter().map(|r| r.gene.as_str()).collect();
    let taxids: Vec<u32> = records.iter().map(|r| r.taxonomy_id).collect();
    let counts: Vec<u64> = records.iter().map(|r| r.count).collect();
    let pmids: Vec<&str> = records.iter().map(|r| r.pmids.as_str()).collect();
    write_table(
        &store_dir.join(files::CELL_GENE),
        cell_gene_schema(),
        vec![
            Arc::new(StringArray::from(cell_ids)),
            Arc::new(StringArray::from(genes)),
            Arc::new(UInt32Array::from(taxids)),
            Arc::new(UInt64Array::from(counts)),
            Arc::new(StringArray::from(pmids)),
        ],
    )
}

/// Write ids one per line, sorted.
pub(crate) fn write_id_list(path: &Path, ids: &BTreeSet<String>) -> Result<()> {
    let file = File::create(path).map_err(|e| CellMeshError::io(path, "create id list", e))?;
    let mut writer = BufWriter::new(file);
    for id in ids {
        writeln!(writer, "{}", id).map_err(|e| CellMeshError::io(path, "write id list", e))?;
    }
    writer
        .flush()
        .map_err(|e| CellMeshError::io(path, "flush id list", e))
}

// ============================================================================
// Reading
// ============================================================================

fn read_batches(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = File::open(path).map_err(|e| CellMeshError::io(path, "open table file", e))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    let mut batches = Vec::new();
    for batch in reader {
        batches.push(batch?);
    }
    Ok(batches)
}

fn column<'b, A: Array + 'static>(
    batch: &'b RecordBatch,
    name: &str,
    expected: &str,
    path: &Path,
) -> Result<&'b A> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<A>())
        .ok_or_else(|| {
            CellMeshError::format(path, format!("expected {} column '{}'", expected, name))
        })
}

fn read_cells(path: &Path) -> Result<Vec<CellType>> {
    let mut cells = Vec::new();
    for batch in read_batches(path)? {
        let ids = column::<StringArray>(&batch, "cell_id", "Utf8", path)?;
        let names = column::<StringArray>(&batch, "cell_name", "Utf8", path)?;
        for i in 0..batch.num_rows() {
            cells.push(CellType::new(ids.value(i), names.value(i)));
        }
    }
    Ok(cells)
}

fn read_genes(path: &Path) -> Result<Vec<(String, u32)>> {
    let mut genes = Vec::new();
    for batch in read_batches(path)? {
        let symbols = column::<StringArray>(&batch, "gene", "Utf8", path)?;
        let taxids = column::<UInt32Array>(&batch, "taxid", "UInt32", path)?;
        for i in 0..batch.num_rows() {
            genes.push((symbols.value(i).to_string(), taxids.value(i)));
        }
    }
    Ok(genes)
}

fn read_cell_gene(path: &Path) -> Result<Vec<CooccurrenceRecord>> {
    let mut records = Vec::new();
    for batch in read_batches(path)? {
        let cell_ids = column::<StringArray>(&batch, "cell_id", "Utf8", path)?;
        let genes = column::<StringArray>(&batch, "gene", "Utf8", path)?;
        let taxids = column::<UInt32Array>(&batch, "taxid", "UInt32", path)?;
        let counts = column::<UInt64Array>(&batch, "count", "UInt64", path)?;
        let pmids = column::<StringArray>(&batch, "pmids", "Utf8", path)?;
        for i in 0..batch.num_rows() {
            records.push(CooccurrenceRecord {
                cell_id: cell_ids.value(i).to_string(),
                gene: genes.value(i).to_string(),
                taxonomy_id: taxids.value(i),
                count: counts.value(i),
                pmids: pmids.value(i).to_string(),
            });
        }
    }
    Ok(records)
}

/// Read one id per line, trimming whitespace and skipping blank lines.
pub(crate) fn read_id_list(path: &Path) -> Result<BTreeSet<String>> {
    let file = File::open(path).map_err(|e| CellMeshError::io(path, "open id list", e))?;
    let mut ids = BTreeSet::new();
    for line in BufReader::new(file).lines() {
        let line = line.map_err(|e| CellMeshError::io(path, "read id list", e))?;
        let id = line.trim();
        if !id.is_empty() && !id.starts_with('#') {
            ids.insert(id.to_string());
        }
    }
    Ok(ids)
}

/// Remove a store directory's table files, leaving unrelated files alone.
pub(crate) fn clear_store_files(store_dir: &Path) -> Result<()> {
    let names = [files::MANIFEST, files::CELLS, files::GENES, files::CELL_GENE]
        .into_iter()
        .chain(CatalogCategory::ALL.iter().map(|c| c.file_name()));
    for name in names {
        let path = store_dir.join(name);
        if path.is_file() {
            fs::remove_file(&path).map_err(|e| CellMeshError::io(&path, "remove", e))?;
        }
    }
    Ok(())
}
