//! Build a store directory from tab-separated tables.
//!
//! Input tables (gzip-compressed when the path ends in `.gz`):
//! - cells: `cell_id<TAB>cell_name`
//! - genes: `gene<TAB>taxid`
//! - cell-gene: `cell_id<TAB>gene<TAB>taxid<TAB>count[<TAB>pmids]`
//!
//! Blank lines and lines starting with `#` are skipped. A first row whose
//! leading field equals the table's first column name is treated as a header.

use flate2::read::MultiGzDecoder;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::manifest::StoreManifest;
use super::parquet_store::{
    clear_store_files, read_id_list, write_cell_gene, write_cells, write_genes, write_id_list,
};
use super::CatalogCategory;
use crate::constants::TABLE_FIELD_SEPARATOR;
use crate::error::{CellMeshError, Result};
use crate::types::{CellType, CooccurrenceRecord};

/// Input table paths for [`build_store`].
#[derive(Debug, Clone)]
pub struct StoreTables {
    pub cells: PathBuf,
    pub genes: PathBuf,
    pub cell_gene: PathBuf,
    /// Optional exclusion id lists, one id per line.
    pub exclusions: Vec<(CatalogCategory, PathBuf)>,
}

/// Parse the input tables and write a store directory at `out_dir`.
///
/// Existing store files in `out_dir` are replaced.
pub fn build_store(tables: &StoreTables, out_dir: &Path) -> Result<StoreManifest> {
    let cells = parse_cells(&tables.cells)?;
    let genes = parse_genes(&tables.genes)?;
    let records = parse_cell_gene(&tables.cell_gene)?;

    let known: HashSet<&str> = cells.iter().map(|c| c.id.as_str()).collect();
    let orphans = records
        .iter()
        .filter(|r| !known.contains(r.cell_id.as_str()))
        .count();
    if orphans > 0 {
        log::warn!(
            "{} co-occurrence records reference cells missing from {}",
            orphans,
            tables.cells.display()
        );
    }

    fs::create_dir_all(out_dir).map_err(|e| CellMeshError::io(out_dir, "create store dir", e))?;
    clear_store_files(out_dir)?;

    write_cells(out_dir, &cells)?;
    write_genes(out_dir, &genes)?;
    write_cell_gene(out_dir, &records)?;

    for (category, path) in &tables.exclusions {
        let ids = read_id_list(path)?;
        log::info!(
            "Exclusion list for {}: {} ids from {}",
            category.label(),
            ids.len(),
            path.display()
        );
        write_id_list(&out_dir.join(category.file_name()), &ids)?;
    }

    let taxonomy_ids: BTreeSet<u32> = genes.iter().map(|(_, t)| *t).collect();
    let manifest = StoreManifest {
        num_cells: cells.len() as u64,
        num_genes: genes.len() as u64,
        num_records: records.len() as u64,
        taxonomy_ids: taxonomy_ids.into_iter().collect(),
        ..StoreManifest::new()
    };
    manifest.save(out_dir)?;

    log::info!(
        "Built store {}: {} cells, {} genes, {} co-occurrence records",
        out_dir.display(),
        manifest.num_cells,
        manifest.num_genes,
        manifest.num_records
    );
    Ok(manifest)
}

fn open_table(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|e| CellMeshError::io(path, "open table", e))?;
    if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Data rows of a table as (1-based line number, fields).
fn table_rows(path: &Path, header: &str) -> Result<Vec<(usize, Vec<String>)>> {
    let mut rows = Vec::new();
    for (idx, line) in open_table(path)?.lines().enumerate() {
        let line = line.map_err(|e| CellMeshError::io(path, "read table", e))?;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<String> = line
            .split(TABLE_FIELD_SEPARATOR)
            .map(|f| f.trim().to_string())
            .collect();
        if rows.is_empty() && fields[0].eq_ignore_ascii_case(header) {
            continue;
        }
        rows.push((idx + 1, fields));
    }
    Ok(rows)
}

fn require_fields(path: &Path, line: usize, fields: &[String], min: usize) -> Result<()> {
    if fields.len() < min || fields[..min].iter().any(|f| f.is_empty()) {
        return Err(CellMeshError::format(
            path,
            format!(
                "line {}: expected at least {} non-empty tab-separated fields, got {}",
                line,
                min,
                fields.len()
            ),
        ));
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(path: &Path, line: usize, what: &str, s: &str) -> Result<T> {
    s.parse().map_err(|_| {
        CellMeshError::format(path, format!("line {}: invalid {} '{}'", line, what, s))
    })
}

fn parse_cells(path: &Path) -> Result<Vec<CellType>> {
    let mut cells: BTreeMap<String, String> = BTreeMap::new();
    for (line, fields) in table_rows(path, "cell_id")? {
        require_fields(path, line, &fields, 2)?;
        let mut fields = fields.into_iter();
        if let (Some(id), Some(name)) = (fields.next(), fields.next()) {
            cells.entry(id).or_insert(name);
        }
    }
    Ok(cells
        .into_iter()
        .map(|(id, name)| CellType::new(id, name))
        .collect())
}

fn parse_genes(path: &Path) -> Result<Vec<(String, u32)>> {
    let mut genes = BTreeSet::new();
    for (line, fields) in table_rows(path, "gene")? {
        require_fields(path, line, &fields, 2)?;
        let taxid: u32 = parse_number(path, line, "taxid", &fields[1])?;
        genes.insert((fields[0].clone(), taxid));
    }
    Ok(genes.into_iter().collect())
}

fn parse_cell_gene(path: &Path) -> Result<Vec<CooccurrenceRecord>> {
    let mut records = Vec::new();
    for (line, fields) in table_rows(path, "cell_id")? {
        require_fields(path, line, &fields, 4)?;
        records.push(CooccurrenceRecord {
            cell_id: fields[0].clone(),
            gene: fields[1].clone(),
            taxonomy_id: parse_number(path, line, "taxid", &fields[2])?,
            count: parse_number(path, line, "count", &fields[3])?,
            pmids: fields.get(4).cloned().unwrap_or_default(),
        });
    }
    Ok(records)
}
