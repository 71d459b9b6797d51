//! Reference store interface and implementations.
//!
//! The ranking engine only talks to a [`ReferenceStore`]. Two implementations
//! are provided:
//! - [`MemoryStore`]: tables held in hash maps, built programmatically
//! - [`ParquetStore`]: a store directory of Parquet tables, loaded into a `MemoryStore`
//!
//! # Store directory layout
//!
//! ```text
//! store/
//! ├── manifest.toml           # magic, format version, table row counts
//! ├── cells.parquet           # cell_id, cell_name
//! ├── genes.parquet           # gene, taxid
//! ├── cell_gene.parquet       # cell_id, gene, taxid, count, pmids
//! ├── cell_component_ids.txt  # optional exclusion lists, one id per line
//! ├── chromosome_ids.txt
//! └── cell_line_ids.txt
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::types::{CellType, ProfileEntry};

pub mod builder;
pub mod manifest;
mod memory;
mod parquet_store;

pub use builder::{build_store, StoreTables};
pub use manifest::StoreManifest;
pub use memory::MemoryStore;
pub use parquet_store::{is_store_dir, ParquetStore};

/// File names within a store directory.
pub mod files {
    pub const MANIFEST: &str = "manifest.toml";
    pub const CELLS: &str = "cells.parquet";
    pub const GENES: &str = "genes.parquet";
    pub const CELL_GENE: &str = "cell_gene.parquet";
}

/// Structural MeSH categories that can be excluded from the candidate catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CatalogCategory {
    CellComponents,
    Chromosomes,
    CellLines,
}

impl CatalogCategory {
    pub const ALL: [CatalogCategory; 3] = [
        CatalogCategory::CellComponents,
        CatalogCategory::Chromosomes,
        CatalogCategory::CellLines,
    ];

    /// Exclusion list file name inside a store directory.
    pub const fn file_name(self) -> &'static str {
        match self {
            CatalogCategory::CellComponents => "cell_component_ids.txt",
            CatalogCategory::Chromosomes => "chromosome_ids.txt",
            CatalogCategory::CellLines => "cell_line_ids.txt",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            CatalogCategory::CellComponents => "cell components",
            CatalogCategory::Chromosomes => "chromosomes",
            CatalogCategory::CellLines => "cell lines",
        }
    }
}

/// Which structural categories take part in ranking.
///
/// Defaults keep cell components and drop chromosomes and cell lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFilter {
    pub include_cell_components: bool,
    pub include_chromosomes: bool,
    pub include_cell_lines: bool,
}

impl Default for CatalogFilter {
    fn default() -> Self {
        Self {
            include_cell_components: true,
            include_chromosomes: false,
            include_cell_lines: false,
        }
    }
}

impl CatalogFilter {
    /// Keep every category.
    pub fn all() -> Self {
        Self {
            include_cell_components: true,
            include_chromosomes: true,
            include_cell_lines: true,
        }
    }

    /// Categories whose ids must be removed from the catalog.
    pub fn excluded(&self) -> Vec<CatalogCategory> {
        CatalogCategory::ALL
            .into_iter()
            .filter(|c| !self.includes(*c))
            .collect()
    }

    pub fn includes(&self, category: CatalogCategory) -> bool {
        match category {
            CatalogCategory::CellComponents => self.include_cell_components,
            CatalogCategory::Chromosomes => self.include_chromosomes,
            CatalogCategory::CellLines => self.include_cell_lines,
        }
    }
}

/// Read-only lookups the ranking engine needs from a reference store.
pub trait ReferenceStore {
    /// All cells in the catalog scope, unique by id, in a stable order.
    fn list_cells(&self, filter: &CatalogFilter) -> Result<Vec<CellType>>;

    /// All gene symbols recorded for a taxonomy id, case as stored.
    fn list_genes(&self, taxonomy_id: u32) -> Result<Vec<String>>;

    /// Genes co-occurring with `cell_id` under `taxonomy_id` whose count is
    /// strictly greater than `count_threshold`.
    fn cell_gene_profile(
        &self,
        cell_id: &str,
        taxonomy_id: u32,
        count_threshold: u64,
    ) -> Result<Vec<ProfileEntry>>;
}

impl<S: ReferenceStore + ?Sized> ReferenceStore for &S {
    fn list_cells(&self, filter: &CatalogFilter) -> Result<Vec<CellType>> {
        (**self).list_cells(filter)
    }

    fn list_genes(&self, taxonomy_id: u32) -> Result<Vec<String>> {
        (**self).list_genes(taxonomy_id)
    }

    fn cell_gene_profile(
        &self,
        cell_id: &str,
        taxonomy_id: u32,
        count_threshold: u64,
    ) -> Result<Vec<ProfileEntry>> {
        (**self).cell_gene_profile(cell_id, taxonomy_id, count_threshold)
    }
}

/// Table sizes of a store, for inspection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSummary {
    pub num_cells: usize,
    /// Distinct gene symbols per taxonomy id.
    pub genes_per_taxid: BTreeMap<u32, usize>,
    pub num_records: usize,
    /// Records per taxonomy id.
    pub records_per_taxid: BTreeMap<u32, usize>,
    pub exclusion_sizes: BTreeMap<CatalogCategory, usize>,
}
