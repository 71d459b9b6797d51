//! Core types used throughout the cellmesh library.

use std::collections::{BTreeMap, HashSet};

use crate::constants::PMID_SEPARATOR;
use crate::error::{CellMeshError, Result};

/// Cell identifier (MeSH code) and display name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CellType {
    pub id: String,
    pub name: String,
}

impl CellType {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One literature co-occurrence observation between a gene and a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CooccurrenceRecord {
    pub cell_id: String,
    pub gene: String,
    pub taxonomy_id: u32,
    pub count: u64,
    /// Comma-joined PubMed ids.
    pub pmids: String,
}

/// Gene, pmid string and count for one cell, as returned by a store profile lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileEntry {
    pub gene: String,
    pub pmids: String,
    pub count: u64,
}

impl ProfileEntry {
    pub fn new(gene: impl Into<String>, pmids: impl Into<String>, count: u64) -> Self {
        Self {
            gene: gene.into(),
            pmids: pmids.into(),
            count,
        }
    }

    /// Reference ids in stored order. Empty segments are dropped.
    pub fn pmid_list(&self) -> Vec<String> {
        split_pmids(&self.pmids)
    }
}

/// Split a comma-joined pmid string into ids, keeping order.
pub fn split_pmids(pmids: &str) -> Vec<String> {
    pmids
        .split(PMID_SEPARATOR)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ranked marker gene list, uppercased. Position 0 is the strongest marker.
///
/// Duplicated symbols are kept; each occurrence contributes its own scoring step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    genes: Vec<String>,
}

impl Query {
    /// Normalize gene symbols to uppercase, dropping blank entries.
    ///
    /// Fails with `InvalidArgument` when no symbol remains.
    pub fn new<I, S>(genes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let genes: Vec<String> = genes
            .into_iter()
            .map(|g| g.as_ref().trim().to_uppercase())
            .filter(|g| !g.is_empty())
            .collect();

        if genes.is_empty() {
            return Err(CellMeshError::invalid_argument(
                "query gene list is empty",
            ));
        }
        Ok(Self { genes })
    }

    pub fn genes(&self) -> &[String] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Distinct symbols, for overlap tests.
    pub fn gene_set(&self) -> HashSet<&str> {
        self.genes.iter().map(String::as_str).collect()
    }
}

/// Score of one candidate cell, as produced by a scoring task.
#[derive(Debug, Clone, PartialEq)]
pub struct CellScore {
    pub cell_id: String,
    pub score: f64,
}

/// Final ranked entry for one candidate cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResult {
    pub cell_id: String,
    pub cell_name: String,
    /// Natural-log likelihood. `-inf` when the cell has no count mass.
    pub score: f64,
    /// Query genes found in the cell's profile, sorted.
    pub overlapping_genes: Vec<String>,
    /// Reference ids for each overlapping gene.
    pub pmids: BTreeMap<String, Vec<String>>,
}
