//! In-memory reference store.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use super::{CatalogCategory, CatalogFilter, ReferenceStore, StoreSummary};
use crate::error::Result;
use crate::types::{CellType, CooccurrenceRecord, ProfileEntry};

/// Reference tables held in memory.
///
/// Cells are kept ordered by id. Co-occurrence rows are keyed by
/// (cell id, taxonomy id) so a profile lookup never sees another species.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    cells: BTreeMap<String, String>,
    genes: HashMap<u32, BTreeSet<String>>,
    profiles: HashMap<(String, u32), Vec<ProfileEntry>>,
    exclusions: BTreeMap<CatalogCategory, HashSet<String>>,
    num_records: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cell. The first name registered for an id is kept.
    pub fn add_cell(&mut self, id: impl Into<String>, name: impl Into<String>) -> &mut Self {
        self.cells.entry(id.into()).or_insert_with(|| name.into());
        self
    }

    pub fn add_gene(&mut self, taxonomy_id: u32, gene: impl Into<String>) -> &mut Self {
        self.genes.entry(taxonomy_id).or_default().insert(gene.into());
        self
    }

    pub fn add_record(&mut self, record: CooccurrenceRecord) -> &mut Self {
        self.profiles
            .entry((record.cell_id, record.taxonomy_id))
            .or_default()
            .push(ProfileEntry {
                gene: record.gene,
                pmids: record.pmids,
                count: record.count,
            });
        self.num_records += 1;
        self
    }

    /// Replace the exclusion id set of a category.
    pub fn set_exclusions<I, S>(&mut self, category: CatalogCategory, ids: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions
            .insert(category, ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclusions(&self, category: CatalogCategory) -> Option<&HashSet<String>> {
        self.exclusions.get(&category)
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn num_records(&self) -> usize {
        self.num_records
    }

    pub fn summary(&self) -> StoreSummary {
        let mut records_per_taxid = BTreeMap::new();
        for ((_, taxid), entries) in &self.profiles {
            *records_per_taxid.entry(*taxid).or_insert(0) += entries.len();
        }
        StoreSummary {
            num_cells: self.cells.len(),
            genes_per_taxid: self
                .genes
                .iter()
                .map(|(taxid, genes)| (*taxid, genes.len()))
                .collect(),
            num_records: self.num_records,
            records_per_taxid,
            exclusion_sizes: self
                .exclusions
                .iter()
                .map(|(category, ids)| (*category, ids.len()))
                .collect(),
        }
    }
}

impl ReferenceStore for MemoryStore {
    fn list_cells(&self, filter: &CatalogFilter) -> Result<Vec<CellType>> {
        let excluded: Vec<&HashSet<String>> = filter
            .excluded()
            .into_iter()
            .filter_map(|category| self.exclusions.get(&category))
            .collect();

        Ok(self
            .cells
            .iter()
            .filter(|(id, _)| !excluded.iter().any(|ids| ids.contains(*id)))
            .map(|(id, name)| CellType::new(id.clone(), name.clone()))
            .collect())
    }

    fn list_genes(&self, taxonomy_id: u32) -> Result<Vec<String>> {
        Ok(self
            .genes
            .get(&taxonomy_id)
            .map(|genes| genes.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn cell_gene_profile(
        &self,
        cell_id: &str,
        taxonomy_id: u32,
        count_threshold: u64,
    ) -> Result<Vec<ProfileEntry>> {
        Ok(self
            .profiles
            .get(&(cell_id.to_string(), taxonomy_id))
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.count > count_threshold)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
