//! Candidate set construction.
//!
//! Runs on the calling thread and is the only stage that touches the store.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::Result;
use crate::store::{CatalogFilter, ReferenceStore};
use crate::types::{CellType, Query};

/// Per-cell result metadata, fixed before scoring starts.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CandidateMeta {
    pub cell: CellType,
    pub overlapping_genes: Vec<String>,
    pub pmids: BTreeMap<String, Vec<String>>,
}

/// Input of one scoring task: the cell's full profile, not just the overlap.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScoringTask {
    pub cell_id: String,
    pub counts: Vec<(String, u64)>,
}

#[derive(Debug, Default)]
pub(crate) struct CandidateSet {
    pub metadata: HashMap<String, CandidateMeta>,
    pub tasks: Vec<ScoringTask>,
}

impl CandidateSet {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }
}

/// Count distinct uppercased gene symbols recorded for a taxonomy id.
pub(crate) fn gene_universe_size<S: ReferenceStore + ?Sized>(
    store: &S,
    taxonomy_id: u32,
) -> Result<usize> {
    let genes: HashSet<String> = store
        .list_genes(taxonomy_id)?
        .into_iter()
        .map(|g| g.to_uppercase())
        .collect();
    Ok(genes.len())
}

/// Fetch every catalog cell's profile and keep the cells sharing at least one
/// gene with the query.
pub(crate) fn collect_candidates<S: ReferenceStore + ?Sized>(
    store: &S,
    query: &Query,
    taxonomy_id: u32,
    count_threshold: u64,
    catalog: &CatalogFilter,
) -> Result<(usize, CandidateSet)> {
    let query_genes = query.gene_set();
    let cells = store.list_cells(catalog)?;
    let num_cells = cells.len();

    let mut set = CandidateSet::default();
    for cell in cells {
        if set.metadata.contains_key(&cell.id) {
            log::warn!("Store listed cell {} more than once; keeping the first", cell.id);
            continue;
        }

        let profile = store.cell_gene_profile(&cell.id, taxonomy_id, count_threshold)?;

        let mut counts = Vec::with_capacity(profile.len());
        let mut pmids: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for entry in profile {
            // Zero counts still overlap; the scorer drops them from the mass.
            let gene = entry.gene.to_uppercase();
            if query_genes.contains(gene.as_str()) {
                pmids
                    .entry(gene.clone())
                    .or_default()
                    .extend(entry.pmid_list());
            }
            counts.push((gene, entry.count));
        }

        if pmids.is_empty() {
            continue;
        }

        let overlapping_genes: Vec<String> = pmids.keys().cloned().collect();
        set.tasks.push(ScoringTask {
            cell_id: cell.id.clone(),
            counts,
        });
        set.metadata.insert(
            cell.id.clone(),
            CandidateMeta {
                cell,
                overlapping_genes,
                pmids,
            },
        );
    }

    Ok((num_cells, set))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{CooccurrenceRecord, ProfileEntry};

    fn record(cell: &str, gene: &str, count: u64, pmids: &str) -> CooccurrenceRecord {
        CooccurrenceRecord {
            cell_id: cell.to_string(),
            gene: gene.to_string(),
            taxonomy_id: 10090,
            count,
            pmids: pmids.to_string(),
        }
    }

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .add_cell("D001402", "B-Lymphocytes")
            .add_cell("D013601", "T-Lymphocytes")
            .add_gene(10090, "Cd79a")
            .add_gene(10090, "CD79A")
            .add_gene(10090, "Cd3e")
            .add_record(record("D001402", "Cd79a", 187, "1,2"))
            .add_record(record("D001402", "Polm", 4, "3"))
            .add_record(record("D013601", "Cd3e", 40, "4"));
        store
    }

    #[test]
    fn test_universe_counts_uppercased_distinct() {
        assert_eq!(gene_universe_size(&store(), 10090).unwrap(), 2);
        assert_eq!(gene_universe_size(&store(), 9606).unwrap(), 0);
    }

    #[test]
    fn test_non_overlapping_cells_dropped() {
        let query = Query::new(["cd79a", "ms4a1"]).unwrap();
        let (num_cells, set) =
            collect_candidates(&store(), &query, 10090, 0, &CatalogFilter::all()).unwrap();

        assert_eq!(num_cells, 2);
        assert_eq!(set.len(), 1);
        let meta = &set.metadata["D001402"];
        assert_eq!(meta.overlapping_genes, vec!["CD79A"]);
        assert_eq!(meta.pmids["CD79A"], vec!["1", "2"]);
    }

    #[test]
    fn test_task_carries_full_profile() {
        let query = Query::new(["CD79A"]).unwrap();
        let (_, set) =
            collect_candidates(&store(), &query, 10090, 0, &CatalogFilter::all()).unwrap();
        let task = &set.tasks[0];
        assert_eq!(task.cell_id, "D001402");
        assert_eq!(
            task.counts,
            vec![("CD79A".to_string(), 187), ("POLM".to_string(), 4)]
        );
    }

    #[test]
    fn test_threshold_can_remove_overlap() {
        let query = Query::new(["POLM"]).unwrap();
        let (_, set) =
            collect_candidates(&store(), &query, 10090, 4, &CatalogFilter::all()).unwrap();
        assert_eq!(set.len(), 0);
    }

    /// Returns every profile row unfiltered, zero counts included.
    struct UnfilteredStore;

    impl ReferenceStore for UnfilteredStore {
        fn list_cells(&self, _filter: &CatalogFilter) -> Result<Vec<CellType>> {
            Ok(vec![CellType::new("D1", "Empty"), CellType::new("D2", "Plasma Cells")])
        }

        fn list_genes(&self, _taxonomy_id: u32) -> Result<Vec<String>> {
            Ok(vec!["CD79A".to_string(), "JCHAIN".to_string()])
        }

        fn cell_gene_profile(
            &self,
            cell_id: &str,
            _taxonomy_id: u32,
            _count_threshold: u64,
        ) -> Result<Vec<ProfileEntry>> {
            Ok(match cell_id {
                "D1" => vec![ProfileEntry::new("Cd79a", "7", 0)],
                _ => vec![ProfileEntry::new("CD79A", "8", 5), ProfileEntry::new("JCHAIN", "", 0)],
            })
        }
    }

    #[test]
    fn test_zero_count_gene_still_overlaps() {
        let query = Query::new(["CD79A"]).unwrap();
        let (_, set) =
            collect_candidates(&UnfilteredStore, &query, 9606, 0, &CatalogFilter::all()).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.metadata["D1"].overlapping_genes, vec!["CD79A"]);
        assert_eq!(set.metadata["D1"].pmids["CD79A"], vec!["7"]);
        let d2 = set.tasks.iter().find(|t| t.cell_id == "D2").unwrap();
        assert_eq!(
            d2.counts,
            vec![("CD79A".to_string(), 5), ("JCHAIN".to_string(), 0)]
        );
    }

    #[test]
    fn test_wrong_species_has_no_candidates() {
        let query = Query::new(["CD79A"]).unwrap();
        let (_, set) =
            collect_candidates(&store(), &query, 9606, 0, &CatalogFilter::all()).unwrap();
        assert_eq!(set.len(), 0);
    }
}
