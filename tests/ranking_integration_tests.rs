//! Ranking integration tests against an in-memory store.

use anyhow::Result;
use cellmesh::{
    rank_cells, rank_gene_list, CatalogCategory, CatalogFilter, CellMeshError, CellType,
    CooccurrenceRecord, ErrorKind, MemoryStore, ProfileEntry, Query, RankConfig, ReferenceStore,
    Species,
};

const HUMAN: u32 = 9606;
const MOUSE: u32 = 10090;

fn record(cell_id: &str, gene: &str, taxonomy_id: u32, count: u64, pmids: &str) -> CooccurrenceRecord {
    CooccurrenceRecord {
        cell_id: cell_id.to_string(),
        gene: gene.to_string(),
        taxonomy_id,
        count,
        pmids: pmids.to_string(),
    }
}

/// Ten human genes, three cells. Only B and T cells overlap a CD79A/MS4A1 query.
fn immune_store() -> MemoryStore {
    let mut store = MemoryStore::new();
    for gene in [
        "CD79A", "MS4A1", "CD19", "CD3E", "CD4", "CD8A", "NKG7", "GNLY", "LYZ", "CD14",
    ] {
        store.add_gene(HUMAN, gene);
    }
    store
        .add_cell("D001402", "B-Lymphocytes")
        .add_cell("D013601", "T-Lymphocytes")
        .add_cell("D008264", "Macrophages");
    store
        .add_record(record("D001402", "CD79A", HUMAN, 8, "29133525,27758042"))
        .add_record(record("D001402", "MS4A1", HUMAN, 2, "30104690"))
        .add_record(record("D013601", "CD3E", HUMAN, 6, "1"))
        .add_record(record("D013601", "CD4", HUMAN, 3, "2"))
        .add_record(record("D013601", "CD79A", HUMAN, 1, "3"))
        .add_record(record("D008264", "LYZ", HUMAN, 5, "4"))
        .add_record(record("D008264", "CD14", HUMAN, 5, "5"));
    store
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn test_overlapping_cells_ranked_best_first() -> Result<()> {
    let store = immune_store();
    let results = rank_gene_list(&store, &["cd79a", "ms4a1"], "human", &RankConfig::default())?;

    assert_eq!(results.len(), 2, "macrophages share no query gene");
    assert_eq!(results[0].cell_id, "D001402");
    assert_eq!(results[0].cell_name, "B-Lymphocytes");
    assert_eq!(results[1].cell_id, "D013601");

    // ln(8/10) + ln(2/10)
    assert_close(results[0].score, 0.8f64.ln() + 0.2f64.ln());
    // ln(1/10) - ln(10 - 3)
    assert_close(results[1].score, 0.1f64.ln() - 7f64.ln());

    Ok(())
}

#[test]
fn test_overlap_and_pmids_reported() -> Result<()> {
    let store = immune_store();
    let results = rank_gene_list(&store, &["CD79A", "MS4A1", "CD19"], "homo sapiens", &RankConfig::default())?;

    let b_cells = &results[0];
    assert_eq!(b_cells.overlapping_genes, vec!["CD79A", "MS4A1"]);
    assert_eq!(
        b_cells.pmids.get("CD79A"),
        Some(&vec!["29133525".to_string(), "27758042".to_string()])
    );
    assert_eq!(b_cells.pmids.get("MS4A1"), Some(&vec!["30104690".to_string()]));
    assert!(!b_cells.pmids.contains_key("CD19"));

    let t_cells = &results[1];
    assert_eq!(t_cells.overlapping_genes, vec!["CD79A"]);
    assert_eq!(t_cells.pmids.len(), 1);

    Ok(())
}

#[test]
fn test_count_threshold_is_strict() -> Result<()> {
    let store = immune_store();
    let query = Query::new(["CD79A", "MS4A1"])?;
    let config = RankConfig::default().with_count_threshold(1);

    let results = rank_cells(&store, &query, Species::Human, &config)?;
    assert_eq!(results.len(), 1, "T cells' single CD79A count is not above 1");
    assert_eq!(results[0].cell_id, "D001402");

    let config = RankConfig::default().with_count_threshold(2);
    let results = rank_cells(&store, &query, Species::Human, &config)?;
    assert_eq!(results.len(), 1);
    // MS4A1 (count 2) drops out of the B cell profile; only CD79A remains.
    assert_eq!(results[0].overlapping_genes, vec!["CD79A"]);
    assert_close(results[0].score, 0.0 - 9f64.ln());

    Ok(())
}

#[test]
fn test_smoothing_shifts_every_score_equally_at_one_half() -> Result<()> {
    let store = immune_store();
    let query = Query::new(["CD79A", "MS4A1"])?;

    let plain = rank_cells(&store, &query, Species::Human, &RankConfig::default())?;
    let smoothed = rank_cells(
        &store,
        &query,
        Species::Human,
        &RankConfig::default().with_alpha(Some(0.5)),
    )?;

    assert_eq!(plain.len(), smoothed.len());
    for (p, s) in plain.iter().zip(&smoothed) {
        assert_eq!(p.cell_id, s.cell_id);
        assert_close(s.score, p.score + 2.0 * 0.5f64.ln());
    }
    Ok(())
}

#[test]
fn test_no_overlap_returns_empty() -> Result<()> {
    let store = immune_store();
    let results = rank_gene_list(&store, &["FOXP3"], "human", &RankConfig::default())?;
    assert!(results.is_empty());
    Ok(())
}

#[test]
fn test_ties_broken_by_cell_id() -> Result<()> {
    let mut store = MemoryStore::new();
    store.add_gene(HUMAN, "CD79A").add_gene(HUMAN, "CD19");
    for id in ["D3", "D1", "D2"] {
        store
            .add_cell(id, format!("cell {}", id))
            .add_record(record(id, "CD79A", HUMAN, 4, ""));
    }

    let results = rank_gene_list(&store, &["CD79A"], "human", &RankConfig::default())?;
    let ids: Vec<&str> = results.iter().map(|r| r.cell_id.as_str()).collect();
    assert_eq!(ids, vec!["D1", "D2", "D3"]);
    Ok(())
}

#[test]
fn test_worker_count_does_not_change_results() -> Result<()> {
    let mut store = MemoryStore::new();
    let genes: Vec<String> = (0..40).map(|g| format!("GENE{}", g)).collect();
    for gene in &genes {
        store.add_gene(HUMAN, gene.as_str());
    }
    for c in 0..60u64 {
        let id = format!("D{:06}", c);
        store.add_cell(id.as_str(), format!("cell {}", c));
        for (g, gene) in genes.iter().enumerate() {
            let count = (c * 7 + g as u64 * 13) % 11;
            if count > 0 && (c + g as u64) % 3 != 0 {
                store.add_record(record(&id, gene, HUMAN, count, "1"));
            }
        }
    }

    let query = Query::new(["GENE1", "GENE5", "GENE9", "GENE22", "GENE39"])?;
    let sequential = rank_cells(&store, &query, Species::Human, &RankConfig::default())?;
    assert!(!sequential.is_empty());

    for workers in [2, 4, 7] {
        let parallel = rank_cells(
            &store,
            &query,
            Species::Human,
            &RankConfig::default().with_workers(workers),
        )?;
        assert_eq!(parallel.len(), sequential.len());
        for (s, p) in sequential.iter().zip(&parallel) {
            assert_eq!(s.cell_id, p.cell_id, "workers={}", workers);
            assert_eq!(s.score.to_bits(), p.score.to_bits(), "workers={}", workers);
            assert_eq!(s.overlapping_genes, p.overlapping_genes);
        }
    }
    Ok(())
}

#[test]
fn test_species_tables_are_isolated() -> Result<()> {
    let mut store = immune_store();
    store
        .add_gene(MOUSE, "CD79A")
        .add_record(record("D008264", "CD79A", MOUSE, 50, "9"));

    let human = rank_gene_list(&store, &["CD79A"], "human", &RankConfig::default())?;
    assert!(human.iter().all(|r| r.cell_id != "D008264"));

    let mouse = rank_gene_list(&store, &["CD79A"], "mus_musculus", &RankConfig::default())?;
    assert_eq!(mouse.len(), 1);
    assert_eq!(mouse[0].cell_id, "D008264");
    assert_close(mouse[0].score, 0.0);
    Ok(())
}

#[test]
fn test_catalog_exclusions() -> Result<()> {
    let mut store = immune_store();
    store.set_exclusions(CatalogCategory::CellLines, ["D013601"]);
    let query = Query::new(["CD79A"])?;

    let default = rank_cells(&store, &query, Species::Human, &RankConfig::default())?;
    assert_eq!(default.len(), 1);
    assert_eq!(default[0].cell_id, "D001402");

    let with_lines = RankConfig::default().with_catalog(CatalogFilter::all());
    let all = rank_cells(&store, &query, Species::Human, &with_lines)?;
    assert_eq!(all.len(), 2);
    Ok(())
}

#[test]
fn test_invalid_arguments() {
    let store = immune_store();
    let config = RankConfig::default();

    let err = rank_gene_list(&store, &["CD79A"], "yeast", &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let empty: [&str; 0] = [];
    let err = rank_gene_list(&store, &empty, "human", &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    for alpha in [0.0, 1.0, -0.2, f64::NAN] {
        let err = rank_gene_list(&store, &["CD79A"], "human", &config.with_alpha(Some(alpha)))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument, "alpha={}", alpha);
    }

    let err = rank_gene_list(&store, &["CD79A"], "human", &config.with_workers(0)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

/// Store whose every lookup fails.
struct OfflineStore;

impl ReferenceStore for OfflineStore {
    fn list_cells(&self, _filter: &CatalogFilter) -> cellmesh::Result<Vec<CellType>> {
        Err(CellMeshError::store_unavailable("connection refused"))
    }

    fn list_genes(&self, _taxonomy_id: u32) -> cellmesh::Result<Vec<String>> {
        Err(CellMeshError::store_unavailable("connection refused"))
    }

    fn cell_gene_profile(
        &self,
        _cell_id: &str,
        _taxonomy_id: u32,
        _count_threshold: u64,
    ) -> cellmesh::Result<Vec<ProfileEntry>> {
        Err(CellMeshError::store_unavailable("connection refused"))
    }
}

#[test]
fn test_store_failure_aborts_ranking() {
    let err = rank_gene_list(&OfflineStore, &["CD79A"], "human", &RankConfig::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);

    // Argument checks still come first.
    let err = rank_gene_list(&OfflineStore, &["CD79A"], "yeast", &RankConfig::default())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

/// Hands back profile rows without applying the count threshold.
struct UnthresholdedStore;

impl ReferenceStore for UnthresholdedStore {
    fn list_cells(&self, _filter: &CatalogFilter) -> cellmesh::Result<Vec<CellType>> {
        Ok(vec![
            CellType::new("D1", "Unobserved"),
            CellType::new("D2", "B-Lymphocytes"),
        ])
    }

    fn list_genes(&self, _taxonomy_id: u32) -> cellmesh::Result<Vec<String>> {
        Ok(vec!["CD79A".to_string(), "MS4A1".to_string()])
    }

    fn cell_gene_profile(
        &self,
        cell_id: &str,
        _taxonomy_id: u32,
        _count_threshold: u64,
    ) -> cellmesh::Result<Vec<ProfileEntry>> {
        Ok(match cell_id {
            "D1" => vec![ProfileEntry::new("CD79A", "11", 0)],
            _ => vec![ProfileEntry::new("CD79A", "12", 5)],
        })
    }
}

#[test]
fn test_zero_mass_cell_ranks_last() -> Result<()> {
    for workers in [1, 4] {
        let config = RankConfig::default().with_workers(workers);
        let results = rank_gene_list(&UnthresholdedStore, &["CD79A"], "human", &config)?;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].cell_id, "D2");
        assert_close(results[0].score, 0.0);
        assert_eq!(results[1].cell_id, "D1");
        assert_eq!(results[1].score, f64::NEG_INFINITY);
        assert_eq!(results[1].overlapping_genes, vec!["CD79A"]);
    }
    Ok(())
}
