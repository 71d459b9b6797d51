//! Build a Parquet store from tables, reopen it and rank against it.

use anyhow::Result;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use cellmesh::{
    build_store, is_store_dir, rank_gene_list, CatalogCategory, CatalogFilter, ErrorKind,
    ParquetStore, RankConfig, ReferenceStore, StoreTables,
};

fn write_tables(dir: &Path) -> Result<StoreTables> {
    let cells = dir.join("cells.tsv");
    fs::write(
        &cells,
        "cell_id\tcell_name\n\
         D001402\tB-Lymphocytes\n\
         D013601\tT-Lymphocytes\n\
         D002477\tCells\n",
    )?;

    let genes = dir.join("genes.tsv");
    fs::write(
        &genes,
        "gene\ttaxid\n\
         Cd79a\t10090\n\
         Ms4a1\t10090\n\
         Cd3e\t10090\n\
         Cd4\t10090\n\
         CD79A\t9606\n",
    )?;

    let cell_gene = dir.join("cell_gene.tsv");
    fs::write(
        &cell_gene,
        "cell_id\tgene\ttaxid\tcount\tpmids\n\
         D001402\tCd79a\t10090\t187\t29133525,27758042\n\
         D001402\tMs4a1\t10090\t12\t30104690\n\
         D013601\tCd3e\t10090\t40\t1,2\n\
         D013601\tCd79a\t10090\t2\t3\n\
         D002477\tCd79a\t10090\t9\t4\n\
         D001402\tCD79A\t9606\t30\t5\n",
    )?;

    let components = dir.join("cell_components.txt");
    fs::write(&components, "# generic cell terms\nD002477\n")?;

    Ok(StoreTables {
        cells,
        genes,
        cell_gene,
        exclusions: vec![(CatalogCategory::CellComponents, components)],
    })
}

#[test]
fn test_build_open_and_rank() -> Result<()> {
    let dir = tempdir()?;
    let tables = write_tables(dir.path())?;
    let store_dir = dir.path().join("store");

    let manifest = build_store(&tables, &store_dir)?;
    assert_eq!(manifest.num_cells, 3);
    assert_eq!(manifest.num_genes, 5);
    assert_eq!(manifest.num_records, 6);
    assert!(is_store_dir(&store_dir));

    let store = ParquetStore::open(&store_dir)?;
    assert_eq!(store.manifest(), &manifest);

    let results = rank_gene_list(&store, &["Cd79a", "Ms4a1"], "mouse", &RankConfig::default())?;
    let ids: Vec<&str> = results.iter().map(|r| r.cell_id.as_str()).collect();
    // Cell components are included by default. The single-gene D002477
    // profile puts all its mass on CD79A and outranks the B cells.
    assert_eq!(ids, vec!["D002477", "D001402", "D013601"]);

    // CD79A has weight 1, MS4A1 is one of 3 genes the cell lacks.
    assert!((results[0].score - (-(3.0f64).ln())).abs() < 1e-9);

    let b_cells = &results[1];
    assert_eq!(b_cells.overlapping_genes, vec!["CD79A", "MS4A1"]);
    let expected = (187.0f64 / 199.0).ln() + (12.0f64 / 199.0).ln();
    assert!((b_cells.score - expected).abs() < 1e-9);

    Ok(())
}

#[test]
fn test_catalog_exclusions_survive_store_round_trip() -> Result<()> {
    let dir = tempdir()?;
    let tables = write_tables(dir.path())?;
    let store_dir = dir.path().join("store");
    build_store(&tables, &store_dir)?;
    let store = ParquetStore::open(&store_dir)?;

    let filter = CatalogFilter {
        include_cell_components: false,
        ..CatalogFilter::default()
    };
    let cells = store.list_cells(&filter)?;
    assert!(cells.iter().all(|c| c.id != "D002477"));
    assert_eq!(cells.len(), 2);

    let summary = store.summary();
    assert_eq!(summary.num_cells, 3);
    assert_eq!(summary.genes_per_taxid.get(&10090), Some(&4));
    assert_eq!(summary.records_per_taxid.get(&9606), Some(&1));
    assert_eq!(
        summary.exclusion_sizes.get(&CatalogCategory::CellComponents),
        Some(&1)
    );
    Ok(())
}

#[test]
fn test_rebuild_replaces_exclusion_lists() -> Result<()> {
    let dir = tempdir()?;
    let mut tables = write_tables(dir.path())?;
    let store_dir = dir.path().join("store");
    build_store(&tables, &store_dir)?;

    tables.exclusions.clear();
    build_store(&tables, &store_dir)?;
    assert!(!store_dir
        .join(CatalogCategory::CellComponents.file_name())
        .exists());
    Ok(())
}

#[test]
fn test_open_missing_store_is_unavailable() {
    let dir = tempdir().unwrap();
    let err = ParquetStore::open(&dir.path().join("nowhere")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);

    // A directory without a manifest is not a store either.
    let err = ParquetStore::open(dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    assert!(!is_store_dir(dir.path()));
}

#[test]
fn test_corrupt_table_is_unavailable() -> Result<()> {
    let dir = tempdir()?;
    let tables = write_tables(dir.path())?;
    let store_dir = dir.path().join("store");
    build_store(&tables, &store_dir)?;

    fs::write(store_dir.join("cell_gene.parquet"), b"not parquet")?;
    let err = ParquetStore::open(&store_dir).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
    Ok(())
}
