//! Store command handlers.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

use cellmesh::{build_store, CatalogCategory, ParquetStore, Species, StoreTables};

/// Build a store directory from tab-separated tables.
pub fn run_store_build(
    output: &Path,
    cells: PathBuf,
    genes: PathBuf,
    cell_gene: PathBuf,
    exclusions: [(CatalogCategory, Option<PathBuf>); 3],
) -> Result<()> {
    let tables = StoreTables {
        cells,
        genes,
        cell_gene,
        exclusions: exclusions
            .into_iter()
            .filter_map(|(category, path)| path.map(|p| (category, p)))
            .collect(),
    };

    log::info!("Building store at {}", output.display());
    let start = Instant::now();
    let manifest = build_store(&tables, output)
        .with_context(|| format!("Failed to build store at {}", output.display()))?;
    log::info!(
        "Built store in {:.2?}: {} cells, {} genes, {} records",
        start.elapsed(),
        manifest.num_cells,
        manifest.num_genes,
        manifest.num_records
    );

    println!("Store written to: {}", output.display());
    println!("  Cells: {}", manifest.num_cells);
    println!("  Genes: {}", manifest.num_genes);
    println!("  Co-occurrence records: {}", manifest.num_records);
    Ok(())
}

fn taxid_label(taxonomy_id: u32) -> String {
    match Species::from_taxonomy_id(taxonomy_id) {
        Some(species) => format!("{} ({})", taxonomy_id, species),
        None => taxonomy_id.to_string(),
    }
}

/// Print table sizes of a store.
pub fn run_store_info(store_dir: &Path) -> Result<()> {
    let store = ParquetStore::open(store_dir)
        .with_context(|| format!("Failed to open store: {}", store_dir.display()))?;
    let manifest = store.manifest();
    let summary = store.summary();

    println!("Store: {}", store_dir.display());
    println!("  Format version: {}", manifest.format_version);
    println!("  Cells: {}", summary.num_cells);
    println!("  Co-occurrence records: {}", summary.num_records);

    println!("\nGenes per species:");
    for (taxid, count) in &summary.genes_per_taxid {
        println!("  {}: {}", taxid_label(*taxid), count);
    }

    println!("\nRecords per species:");
    for (taxid, count) in &summary.records_per_taxid {
        println!("  {}: {}", taxid_label(*taxid), count);
    }

    println!("\nExclusion lists:");
    for category in CatalogCategory::ALL {
        match summary.exclusion_sizes.get(&category) {
            Some(size) => println!("  {}: {} ids", category.label(), size),
            None => println!("  {}: none", category.label()),
        }
    }
    Ok(())
}
