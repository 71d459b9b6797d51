//! Rank command handler.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::time::Instant;

use cellmesh::config::{parse_query_config, resolve_query_paths, QueryConfig};
use cellmesh::{rank_cells, ParquetStore, Query, RankConfig, Species};

use super::args::RankArgs;
use super::helpers::{read_genes_file, write_ranked_results};

/// Fully resolved ranking request.
struct RankRequest {
    store: PathBuf,
    species: Species,
    query: Query,
    config: RankConfig,
}

/// Merge the optional TOML query file with command-line flags and validate
/// everything before the store is opened.
fn resolve_request(args: &RankArgs) -> Result<RankRequest> {
    let file_config: Option<QueryConfig> = match &args.config {
        Some(path) => {
            let mut config = parse_query_config(path)?;
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            resolve_query_paths(&mut config, dir);
            Some(config)
        }
        None => None,
    };

    let store = args
        .store
        .clone()
        .or_else(|| file_config.as_ref().and_then(|c| c.store.clone()))
        .ok_or_else(|| anyhow!("No store given: use --store or set `store` in the query config"))?;

    let species_name = args
        .species
        .clone()
        .or_else(|| file_config.as_ref().map(|c| c.species.clone()))
        .unwrap_or_else(|| "human".to_string());
    let species: Species = species_name.parse()?;

    let mut genes: Vec<String> = Vec::new();
    if !args.genes.is_empty() || args.genes_file.is_some() {
        genes.extend(args.genes.iter().cloned());
        if let Some(path) = &args.genes_file {
            genes.extend(read_genes_file(path)?);
        }
    } else if let Some(config) = &file_config {
        genes.extend(config.genes.iter().cloned());
        if let Some(path) = &config.genes_file {
            genes.extend(read_genes_file(path)?);
        }
    }
    let query = Query::new(&genes).context("No query genes: use --gene, --genes-file or --config")?;

    let mut config = file_config
        .as_ref()
        .map(QueryConfig::rank_config)
        .unwrap_or_default();
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(threshold) = args.count_threshold {
        config.count_threshold = threshold;
    }
    if args.alpha.is_some() {
        config.alpha = args.alpha;
    }
    if args.exclude_cell_components {
        config.catalog.include_cell_components = false;
    }
    if args.include_chromosomes {
        config.catalog.include_chromosomes = true;
    }
    if args.include_cell_lines {
        config.catalog.include_cell_lines = true;
    }
    config.validate()?;

    Ok(RankRequest {
        store,
        species,
        query,
        config,
    })
}

/// Run the rank command with the given arguments.
pub fn run_rank(args: RankArgs) -> Result<()> {
    let request = resolve_request(&args)?;

    log::info!(
        "Ranking {} {} genes (workers={}, count_threshold={}, alpha={:?})",
        request.query.len(),
        request.species,
        request.config.workers,
        request.config.count_threshold,
        request.config.alpha
    );

    let store = ParquetStore::open(&request.store)
        .with_context(|| format!("Failed to open store: {}", request.store.display()))?;

    let start = Instant::now();
    let mut results = rank_cells(&store, &request.query, request.species, &request.config)?;
    log::info!(
        "Ranked {} cells in {:.2?}",
        results.len(),
        start.elapsed()
    );

    if results.is_empty() {
        log::warn!("No cell type shares a gene with the query");
    } else if let Some(best) = results.first() {
        log::info!(
            "Best match: {} ({}) score {:.4}",
            best.cell_name,
            best.cell_id,
            best.score
        );
    }

    if let Some(top) = args.top {
        results.truncate(top);
    }

    write_ranked_results(args.output.as_ref(), &results)
}
