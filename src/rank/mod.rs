//! Cell-type ranking for a query gene list.
//!
//! A ranking call runs in three stages:
//! 1. `candidates`: read the catalog, the species gene universe and each
//!    cell's profile from the store; keep cells overlapping the query
//! 2. `dispatch`: score every candidate with [`score_cell`], optionally on a
//!    worker pool
//! 3. merge scores into the candidate metadata by cell id and sort
//!
//! Only stage 1 touches the store. A failure anywhere aborts the call; no
//! partial ranking is ever returned.

mod candidates;
mod dispatch;
mod scoring;

pub use scoring::{score_cell, GeneDistribution, GeneWeight};

use std::cmp::Ordering;
use std::time::Instant;

use crate::config::RankConfig;
use crate::error::Result;
use crate::logging::log_timing;
use crate::species::Species;
use crate::store::ReferenceStore;
use crate::types::{Query, ScoredResult};

use candidates::{collect_candidates, gene_universe_size, ScoringTask};
use dispatch::{score_tasks, ScoringParams};

/// Rank every catalog cell sharing at least one gene with `query`.
///
/// # Arguments
/// * `store` - Reference store to read cells, genes and profiles from
/// * `query` - Normalized query gene list
/// * `species` - Species whose gene tables are used
/// * `config` - Worker count, count threshold, smoothing factor and catalog scope
///
/// # Returns
/// Results sorted by descending score, ties broken by ascending cell id.
/// Empty when no cell overlaps the query.
///
/// # Errors
/// `InvalidArgument` for an invalid config (checked before any store access),
/// `StoreUnavailable` when a store lookup fails.
pub fn rank_cells<S: ReferenceStore + ?Sized>(
    store: &S,
    query: &Query,
    species: Species,
    config: &RankConfig,
) -> Result<Vec<ScoredResult>> {
    config.validate()?;
    let taxonomy_id = species.taxonomy_id();

    let t_setup = Instant::now();
    let universe_size = gene_universe_size(store, taxonomy_id)?;
    let (num_cells, candidates) = collect_candidates(
        store,
        query,
        taxonomy_id,
        config.count_threshold,
        &config.catalog,
    )?;
    log_timing("rank: candidate setup", t_setup.elapsed());

    log::info!(
        "{} of {} cells overlap the {}-gene query ({} genes known for {})",
        candidates.len(),
        num_cells,
        query.len(),
        universe_size,
        species
    );

    let oversized = oversized_profiles(&candidates.tasks, universe_size);
    if oversized > 0 {
        log::warn!(
            "{} candidate profiles carry more genes than the {} gene table lists; \
             absent-gene steps for those cells are zero",
            oversized,
            species
        );
    }

    let t_score = Instant::now();
    let scores = score_tasks(
        ScoringParams {
            query,
            alpha: config.alpha,
            universe_size,
        },
        &candidates.tasks,
        config.workers,
    )?;
    log_timing("rank: scoring", t_score.elapsed());

    let mut metadata = candidates.metadata;
    let mut results: Vec<ScoredResult> = scores
        .into_iter()
        .filter_map(|s| {
            metadata.remove(&s.cell_id).map(|meta| ScoredResult {
                cell_id: meta.cell.id,
                cell_name: meta.cell.name,
                score: s.score,
                overlapping_genes: meta.overlapping_genes,
                pmids: meta.pmids,
            })
        })
        .collect();

    sort_ranked(&mut results);
    Ok(results)
}

/// Parse `species` and `genes`, then rank.
///
/// All arguments are validated before the store is touched.
pub fn rank_gene_list<S, G>(
    store: &S,
    genes: &[G],
    species: &str,
    config: &RankConfig,
) -> Result<Vec<ScoredResult>>
where
    S: ReferenceStore + ?Sized,
    G: AsRef<str>,
{
    let species: Species = species.parse()?;
    let query = Query::new(genes)?;
    rank_cells(store, &query, species, config)
}

/// Tasks whose distinct nonzero genes outnumber the species universe.
fn oversized_profiles(tasks: &[ScoringTask], universe_size: usize) -> usize {
    tasks
        .iter()
        .filter(|t| {
            GeneDistribution::from_counts(&t.counts).map_or(0, |d| d.len()) > universe_size
        })
        .count()
}

/// Descending by score, then ascending by cell id.
pub(crate) fn sort_ranked(results: &mut [ScoredResult]) {
    results.sort_by(|a, b| compare_ranked(a, b));
}

fn compare_ranked(a: &ScoredResult, b: &ScoredResult) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.cell_id.cmp(&b.cell_id))
}
