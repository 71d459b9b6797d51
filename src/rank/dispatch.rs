//! Scoring fan-out over a bounded worker pool.

use rayon::prelude::*;

use super::candidates::ScoringTask;
use super::scoring::score_cell;
use crate::error::{CellMeshError, Result};
use crate::types::{CellScore, Query};

/// Shared, read-only inputs of every scoring task.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScoringParams<'a> {
    pub query: &'a Query,
    pub alpha: Option<f64>,
    pub universe_size: usize,
}

fn run_task(params: &ScoringParams<'_>, task: &ScoringTask) -> CellScore {
    CellScore {
        cell_id: task.cell_id.clone(),
        score: score_cell(
            params.query.genes(),
            &task.counts,
            params.alpha,
            params.universe_size,
        ),
    }
}

/// Threads for a pool: never more than there are tasks.
fn pool_size(workers: usize, num_tasks: usize) -> usize {
    workers.min(num_tasks).max(1)
}

/// Score every task, sequentially for one worker or on a dedicated pool of
/// `workers` threads otherwise.
///
/// Results come back in no particular order; callers re-associate them by
/// cell id. Tasks cannot fail: inputs are validated before dispatch.
pub(crate) fn score_tasks(
    params: ScoringParams<'_>,
    tasks: &[ScoringTask],
    workers: usize,
) -> Result<Vec<CellScore>> {
    if workers <= 1 || tasks.len() <= 1 {
        return Ok(tasks.iter().map(|t| run_task(&params, t)).collect());
    }

    let threads = pool_size(workers, tasks.len());
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("cellmesh-score-{}", i))
        .build()
        .map_err(|e| {
            CellMeshError::invalid_argument(format!(
                "could not start {} scoring workers: {}",
                threads, e
            ))
        })?;

    Ok(pool.install(|| {
        tasks
            .par_iter()
            .map(|t| run_task(&params, t))
            .collect()
    }))
}
