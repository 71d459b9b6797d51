//! Per-cell log-likelihood scoring.
//!
//! A candidate cell's profile is treated as an empirical distribution over
//! genes. Each query gene contributes `ln(weight)` when the cell carries it,
//! or the log of a uniform draw from the genes the cell does not carry.

use std::collections::HashMap;

/// Empirical weight of one gene within a cell profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneWeight {
    /// 0-based position by descending count (ties by symbol).
    ///
    /// Inert: `score_cell` does not read it. Kept so a rank-weighted variant
    /// can be introduced without reshaping the distribution.
    pub rank: usize,
    /// `count / col_sum`, always > 0.
    pub weight: f64,
}

/// Normalized gene distribution of one candidate cell.
#[derive(Debug, Clone)]
pub struct GeneDistribution<'a> {
    weights: HashMap<&'a str, GeneWeight>,
}

impl<'a> GeneDistribution<'a> {
    /// Build from (gene, count) pairs.
    ///
    /// Zero counts are skipped and repeated genes have their counts summed.
    /// Returns `None` when the profile has no count mass.
    pub fn from_counts(counts: &'a [(String, u64)]) -> Option<Self> {
        let mut merged: HashMap<&'a str, u64> = HashMap::with_capacity(counts.len());
        for (gene, count) in counts {
            if *count > 0 {
                *merged.entry(gene.as_str()).or_insert(0) += *count;
            }
        }

        let col_sum: u64 = merged.values().sum();
        if col_sum == 0 {
            return None;
        }

        let mut ordered: Vec<(&'a str, u64)> = merged.into_iter().collect();
        ordered.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        let col_sum = col_sum as f64;
        let weights = ordered
            .into_iter()
            .enumerate()
            .map(|(rank, (gene, count))| {
                (
                    gene,
                    GeneWeight {
                        rank,
                        weight: count as f64 / col_sum,
                    },
                )
            })
            .collect();

        Some(Self { weights })
    }

    /// Number of distinct genes with nonzero count.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn get(&self, gene: &str) -> Option<GeneWeight> {
        self.weights.get(gene).copied()
    }
}

/// Log-probability of drawing one specific gene the cell does not carry.
///
/// Zero when the profile covers the whole universe (or exceeds it, which only
/// happens with an inconsistent store).
#[inline]
pub(crate) fn absent_step(universe_size: usize, profile_size: usize) -> f64 {
    if universe_size > profile_size {
        -((universe_size - profile_size) as f64).ln()
    } else {
        0.0
    }
}

/// Compute the log-likelihood that `query` was drawn from a cell's gene distribution.
///
/// # Arguments
/// * `query` - Uppercased query genes, in rank order
/// * `counts` - The cell's full (gene, count) profile
/// * `alpha` - Optional smoothing factor in (0, 1); adds `ln(alpha)` per present
///   gene and `ln(1 - alpha)` per absent gene
/// * `universe_size` - Number of distinct genes known for the species
///
/// # Returns
/// The summed log-likelihood, or `-inf` when the profile has no count mass.
/// Pure: identical arguments yield bit-identical results.
pub fn score_cell(
    query: &[String],
    counts: &[(String, u64)],
    alpha: Option<f64>,
    universe_size: usize,
) -> f64 {
    let Some(dist) = GeneDistribution::from_counts(counts) else {
        return f64::NEG_INFINITY;
    };

    let absent = absent_step(universe_size, dist.len());

    let mut total = 0.0;
    for gene in query {
        total += match (dist.get(gene), alpha) {
            (Some(w), None) => w.weight.ln(),
            (Some(w), Some(a)) => w.weight.ln() + a.ln(),
            (None, None) => absent,
            (None, Some(a)) => absent + (1.0 - a).ln(),
        };
    }
    total
}
