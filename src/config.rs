//! Ranking configuration and TOML query files.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_COUNT_THRESHOLD, DEFAULT_WORKERS};
use crate::error::CellMeshError;
use crate::store::CatalogFilter;

/// Parameters of one ranking call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankConfig {
    /// Scoring workers (>= 1). One worker scores on the calling thread.
    pub workers: usize,
    /// Genes co-occur with a cell when their count is strictly greater than this.
    pub count_threshold: u64,
    /// Optional smoothing factor in (0, 1).
    pub alpha: Option<f64>,
    pub catalog: CatalogFilter,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            count_threshold: DEFAULT_COUNT_THRESHOLD,
            alpha: None,
            catalog: CatalogFilter::default(),
        }
    }
}

impl RankConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_count_threshold(mut self, count_threshold: u64) -> Self {
        self.count_threshold = count_threshold;
        self
    }

    pub fn with_alpha(mut self, alpha: Option<f64>) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_catalog(mut self, catalog: CatalogFilter) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn validate(&self) -> crate::error::Result<()> {
        if self.workers < 1 {
            return Err(CellMeshError::invalid_argument(
                "worker count must be at least 1",
            ));
        }
        if let Some(alpha) = self.alpha {
            if !(alpha > 0.0 && alpha < 1.0) {
                return Err(CellMeshError::invalid_argument(format!(
                    "smoothing factor must be in (0, 1), got {}",
                    alpha
                )));
            }
        }
        Ok(())
    }
}

// ============================================================================
// QueryConfig - TOML query files
// ============================================================================

/// A ranking request read from TOML.
///
/// ```toml
/// store = "cellmesh_store"
/// species = "mouse"
/// genes = ["CD79A", "MS4A1"]
///
/// [params]
/// workers = 4
/// count_threshold = 3
/// alpha = 0.5
///
/// [catalog]
/// include_cell_lines = true
/// ```
#[derive(Debug, Deserialize)]
pub struct QueryConfig {
    pub store: Option<PathBuf>,
    #[serde(default = "default_species")]
    pub species: String,
    #[serde(default)]
    pub genes: Vec<String>,
    /// File with one gene per line, appended after `genes`.
    pub genes_file: Option<PathBuf>,
    #[serde(default)]
    pub params: QueryParams,
    #[serde(default)]
    pub catalog: CatalogFilter,
}

fn default_species() -> String {
    "human".to_string()
}

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub count_threshold: u64,
    pub alpha: Option<f64>,
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            count_threshold: DEFAULT_COUNT_THRESHOLD,
            alpha: None,
        }
    }
}

impl QueryConfig {
    pub fn rank_config(&self) -> RankConfig {
        RankConfig {
            workers: self.params.workers,
            count_threshold: self.params.count_threshold,
            alpha: self.params.alpha,
            catalog: self.catalog,
        }
    }
}

pub fn parse_query_config(path: &Path) -> Result<QueryConfig> {
    let contents = fs::read_to_string(path)
        .context(format!("Failed to read query config: {}", path.display()))?;

    let config: QueryConfig =
        toml::from_str(&contents).context("Failed to parse TOML query config")?;

    config
        .rank_config()
        .validate()
        .context(format!("Invalid parameters in {}", path.display()))?;

    Ok(config)
}

/// Resolve the config's relative paths against the config file's directory.
pub fn resolve_query_paths(config: &mut QueryConfig, config_dir: &Path) {
    if let Some(store) = config.store.as_mut() {
        *store = resolve_path(config_dir, store);
    }
    if let Some(genes_file) = config.genes_file.as_mut() {
        *genes_file = resolve_path(config_dir, genes_file);
    }
}

pub fn resolve_path(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
