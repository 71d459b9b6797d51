//! cellmesh: rank cell types for a marker gene list.
//!
//! Each candidate cell type (a MeSH cell id) carries a distribution of
//! literature gene co-occurrence counts. A query gene list is scored against
//! every cell sharing at least one gene with it, as the log-likelihood of the
//! query under the cell's empirical gene distribution, and cells are returned
//! best first.
//!
//! ```no_run
//! use cellmesh::{rank_cells, ParquetStore, Query, RankConfig, Species};
//!
//! # fn main() -> cellmesh::Result<()> {
//! let store = ParquetStore::open(std::path::Path::new("cellmesh_store"))?;
//! let query = Query::new(["CD79A", "MS4A1", "CD79B"])?;
//! let config = RankConfig::default().with_workers(4).with_count_threshold(3);
//! for hit in rank_cells(&store, &query, Species::Mouse, &config)?.iter().take(10) {
//!     println!("{}\t{}\t{:.4}", hit.cell_id, hit.cell_name, hit.score);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod rank;
pub mod species;
pub mod store;
pub mod types;

pub use config::{parse_query_config, QueryConfig, RankConfig};
pub use error::{CellMeshError, ErrorKind, Result};
pub use logging::{init_logger, log_timing};
pub use rank::{rank_cells, rank_gene_list, score_cell};
pub use species::Species;
pub use store::{
    build_store, is_store_dir, CatalogCategory, CatalogFilter, MemoryStore, ParquetStore,
    ReferenceStore, StoreManifest, StoreSummary, StoreTables,
};
pub use types::{
    split_pmids, CellScore, CellType, CooccurrenceRecord, ProfileEntry, Query, ScoredResult,
};
