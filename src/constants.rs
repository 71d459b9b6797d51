//! Constants shared across the cellmesh library: ranking defaults, store file
//! format identifiers, and parsing separators.

// ============================================================================
// Ranking Defaults
// ============================================================================

/// Default number of scoring workers. One worker scores sequentially.
pub const DEFAULT_WORKERS: usize = 1;

/// Default co-occurrence count threshold. A gene co-occurs with a cell when
/// its count is strictly greater than this value.
pub const DEFAULT_COUNT_THRESHOLD: u64 = 0;

// ============================================================================
// Store Format
// ============================================================================

/// Magic string written to every store manifest.
pub(crate) const STORE_FORMAT_MAGIC: &str = "CELLMESH_STORE";

/// Current store format version.
pub(crate) const STORE_FORMAT_VERSION: u32 = 1;

/// Rows per Parquet row group when writing store tables.
pub(crate) const STORE_ROW_GROUP_SIZE: usize = 100_000;

// ============================================================================
// Parsing
// ============================================================================

/// Separator between literature reference ids in a joined pmid string.
pub const PMID_SEPARATOR: char = ',';

/// Field separator of the tab-separated input tables.
pub(crate) const TABLE_FIELD_SEPARATOR: char = '\t';
