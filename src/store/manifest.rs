//! Store manifest.
//!
//! Stored as TOML for human readability and easy inspection.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::files;
use crate::constants::{STORE_FORMAT_MAGIC, STORE_FORMAT_VERSION};
use crate::error::{CellMeshError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreManifest {
    /// Magic string for format identification.
    pub magic: String,

    /// Format version for compatibility checking.
    pub format_version: u32,

    pub num_cells: u64,
    pub num_genes: u64,
    pub num_records: u64,

    /// Taxonomy ids with at least one gene.
    #[serde(default)]
    pub taxonomy_ids: Vec<u32>,
}

impl StoreManifest {
    pub fn new() -> Self {
        Self {
            magic: STORE_FORMAT_MAGIC.to_string(),
            format_version: STORE_FORMAT_VERSION,
            num_cells: 0,
            num_genes: 0,
            num_records: 0,
            taxonomy_ids: Vec::new(),
        }
    }

    pub fn save(&self, store_dir: &Path) -> Result<()> {
        let path = store_dir.join(files::MANIFEST);
        let toml_str = toml::to_string_pretty(self).map_err(|e| {
            CellMeshError::format(&path, format!("failed to serialize manifest: {}", e))
        })?;
        fs::write(&path, toml_str).map_err(|e| CellMeshError::io(&path, "write manifest", e))
    }

    /// Load and validate the manifest of a store directory.
    pub fn load(store_dir: &Path) -> Result<Self> {
        let path = store_dir.join(files::MANIFEST);
        let contents =
            fs::read_to_string(&path).map_err(|e| CellMeshError::io(&path, "read manifest", e))?;
        let manifest: StoreManifest = toml::from_str(&contents)
            .map_err(|e| CellMeshError::format(&path, format!("invalid manifest: {}", e)))?;

        if manifest.magic != STORE_FORMAT_MAGIC {
            return Err(CellMeshError::format(
                &path,
                format!(
                    "expected magic '{}', found '{}'",
                    STORE_FORMAT_MAGIC, manifest.magic
                ),
            ));
        }
        if manifest.format_version > STORE_FORMAT_VERSION {
            return Err(CellMeshError::format(
                &path,
                format!(
                    "store format version {} is newer than supported version {}",
                    manifest.format_version, STORE_FORMAT_VERSION
                ),
            ));
        }
        Ok(manifest)
    }
}

impl Default for StoreManifest {
    fn default() -> Self {
        Self::new()
    }
}
