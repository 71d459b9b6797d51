//! Unified error type for the cellmesh library.
//!
//! Library code returns `CellMeshError`; the CLI wraps it in `anyhow::Result`
//! for context chaining.
//!
//! # Error Categories
//!
//! Every variant maps onto one of two caller-facing kinds (see [`ErrorKind`]):
//!
//! - **InvalidArgument**: rejected before any store access (unknown species,
//!   empty query, smoothing factor outside (0, 1), zero workers)
//! - **StoreUnavailable**: the reference store could not be opened or read
//!   (I/O, malformed tables, Parquet/Arrow decoding failures)

use std::fmt;
use std::path::PathBuf;

/// Caller-facing classification of a failed ranking call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    StoreUnavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::InvalidArgument => f.write_str("invalid argument"),
            ErrorKind::StoreUnavailable => f.write_str("store unavailable"),
        }
    }
}

/// Unified error type for the cellmesh library.
#[derive(Debug)]
pub enum CellMeshError {
    /// Caller supplied an unusable argument.
    InvalidArgument(String),

    /// A store lookup failed or returned structurally invalid data.
    StoreUnavailable {
        context: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: std::io::Error,
    },

    /// Malformed store file or input table.
    Format { path: PathBuf, detail: String },

    /// Parquet or Arrow decoding/encoding error.
    Parquet {
        context: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl CellMeshError {
    /// Caller-facing kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CellMeshError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            CellMeshError::StoreUnavailable { .. }
            | CellMeshError::Io { .. }
            | CellMeshError::Format { .. }
            | CellMeshError::Parquet { .. } => ErrorKind::StoreUnavailable,
        }
    }
}

impl fmt::Display for CellMeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellMeshError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CellMeshError::StoreUnavailable { context, source } => {
                if let Some(src) = source {
                    write!(f, "Reference store unavailable ({}): {}", context, src)
                } else {
                    write!(f, "Reference store unavailable: {}", context)
                }
            }
            CellMeshError::Io {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "I/O error during {} on '{}': {}",
                    operation,
                    path.display(),
                    source
                )
            }
            CellMeshError::Format { path, detail } => {
                write!(f, "Invalid format in '{}': {}", path.display(), detail)
            }
            CellMeshError::Parquet { context, source } => {
                if let Some(src) = source {
                    write!(f, "Parquet error ({}): {}", context, src)
                } else {
                    write!(f, "Parquet error: {}", context)
                }
            }
        }
    }
}

impl std::error::Error for CellMeshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CellMeshError::Io { source, .. } => Some(source),
            CellMeshError::StoreUnavailable {
                source: Some(s), ..
            }
            | CellMeshError::Parquet {
                source: Some(s), ..
            } => Some(s.as_ref()),
            _ => None,
        }
    }
}

// ============================================================================
// Conversion traits
// ============================================================================

impl From<std::io::Error> for CellMeshError {
    fn from(err: std::io::Error) -> Self {
        CellMeshError::Io {
            path: PathBuf::new(),
            operation: "unknown",
            source: err,
        }
    }
}

impl From<parquet::errors::ParquetError> for CellMeshError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        CellMeshError::Parquet {
            context: "parquet operation".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<arrow::error::ArrowError> for CellMeshError {
    fn from(err: arrow::error::ArrowError) -> Self {
        CellMeshError::Parquet {
            context: "arrow operation".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Convenience type alias for Results using CellMeshError.
pub type Result<T> = std::result::Result<T, CellMeshError>;

// ============================================================================
// Helper constructors
// ============================================================================

impl CellMeshError {
    /// Create an invalid-argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        CellMeshError::InvalidArgument(msg.into())
    }

    /// Create a store-unavailable error without source.
    pub fn store_unavailable(context: impl Into<String>) -> Self {
        CellMeshError::StoreUnavailable {
            context: context.into(),
            source: None,
        }
    }

    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, operation: &'static str, source: std::io::Error) -> Self {
        CellMeshError::Io {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Create a format error.
    pub fn format(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        CellMeshError::Format {
            path: path.into(),
            detail: detail.into(),
        }
    }
}
