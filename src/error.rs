//! Error taxonomy for the regridding pipeline.
//!
//! Every error is fatal: the pipeline is a deterministic batch transform, so
//! re-running on the same input reproduces the same failure. Messages carry
//! the offending file or variable name and the expected vs. actual shape.

use thiserror::Error;

/// Error type for all regridding operations.
#[derive(Debug, Error)]
pub enum RegridError {
    /// Index or shape inconsistency in the sparse operator source
    #[error("Malformed weight file '{path}': {reason}")]
    MalformedWeightFile { path: String, reason: String },

    /// A required field or dimension is absent from an input container
    #[error("Missing variable '{name}' in {container}")]
    MissingVariable { container: String, name: String },

    /// Shapes or dimension lengths disagree
    #[error("Dimension mismatch in {context}: expected {expected}, found {actual}")]
    DimensionMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    /// Field has neither 2 nor 3 dimensions
    #[error("Field '{name}' has unsupported rank {rank} (expected 2 or 3)")]
    UnsupportedFieldRank { name: String, rank: usize },

    /// Vertical coordinate is not strictly increasing
    #[error("Vertical coordinate '{name}' is not strictly increasing")]
    NonMonotonicCoordinate { name: String },

    /// Invalid run configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// NetCDF library error
    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCDF(#[from] netcdf::Error),
}

impl RegridError {
    /// Shorthand for a [`RegridError::MissingVariable`].
    pub fn missing(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self::MissingVariable {
            container: container.into(),
            name: name.into(),
        }
    }

    /// Shorthand for a [`RegridError::DimensionMismatch`] from two `Debug` shapes.
    pub fn mismatch(
        context: impl Into<String>,
        expected: impl std::fmt::Debug,
        actual: impl std::fmt::Debug,
    ) -> Self {
        Self::DimensionMismatch {
            context: context.into(),
            expected: format!("{:?}", expected),
            actual: format!("{:?}", actual),
        }
    }

    /// Shorthand for a [`RegridError::MalformedWeightFile`].
    pub fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedWeightFile {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RegridError>;
