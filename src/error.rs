use thiserror::Error;

/// Errors returned by the reduction and clustering stages.
#[derive(Debug, Error)]
pub enum Error {
    /// The fingerprint matrix has no rows or no columns.
    #[error("empty input")]
    EmptyInput,

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },

    /// Requested cluster count is incompatible with the dataset.
    #[error("invalid cluster count: requested {requested}, but dataset has {n_items} items")]
    InvalidClusterCount {
        /// Requested number of clusters.
        requested: usize,
        /// Number of items in the dataset.
        n_items: usize,
    },

    /// Rows (or supplied centroids) have inconsistent dimensionality.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimensionality.
        expected: usize,
        /// Found dimensionality.
        found: usize,
    },

    /// A NaN or infinite entry was found.
    #[error("non-finite value at row {row}, column {col}")]
    NonFinite {
        /// Row index of the offending entry.
        row: usize,
        /// Column index of the offending entry.
        col: usize,
    },

    /// The spectral backend could not factor the centered matrix.
    #[error("decomposition failed: {0}")]
    DecompositionFailed(String),
}

/// Coarse classification of [`Error`].
///
/// Neither kind is retried: invalid input is rejected before computation, and a
/// numerical failure reproduces deterministically on the same input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Shape, parameter, or cluster-count problems detected up front.
    InvalidInput,
    /// Non-finite data or a decomposition that did not converge.
    Numerical,
}

impl Error {
    /// The taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptyInput
            | Error::InvalidParameter { .. }
            | Error::InvalidClusterCount { .. }
            | Error::DimensionMismatch { .. } => ErrorKind::InvalidInput,
            Error::NonFinite { .. } | Error::DecompositionFailed(_) => ErrorKind::Numerical,
        }
    }
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
