//! Execution backends for the spectral decomposition.
//!
//! The reduction stage never branches on hardware: it is handed a
//! [`SpectralBackend`] and calls [`SpectralBackend::decompose`]. Ordering and
//! sign of the returned factors are normalized by the caller, so a backend only
//! has to produce *some* valid economy SVD.

use crate::error::{Error, Result};
use nalgebra::DMatrix;

/// Economy singular value decomposition of a centered `n × d` matrix.
#[derive(Clone, Debug)]
pub struct SpectralFactors {
    /// Singular values, length `r = min(n, d)`.
    pub singular_values: Vec<f64>,
    /// Right singular vectors, one per singular value, each of length `d`.
    ///
    /// `components[c]` is column `c` of `V` (row `c` of `Vᵀ`).
    pub components: Vec<Vec<f64>>,
}

impl SpectralFactors {
    /// Number of factor pairs (`r`).
    pub fn rank(&self) -> usize {
        self.singular_values.len()
    }
}

/// A capability that can factor a dense, row-major matrix.
pub trait SpectralBackend {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Factor the row-major `n_rows × n_cols` matrix in `centered`.
    ///
    /// Implementations return `min(n_rows, n_cols)` singular values and
    /// right singular vectors in any order.
    fn decompose(&self, centered: &[f64], n_rows: usize, n_cols: usize)
        -> Result<SpectralFactors>;
}

impl<B: SpectralBackend + ?Sized> SpectralBackend for &B {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn decompose(
        &self,
        centered: &[f64],
        n_rows: usize,
        n_cols: usize,
    ) -> Result<SpectralFactors> {
        (**self).decompose(centered, n_rows, n_cols)
    }
}

/// CPU backend built on nalgebra's Golub–Kahan SVD.
#[derive(Clone, Debug)]
pub struct NalgebraBackend {
    eps: f64,
    max_iter: usize,
}

impl NalgebraBackend {
    /// Create a backend with default convergence settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the convergence threshold of the bidiagonal QR sweeps.
    pub fn with_eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Set the iteration budget. `0` lets the solver run until convergence.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }
}

impl Default for NalgebraBackend {
    fn default() -> Self {
        Self {
            eps: f64::EPSILON,
            max_iter: 10_000,
        }
    }
}

impl SpectralBackend for NalgebraBackend {
    fn name(&self) -> &'static str {
        "nalgebra"
    }

    fn decompose(
        &self,
        centered: &[f64],
        n_rows: usize,
        n_cols: usize,
    ) -> Result<SpectralFactors> {
        if centered.len() != n_rows * n_cols {
            return Err(Error::DimensionMismatch {
                expected: n_rows * n_cols,
                found: centered.len(),
            });
        }

        let matrix = DMatrix::from_row_slice(n_rows, n_cols, centered);
        let svd = matrix
            .try_svd(false, true, self.eps, self.max_iter)
            .ok_or_else(|| {
                Error::DecompositionFailed(format!(
                    "SVD did not converge within {} iterations",
                    self.max_iter
                ))
            })?;
        let v_t = svd
            .v_t
            .ok_or_else(|| Error::DecompositionFailed("right singular vectors missing".into()))?;

        let components = v_t
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();

        Ok(SpectralFactors {
            singular_values: svd.singular_values.iter().copied().collect(),
            components,
        })
    }
}
