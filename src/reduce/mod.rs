//! Dimensionality reduction by principal components.
//!
//! Fingerprint vectors are long (tens of RSSI and timing-advance features) and
//! strongly correlated: signal strength from neighbouring sectors falls off
//! together as a handset moves away. Projecting onto the few directions that
//! carry most of the variance removes that redundancy before clustering.
//!
//! ## Pipeline
//!
//! 1. **Centering**: subtract the per-column mean.
//! 2. **Decomposition**: economy SVD of the centered matrix, `X_c = U S Vᵀ`,
//!    delegated to a [`SpectralBackend`].
//! 3. **Selection**: keep the smallest `k` with cumulative explained-variance
//!    ratio `≥ θ`, where
//!
//!    ```text
//!    explained_i = S_i² / (N − 1)
//!    ratio_i     = explained_i / Σ_j explained_j
//!    ```
//!
//! 4. **Projection**: `P = X_c · V[:, 0..k]`.
//!
//! ## Sign convention
//!
//! Singular vectors are only defined up to sign. After decomposition each
//! component is flipped so that its largest-magnitude loading is positive,
//! which makes repeated runs (and different backends) agree. Callers should
//! still not attach meaning to the sign of a component.
//!
//! ## Usage
//!
//! ```rust
//! use rfzones::reduce::Pca;
//!
//! let data = vec![
//!     vec![2.0, 0.1],
//!     vec![-2.0, -0.1],
//!     vec![1.0, 0.0],
//!     vec![-1.0, 0.0],
//! ];
//!
//! let reduction = Pca::new().with_variance_threshold(0.9).fit_transform(&data).unwrap();
//! assert_eq!(reduction.components, 1);
//! assert_eq!(reduction.projected.len(), 4);
//! ```

pub mod backend;
mod select;

pub use backend::{NalgebraBackend, SpectralBackend, SpectralFactors};
pub use select::{select_components, ExplainedVariance, Selection};

use crate::error::{Error, Result};
use crate::util;
use tracing::debug;

/// Default cumulative explained-variance target.
pub const DEFAULT_VARIANCE_THRESHOLD: f64 = 0.92;

/// Default component count when the target is never reached.
pub const DEFAULT_FALLBACK_COMPONENTS: usize = 12;

/// Principal component reducer.
#[derive(Clone, Debug)]
pub struct Pca<B = NalgebraBackend> {
    variance_threshold: f64,
    fallback_components: usize,
    backend: B,
}

/// Result of [`Pca::fit_transform`].
#[derive(Clone, Debug)]
pub struct Reduction {
    /// Projected rows, `N × k`.
    pub projected: Vec<Vec<f32>>,
    /// Number of retained components (`k`).
    pub components: usize,
    /// Cumulative explained-variance ratio of the retained components, in `[0, 1]`.
    pub cumulative_variance: f64,
    /// Whether the fallback component count was used.
    pub fell_back: bool,
    /// Column means removed before decomposition.
    pub means: Vec<f64>,
    /// Singular values, descending.
    pub singular_values: Vec<f64>,
    /// Per-component variance statistics over all `r` components.
    pub variance: ExplainedVariance,
}

impl Reduction {
    /// [`Reduction::cumulative_variance`] as a percentage.
    pub fn cumulative_variance_pct(&self) -> f64 {
        self.cumulative_variance * 100.0
    }
}

impl Pca {
    /// Create a reducer with the default threshold, fallback, and CPU backend.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Default for Pca {
    fn default() -> Self {
        Self {
            variance_threshold: DEFAULT_VARIANCE_THRESHOLD,
            fallback_components: DEFAULT_FALLBACK_COMPONENTS,
            backend: NalgebraBackend::default(),
        }
    }
}

impl<B: SpectralBackend> Pca<B> {
    /// Set the cumulative explained-variance target `θ ∈ (0, 1]`.
    pub fn with_variance_threshold(mut self, threshold: f64) -> Self {
        self.variance_threshold = threshold;
        self
    }

    /// Set the component count used when no prefix reaches the target.
    pub fn with_fallback_components(mut self, fallback: usize) -> Self {
        self.fallback_components = fallback;
        self
    }

    /// Replace the decomposition backend.
    pub fn with_backend<C: SpectralBackend>(self, backend: C) -> Pca<C> {
        Pca {
            variance_threshold: self.variance_threshold,
            fallback_components: self.fallback_components,
            backend,
        }
    }

    /// Configured variance target.
    pub fn variance_threshold(&self) -> f64 {
        self.variance_threshold
    }

    /// Configured fallback component count.
    pub fn fallback_components(&self) -> usize {
        self.fallback_components
    }

    /// Center `data`, decompose it, choose `k`, and project onto the first `k`
    /// components.
    pub fn fit_transform(&self, data: &[Vec<f32>]) -> Result<Reduction> {
        select::validate_threshold(self.variance_threshold)?;
        if self.fallback_components == 0 {
            return Err(Error::InvalidParameter {
                name: "fallback_components",
                message: "must be at least 1",
            });
        }

        let (n, d) = util::validate_matrix(data)?;
        let means = util::column_means(data, d);
        let centered = center(data, &means);

        let factors = self.backend.decompose(&centered, n, d)?;
        let factors = canonicalize(factors, n.min(d), d)?;
        debug!(
            backend = self.backend.name(),
            n_samples = n,
            n_features = d,
            rank = factors.rank(),
            "decomposed centered fingerprint matrix"
        );

        let (selection, variance) = select_components(
            &factors.singular_values,
            n,
            self.variance_threshold,
            self.fallback_components,
        )?;
        let k = selection.components;

        let projected = project(&centered, d, &factors.components[..k])?;
        debug!(
            components = k,
            cumulative_variance = selection.cumulative,
            "projected onto retained components"
        );

        Ok(Reduction {
            projected,
            components: k,
            cumulative_variance: selection.cumulative,
            fell_back: selection.fell_back,
            means,
            singular_values: factors.singular_values,
            variance,
        })
    }
}

/// Reduce `data` with the default backend.
///
/// Equivalent to
/// `Pca::new().with_variance_threshold(t).with_fallback_components(f).fit_transform(data)`.
pub fn reduce(
    data: &[Vec<f32>],
    variance_threshold: f64,
    fallback_components: usize,
) -> Result<Reduction> {
    Pca::new()
        .with_variance_threshold(variance_threshold)
        .with_fallback_components(fallback_components)
        .fit_transform(data)
}

/// Subtract column means, producing a flat row-major buffer.
fn center(data: &[Vec<f32>], means: &[f64]) -> Vec<f64> {
    let mut centered = Vec::with_capacity(data.len() * means.len());
    for point in data {
        centered.extend(point.iter().zip(means.iter()).map(|(&x, &m)| f64::from(x) - m));
    }
    centered
}

/// Validate backend output, sort factors by descending singular value, and
/// fix each component's sign.
fn canonicalize(factors: SpectralFactors, rank: usize, d: usize) -> Result<SpectralFactors> {
    let SpectralFactors {
        singular_values,
        components,
    } = factors;

    if singular_values.len() != rank || components.len() != rank {
        return Err(Error::DecompositionFailed(format!(
            "backend returned {} singular values and {} components, expected {rank}",
            singular_values.len(),
            components.len()
        )));
    }
    if components.iter().any(|c| c.len() != d) {
        return Err(Error::DecompositionFailed(
            "component length differs from feature count".into(),
        ));
    }
    if singular_values.iter().any(|s| !s.is_finite() || *s < 0.0)
        || components.iter().flatten().any(|x| !x.is_finite())
    {
        return Err(Error::DecompositionFailed(
            "backend produced non-finite or negative factors".into(),
        ));
    }

    let mut order: Vec<usize> = (0..rank).collect();
    order.sort_by(|&a, &b| singular_values[b].total_cmp(&singular_values[a]));

    let mut sorted_values = Vec::with_capacity(rank);
    let mut sorted_components = Vec::with_capacity(rank);
    for idx in order {
        sorted_values.push(singular_values[idx]);
        let mut component = components[idx].clone();
        flip_sign(&mut component);
        sorted_components.push(component);
    }

    Ok(SpectralFactors {
        singular_values: sorted_values,
        components: sorted_components,
    })
}

/// Make the largest-magnitude loading positive.
fn flip_sign(component: &mut [f64]) {
    let pivot = component
        .iter()
        .copied()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .unwrap_or(0.0);
    if pivot < 0.0 {
        for x in component.iter_mut() {
            *x = -*x;
        }
    }
}

/// Project centered rows onto `components`.
///
/// Scores are computed in f64; one that does not fit in f32 is an error rather
/// than an infinite entry.
fn project(centered: &[f64], d: usize, components: &[Vec<f64>]) -> Result<Vec<Vec<f32>>> {
    centered
        .chunks_exact(d)
        .enumerate()
        .map(|(row, values)| {
            components
                .iter()
                .enumerate()
                .map(|(col, c)| {
                    let score = util::dot(values, c) as f32;
                    if score.is_finite() {
                        Ok(score)
                    } else {
                        Err(Error::NonFinite { row, col })
                    }
                })
                .collect()
        })
        .collect()
}
