//! Component-count selection from explained variance.

use crate::error::{Error, Result};
use tracing::warn;

/// Per-component variance statistics derived from singular values.
#[derive(Clone, Debug, PartialEq)]
pub struct ExplainedVariance {
    /// `S_i² / (N − 1)` for each component.
    pub explained: Vec<f64>,
    /// `explained_i / Σ explained`; all zero when the data has no variance.
    pub ratios: Vec<f64>,
    /// Running sum of `ratios`.
    pub cumulative: Vec<f64>,
}

impl ExplainedVariance {
    /// Compute variance statistics for singular values of a centered
    /// `n_samples`-row matrix.
    pub fn from_singular_values(singular_values: &[f64], n_samples: usize) -> Self {
        // A single sample has zero variance; avoid dividing by zero degrees of freedom.
        let dof = n_samples.saturating_sub(1).max(1) as f64;
        let explained: Vec<f64> = singular_values.iter().map(|s| s * s / dof).collect();
        let total: f64 = explained.iter().sum();

        let ratios: Vec<f64> = if total > 0.0 {
            explained.iter().map(|e| e / total).collect()
        } else {
            vec![0.0; explained.len()]
        };

        let cumulative = ratios
            .iter()
            .scan(0.0f64, |acc, r| {
                *acc += r;
                Some(*acc)
            })
            .collect();

        Self {
            explained,
            ratios,
            cumulative,
        }
    }

    /// Total variance across all components.
    pub fn total(&self) -> f64 {
        self.explained.iter().sum()
    }
}

/// Outcome of [`select_components`].
#[derive(Clone, Debug, PartialEq)]
pub struct Selection {
    /// Number of leading components retained (`1 ≤ k ≤ r`).
    pub components: usize,
    /// Cumulative explained-variance ratio of the retained components.
    pub cumulative: f64,
    /// Whether the threshold was never reached and the fallback count was used.
    pub fell_back: bool,
}

/// Choose how many leading components to keep.
///
/// Retains the smallest `k` whose cumulative ratio is `>= threshold`. The full
/// set of components explains all of the variance, so when the data has any
/// variance at all `k = r` always qualifies even if rounding leaves its
/// cumulative sum just under `1.0`. If no prefix qualifies (zero total
/// variance), `fallback` is used, clamped to the number of available
/// components.
///
/// `singular_values` must be sorted descending.
pub fn select_components(
    singular_values: &[f64],
    n_samples: usize,
    threshold: f64,
    fallback: usize,
) -> Result<(Selection, ExplainedVariance)> {
    validate_threshold(threshold)?;
    if fallback == 0 {
        return Err(Error::InvalidParameter {
            name: "fallback_components",
            message: "must be at least 1",
        });
    }
    if singular_values.is_empty() {
        return Err(Error::EmptyInput);
    }

    let variance = ExplainedVariance::from_singular_values(singular_values, n_samples);

    let reached = variance
        .cumulative
        .iter()
        .position(|&c| c >= threshold)
        .or_else(|| (variance.total() > 0.0).then(|| singular_values.len() - 1));

    let selection = match reached {
        Some(idx) => Selection {
            components: idx + 1,
            cumulative: variance.cumulative[idx],
            fell_back: false,
        },
        None => {
            let k = fallback.clamp(1, singular_values.len());
            warn!(
                threshold,
                fallback,
                retained = k,
                "explained variance never reached threshold; using fallback component count"
            );
            Selection {
                components: k,
                cumulative: variance.cumulative[k - 1],
                fell_back: true,
            }
        }
    };

    Ok((selection, variance))
}

pub(crate) fn validate_threshold(threshold: f64) -> Result<()> {
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(Error::InvalidParameter {
            name: "variance_threshold",
            message: "must be in (0, 1]",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ninety_ten_split_needs_both_components() {
        // Variances 9:1 → ratios 0.9 / 0.1.
        let s = [3.0, 1.0];
        let (sel, var) = select_components(&s, 4, 0.92, 12).unwrap();
        assert!((var.ratios[0] - 0.9).abs() < 1e-12);
        assert_eq!(sel.components, 2);
        assert!(!sel.fell_back);
        assert!((sel.cumulative - 1.0).abs() < 1e-12);
    }

    #[test]
    fn dominant_component_alone_suffices() {
        let s = [10.0, 1.0, 0.5];
        let (sel, _) = select_components(&s, 10, 0.92, 12).unwrap();
        assert_eq!(sel.components, 1);
    }

    #[test]
    fn threshold_of_one_is_reachable() {
        let s = [5.0, 3.0, 2.0, 1.0];
        let (sel, _) = select_components(&s, 8, 1.0, 2).unwrap();
        assert_eq!(sel.components, 4);
        assert!(!sel.fell_back);
    }

    #[test]
    fn prefix_just_below_threshold_does_not_qualify() {
        // Ratios 0.919999999 / 0.080000001.
        let s = [0.919_999_999f64.sqrt(), 0.080_000_001f64.sqrt()];
        let (sel, var) = select_components(&s, 2, 0.92, 12).unwrap();
        assert!(var.cumulative[0] < 0.92);
        assert_eq!(sel.components, 2);
        assert!(!sel.fell_back);
    }

    #[test]
    fn zero_variance_falls_back_clamped_to_rank() {
        let s = [0.0, 0.0, 0.0];
        let (sel, var) = select_components(&s, 5, 0.92, 12).unwrap();
        assert!(sel.fell_back);
        assert_eq!(sel.components, 3);
        assert_eq!(sel.cumulative, 0.0);
        assert!(var.ratios.iter().all(|&r| r == 0.0));
    }

    #[test]
    fn fallback_below_rank_is_kept() {
        let s = [0.0; 20];
        let (sel, _) = select_components(&s, 30, 0.92, 12).unwrap();
        assert_eq!(sel.components, 12);
    }

    #[test]
    fn single_sample_does_not_divide_by_zero() {
        let var = ExplainedVariance::from_singular_values(&[0.0], 1);
        assert_eq!(var.explained, vec![0.0]);
        assert_eq!(var.total(), 0.0);
    }

    #[test]
    fn ratios_sum_to_one() {
        let s = [7.5, 4.0, 2.25, 1.0, 0.1];
        let var = ExplainedVariance::from_singular_values(&s, 50);
        let sum: f64 = var.ratios.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(var.cumulative.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(matches!(
            select_components(&[1.0], 3, 0.0, 12),
            Err(Error::InvalidParameter {
                name: "variance_threshold",
                ..
            })
        ));
        assert!(matches!(
            select_components(&[1.0], 3, 1.5, 12),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(matches!(
            select_components(&[1.0], 3, f64::NAN, 12),
            Err(Error::InvalidParameter { .. })
        ));
        assert!(matches!(
            select_components(&[1.0], 3, 0.9, 0),
            Err(Error::InvalidParameter {
                name: "fallback_components",
                ..
            })
        ));
    }
}
