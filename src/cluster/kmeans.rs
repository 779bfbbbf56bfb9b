//! K-means (Lloyd iterations) with random-row seeding.
//!
//! # Algorithm
//!
//! 1. **Initialization**: shuffle the row indices and take the first `k` rows as
//!    centroids.
//! 2. **Assignment**: each row goes to its nearest centroid (Euclidean distance,
//!    ties to the lowest centroid index).
//! 3. **Update**: each centroid moves to the mean of its rows. A centroid with no
//!    rows stays where it was, so there are always exactly `k` centroids.
//! 4. **Convergence**: stop once the Frobenius norm of the centroid shift drops
//!    below `tol`; otherwise repeat from 2, at most `max_iter` times.
//!
//! Running out of iterations is not an error: the labels of the last completed
//! assignment are returned with `converged = false`.
//!
//! # Complexity
//!
//! - **Time**: O(n·k·d) per iteration.
//! - **Space**: O(n + k·d).

use super::traits::Clustering;
use crate::error::{Error, Result};
use crate::util;
use rand::prelude::*;
use tracing::{debug, info, trace};

/// Iterations between progress events at `debug` level.
const LOG_EVERY: usize = 20;

/// K-means clusterer.
#[derive(Debug, Clone)]
pub struct Kmeans {
    k: usize,
    max_iter: usize,
    tol: f32,
    seed: Option<u64>,
}

/// How a fit ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Centroid shift fell below the tolerance.
    Converged,
    /// `max_iter` rounds ran without meeting the tolerance.
    ExhaustedIterations,
}

/// Result of a K-means run.
#[derive(Debug, Clone)]
pub struct KmeansFit {
    /// Cluster index in `[0, k)` for every row.
    pub labels: Vec<usize>,
    /// Final centroids, exactly `k` rows.
    pub centroids: Vec<Vec<f32>>,
    /// Completed assignment/update rounds.
    pub iterations: usize,
    /// Whether the centroid shift fell below the tolerance.
    pub converged: bool,
    /// Within-cluster sum of squared distances to the final centroids.
    pub inertia: f64,
}

impl KmeansFit {
    /// Terminal state of the run.
    pub fn termination(&self) -> Termination {
        if self.converged {
            Termination::Converged
        } else {
            Termination::ExhaustedIterations
        }
    }

    /// Number of rows labeled with each cluster, indexed by cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.centroids.len()];
        for &label in &self.labels {
            sizes[label] += 1;
        }
        sizes
    }
}

impl Kmeans {
    /// Create a clusterer for `k` clusters.
    ///
    /// Defaults: `max_iter = 150`, `tol = 1e-5`, no fixed seed.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 150,
            tol: 1e-5,
            seed: None,
        }
    }

    /// Set the maximum number of assignment/update rounds.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the centroid-shift tolerance.
    pub fn with_tol(mut self, tol: f32) -> Self {
        self.tol = tol;
        self
    }

    /// Fix the seed used to pick the initial centroids.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set or clear the seed.
    pub fn with_seed_opt(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Run K-means from randomly chosen rows.
    pub fn fit(&self, data: &[Vec<f32>]) -> Result<KmeansFit> {
        let (n, _) = self.validate(data)?;

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut rng);

        let centroids = order[..self.k].iter().map(|&i| data[i].clone()).collect();
        Ok(self.lloyd(data, centroids))
    }

    /// Run K-means from caller-supplied initial centroids.
    ///
    /// `centroids` must contain exactly `k` finite rows of the data's width.
    pub fn fit_from_centroids(
        &self,
        data: &[Vec<f32>],
        centroids: Vec<Vec<f32>>,
    ) -> Result<KmeansFit> {
        let (_, d) = self.validate(data)?;

        if centroids.len() != self.k {
            return Err(Error::InvalidParameter {
                name: "centroids",
                message: "must contain exactly k rows",
            });
        }
        for (row, c) in centroids.iter().enumerate() {
            if c.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: c.len(),
                });
            }
            if let Some(col) = c.iter().position(|x| !x.is_finite()) {
                return Err(Error::NonFinite { row, col });
            }
        }

        Ok(self.lloyd(data, centroids))
    }

    fn validate(&self, data: &[Vec<f32>]) -> Result<(usize, usize)> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }
        if self.k == 0 || self.k > data.len() {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: data.len(),
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }
        if !(self.tol.is_finite() && self.tol >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "tol",
                message: "must be finite and non-negative",
            });
        }
        util::validate_matrix(data)
    }

    fn lloyd(&self, data: &[Vec<f32>], mut centroids: Vec<Vec<f32>>) -> KmeansFit {
        let mut labels = vec![0usize; data.len()];
        let mut iterations = 0;
        let mut converged = false;

        for iter in 0..self.max_iter {
            assign(data, &centroids, &mut labels);
            let next = update(data, &labels, &centroids);
            let shift = frobenius_shift(&centroids, &next);
            centroids = next;
            iterations = iter + 1;

            trace!(iteration = iter, shift, "k-means round");
            if iter % LOG_EVERY == 0 {
                debug!(iteration = iter, shift, "k-means progress");
            }

            if shift < f64::from(self.tol) {
                converged = true;
                break;
            }
        }

        let inertia: f64 = labels
            .iter()
            .zip(data.iter())
            .map(|(&label, point)| util::squared_euclidean(point, &centroids[label]))
            .sum();

        if converged {
            info!(k = self.k, iterations, inertia, "k-means converged");
        } else {
            info!(
                k = self.k,
                iterations, inertia, "k-means exhausted iteration budget"
            );
        }

        KmeansFit {
            labels,
            centroids,
            iterations,
            converged,
            inertia,
        }
    }
}

impl Default for Kmeans {
    fn default() -> Self {
        Self::new(6)
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

/// Cluster `data` into `k` groups.
///
/// Equivalent to `Kmeans::new(k).with_max_iter(max_iter).with_tol(tol).with_seed_opt(seed).fit(data)`.
pub fn cluster(
    data: &[Vec<f32>],
    k: usize,
    max_iter: usize,
    tol: f32,
    seed: Option<u64>,
) -> Result<KmeansFit> {
    Kmeans::new(k)
        .with_max_iter(max_iter)
        .with_tol(tol)
        .with_seed_opt(seed)
        .fit(data)
}

fn assign(data: &[Vec<f32>], centroids: &[Vec<f32>], labels: &mut [usize]) {
    for (label, point) in labels.iter_mut().zip(data.iter()) {
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (c, centroid) in centroids.iter().enumerate() {
            let dist = util::squared_euclidean(point, centroid);
            // Strict comparison keeps the lowest index on ties.
            if dist < best_dist {
                best_dist = dist;
                best = c;
            }
        }
        *label = best;
    }
}

fn update(data: &[Vec<f32>], labels: &[usize], previous: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let d = previous.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0f64; d]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (&label, point) in labels.iter().zip(data.iter()) {
        counts[label] += 1;
        for (s, &x) in sums[label].iter_mut().zip(point.iter()) {
            *s += f64::from(x);
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous.iter())
        .map(|((sum, count), prev)| {
            if count == 0 {
                // Empty cluster: keep the stale centroid.
                prev.clone()
            } else {
                let count = count as f64;
                sum.into_iter().map(|s| (s / count) as f32).collect()
            }
        })
        .collect()
}

fn frobenius_shift(old: &[Vec<f32>], new: &[Vec<f32>]) -> f64 {
    old.iter()
        .zip(new.iter())
        .map(|(a, b)| util::squared_euclidean(a, b))
        .sum::<f64>()
        .sqrt()
}

#[cfg(test)]
#[allow(clippy::needless_range_loop)]
mod tests {
    use super::*;

    fn two_groups() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 0.0],
            vec![0.2, 0.1],
            vec![-0.1, 0.2],
            vec![0.1, -0.2],
            vec![10.0, 10.0],
            vec![10.2, 9.9],
            vec![9.8, 10.1],
            vec![10.1, 10.2],
        ]
    }

    #[test]
    fn separates_two_groups() {
        let fit = Kmeans::new(2)
            .with_max_iter(50)
            .with_tol(1e-6)
            .with_seed(42)
            .fit(&two_groups())
            .unwrap();

        assert!(fit.converged);
        assert_eq!(fit.termination(), Termination::Converged);
        let a = fit.labels[0];
        let b = fit.labels[4];
        assert_ne!(a, b);
        for i in 0..4 {
            assert_eq!(fit.labels[i], a);
        }
        for i in 4..8 {
            assert_eq!(fit.labels[i], b);
        }
        assert_eq!(fit.cluster_sizes(), {
            let mut s = vec![0, 0];
            s[a] = 4;
            s[b] = 4;
            s
        });
    }

    #[test]
    fn k_equals_n_converges_in_one_round() {
        let data = vec![vec![0.0, 1.0], vec![5.0, 5.0], vec![-3.0, 2.0]];
        let fit = Kmeans::new(3).with_seed(7).fit(&data).unwrap();
        assert!(fit.converged);
        assert_eq!(fit.iterations, 1);
        assert_eq!(fit.cluster_sizes(), vec![1, 1, 1]);
        assert_eq!(fit.inertia, 0.0);
    }

    #[test]
    fn empty_cluster_keeps_its_centroid() {
        let data = two_groups();
        let init = vec![vec![0.0, 0.0], vec![10.0, 10.0], vec![100.0, -100.0]];
        let fit = Kmeans::new(3)
            .with_max_iter(50)
            .fit_from_centroids(&data, init)
            .unwrap();

        assert!(fit.converged);
        assert_eq!(fit.centroids.len(), 3);
        assert_eq!(fit.centroids[2], vec![100.0f32, -100.0]);
        assert_eq!(fit.cluster_sizes()[2], 0);
    }

    #[test]
    fn ties_go_to_lowest_centroid() {
        let data = vec![vec![0.0], vec![1.0], vec![2.0]];
        let mut labels = vec![9; 3];
        assign(&data, &[vec![1.0], vec![1.0]], &mut labels);
        assert_eq!(labels, vec![0, 0, 0]);
    }

    #[test]
    fn large_coordinates_go_to_the_nearer_centroid() {
        let data = vec![vec![-3e19], vec![1e19], vec![3e19]];
        let mut labels = vec![9; 3];
        assign(&data, &[vec![-3e19], vec![3e19]], &mut labels);
        assert_eq!(labels, vec![0, 1, 1]);

        let fit = Kmeans::new(2)
            .fit_from_centroids(&data, vec![vec![-3e19], vec![3e19]])
            .unwrap();
        assert!(fit.converged);
        assert_eq!(fit.labels, vec![0, 1, 1]);
        assert!(fit.inertia.is_finite());
    }

    #[test]
    fn shift_between_extreme_centroids_is_finite() {
        let shift = frobenius_shift(&[vec![f32::MAX, f32::MAX]], &[vec![f32::MIN, f32::MIN]]);
        assert!(shift.is_finite());
        assert!(shift > f64::from(f32::MAX));
    }

    #[test]
    fn exhausting_iterations_is_not_an_error() {
        let data = two_groups();
        // Both centroids start in the same group; one round cannot settle them.
        let init = vec![vec![0.0, 0.0], vec![0.2, 0.1]];
        let fit = Kmeans::new(2)
            .with_max_iter(1)
            .with_tol(0.0)
            .fit_from_centroids(&data, init)
            .unwrap();
        assert!(!fit.converged);
        assert_eq!(fit.termination(), Termination::ExhaustedIterations);
        assert_eq!(fit.iterations, 1);
        assert_eq!(fit.labels.len(), data.len());
    }

    #[test]
    fn same_seed_same_result() {
        let data: Vec<Vec<f32>> = (0..40)
            .map(|i| vec![(i % 7) as f32, (i % 5) as f32 * 1.5])
            .collect();
        let a = cluster(&data, 4, 150, 1e-5, Some(3)).unwrap();
        let b = cluster(&data, 4, 150, 1e-5, Some(3)).unwrap();
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.iterations, b.iterations);
        assert_eq!(a.centroids, b.centroids);
    }

    #[test]
    fn rejects_bad_cluster_counts() {
        let data = vec![vec![0.0], vec![1.0]];
        assert!(matches!(
            Kmeans::new(0).fit(&data),
            Err(Error::InvalidClusterCount {
                requested: 0,
                n_items: 2
            })
        ));
        assert!(matches!(
            Kmeans::new(3).fit(&data),
            Err(Error::InvalidClusterCount {
                requested: 3,
                n_items: 2
            })
        ));
        assert!(matches!(Kmeans::new(1).fit(&[]), Err(Error::EmptyInput)));
    }

    #[test]
    fn rejects_bad_parameters() {
        let data = vec![vec![0.0], vec![1.0]];
        assert!(matches!(
            Kmeans::new(1).with_max_iter(0).fit(&data),
            Err(Error::InvalidParameter {
                name: "max_iter",
                ..
            })
        ));
        assert!(matches!(
            Kmeans::new(1).with_tol(f32::NAN).fit(&data),
            Err(Error::InvalidParameter { name: "tol", .. })
        ));
        assert!(matches!(
            Kmeans::new(2).fit_from_centroids(&data, vec![vec![0.0]]),
            Err(Error::InvalidParameter {
                name: "centroids",
                ..
            })
        ));
        assert!(matches!(
            Kmeans::new(1).fit_from_centroids(&data, vec![vec![0.0, 1.0]]),
            Err(Error::DimensionMismatch {
                expected: 1,
                found: 2
            })
        ));
    }

    #[test]
    fn fit_predict_matches_fit() {
        let data = two_groups();
        let model = Kmeans::new(2).with_seed(11);
        assert_eq!(model.fit_predict(&data).unwrap(), model.fit(&data).unwrap().labels);
        assert_eq!(model.n_clusters(), 2);
    }
}
