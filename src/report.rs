//! Per-zone tallies of clustering output.

use crate::cluster::KmeansFit;
use crate::error::{Error, Result};
use std::fmt;

/// Count how many labels fall into each of `k` clusters.
///
/// Clusters that received no rows are reported as `0`.
pub fn cluster_sizes(labels: &[usize], k: usize) -> Result<Vec<usize>> {
    let mut sizes = vec![0usize; k];
    for &label in labels {
        let slot = sizes.get_mut(label).ok_or(Error::InvalidParameter {
            name: "labels",
            message: "label out of range for cluster count",
        })?;
        *slot += 1;
    }
    Ok(sizes)
}

/// Summary of one zone-inference run.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneReport {
    /// Measurements per zone, indexed by zone.
    pub sizes: Vec<usize>,
    /// K-means rounds used.
    pub iterations: usize,
    /// Whether K-means converged within its budget.
    pub converged: bool,
}

impl ZoneReport {
    /// Build a report from a finished K-means run.
    pub fn from_fit(fit: &KmeansFit) -> Self {
        Self {
            sizes: fit.cluster_sizes(),
            iterations: fit.iterations,
            converged: fit.converged,
        }
    }

    /// Zones that ended up with no measurements.
    pub fn empty_zones(&self) -> Vec<usize> {
        self.sizes
            .iter()
            .enumerate()
            .filter(|&(_, &n)| n == 0)
            .map(|(zone, _)| zone)
            .collect()
    }

    /// Total number of measurements.
    pub fn total(&self) -> usize {
        self.sizes.iter().sum()
    }
}

impl fmt::Display for ZoneReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.converged {
            writeln!(f, "Converged after {} iterations.", self.iterations)?;
        } else {
            writeln!(
                f,
                "Stopped after {} iterations without converging.",
                self.iterations
            )?;
        }
        writeln!(f, "Cluster sizes:")?;
        for (zone, n) in self.sizes.iter().enumerate() {
            writeln!(f, "  Zone {zone}: {n} measurements")?;
        }
        Ok(())
    }
}
