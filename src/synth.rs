//! Synthetic radio fingerprints.
//!
//! Each sample is a handset position summarized by a hidden distance factor
//! `f ∈ [0.2, 1.0)`. Every visible sector contributes one RSSI column per band,
//! and every serving cell one timing-advance column:
//!
//! ```text
//! rssi[s][b] = (−55 − 8·s) · f^(1.5 + 0.3·s) + N(0, σ_rssi²)
//! ta[c]      = 0.1 + f · (3 + 0.5·c)        + N(0, σ_ta²)
//! ```
//!
//! Nearer sectors are stronger and decay more slowly; timing advance grows with
//! distance. The columns are strongly correlated through `f`, which is what makes
//! the data a good fit for principal-component reduction.

use crate::error::{Error, Result};
use rand::prelude::*;
use rand_distr::{Distribution, Normal};
use tracing::debug;

/// Generator for synthetic fingerprint matrices.
#[derive(Clone, Debug)]
pub struct FingerprintSimulator {
    /// Visible sectors (RSSI groups).
    pub sectors: usize,
    /// Frequency bands per sector.
    pub bands: usize,
    /// Cells reporting timing advance.
    pub timing_cells: usize,
    /// Standard deviation of RSSI noise (dB).
    pub rssi_noise: f32,
    /// Standard deviation of timing-advance noise.
    pub timing_noise: f32,
    /// Optional RNG seed for reproducibility.
    pub seed: Option<u64>,
}

impl Default for FingerprintSimulator {
    fn default() -> Self {
        Self {
            sectors: 8,
            bands: 3,
            timing_cells: 8,
            rssi_noise: 4.0,
            timing_noise: 0.4,
            seed: None,
        }
    }
}

impl FingerprintSimulator {
    /// Create a simulator with the default layout (8 sectors × 3 bands + 8 TA cells).
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of feature columns produced per sample.
    pub fn n_features(&self) -> usize {
        self.sectors * self.bands + self.timing_cells
    }

    /// Generate `n_samples` fingerprint rows.
    pub fn generate(&self, n_samples: usize) -> Result<Vec<Vec<f32>>> {
        if n_samples == 0 {
            return Err(Error::InvalidParameter {
                name: "n_samples",
                message: "must be at least 1",
            });
        }
        if self.n_features() == 0 {
            return Err(Error::InvalidParameter {
                name: "layout",
                message: "must produce at least one feature column",
            });
        }

        let rssi_noise = Normal::new(0.0f32, self.rssi_noise).map_err(|_| {
            Error::InvalidParameter {
                name: "rssi_noise",
                message: "must be finite and non-negative",
            }
        })?;
        let timing_noise = Normal::new(0.0f32, self.timing_noise).map_err(|_| {
            Error::InvalidParameter {
                name: "timing_noise",
                message: "must be finite and non-negative",
            }
        })?;

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        let mut rows = Vec::with_capacity(n_samples);
        for _ in 0..n_samples {
            let f = rng.random::<f32>() * 0.8 + 0.2;
            let mut row = Vec::with_capacity(self.n_features());

            for s in 0..self.sectors {
                let base = -55.0 - 8.0 * s as f32;
                let decay = f.powf(1.5 + 0.3 * s as f32);
                for _ in 0..self.bands {
                    row.push(base * decay + rssi_noise.sample(&mut rng));
                }
            }
            for c in 0..self.timing_cells {
                row.push(0.1 + f * (3.0 + 0.5 * c as f32) + timing_noise.sample(&mut rng));
            }

            rows.push(row);
        }

        debug!(
            n_samples,
            n_features = self.n_features(),
            "generated synthetic fingerprints"
        );
        Ok(rows)
    }
}
