//! Location-zone inference from radio fingerprints.
//!
//! `rfzones` takes an unlabeled `N × D` matrix of signal-strength and timing
//! features and assigns each row to one of `K` zones in two stages:
//!
//! - [`reduce`]: center, decompose (SVD), keep the leading principal components
//!   that explain a target share of the variance, and project.
//! - [`cluster`]: K-means over the projected rows, with stale-centroid handling
//!   for empty clusters and a centroid-shift convergence test.
//!
//! [`pipeline::ZonePipeline`] chains both and tallies zone sizes.
//!
//! ```rust
//! use rfzones::{FingerprintSimulator, PipelineConfig, ZonePipeline};
//!
//! let data = FingerprintSimulator::new().with_seed(1).generate(60).unwrap();
//! let config = PipelineConfig { n_zones: 3, seed: Some(7), ..Default::default() };
//!
//! let zones = ZonePipeline::new(config).run(&data).unwrap();
//! assert_eq!(zones.labels().len(), 60);
//! assert_eq!(zones.report.sizes.len(), 3);
//! ```

#![forbid(unsafe_code)]

pub mod cluster;
pub mod error;
pub mod pipeline;
pub mod reduce;
pub mod report;
pub mod synth;

mod util;

pub use cluster::{cluster, Clustering, Kmeans, KmeansFit, Termination};
pub use error::{Error, ErrorKind, Result};
pub use pipeline::{PipelineConfig, ZoneAssignment, ZonePipeline};
pub use reduce::{reduce, NalgebraBackend, Pca, Reduction, SpectralBackend, SpectralFactors};
pub use report::{cluster_sizes, ZoneReport};
pub use synth::FingerprintSimulator;
