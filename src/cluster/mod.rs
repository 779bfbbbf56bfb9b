//! Partitioning reduced fingerprints into location zones.
//!
//! Each zone is a K-means cluster in the principal-component space produced by
//! [`crate::reduce`]. The number of zones is chosen by the caller.
//!
//! ## K-means
//!
//! Assign each point to the nearest centroid, then move each centroid to the
//! mean of its points. Repeat until the centroids stop moving.
//!
//! **Objective**: minimize the within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! Zones are assumed to be roughly spherical in the reduced space, which is
//! what the variance-normalizing projection is for.
//!
//! ## Usage
//!
//! ```rust
//! use rfzones::cluster::{Clustering, Kmeans};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//!
//! let labels = Kmeans::new(2).with_seed(42).fit_predict(&data).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//! ```

mod kmeans;
mod traits;

pub use kmeans::{cluster, Kmeans, KmeansFit, Termination};
pub use traits::Clustering;
