//! End-to-end zone inference: reduce, cluster, tally.

use crate::cluster::{Kmeans, KmeansFit};
use crate::error::{Error, Result};
use crate::reduce::{
    NalgebraBackend, Pca, Reduction, SpectralBackend, DEFAULT_FALLBACK_COMPONENTS,
    DEFAULT_VARIANCE_THRESHOLD,
};
use crate::report::ZoneReport;
use tracing::info;

/// Parameters for one [`ZonePipeline`] run.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Cumulative explained-variance target for component selection.
    pub variance_threshold: f64,
    /// Component count used when the target is never reached.
    pub fallback_components: usize,
    /// Number of zones (K).
    pub n_zones: usize,
    /// K-means iteration budget.
    pub max_iter: usize,
    /// K-means centroid-shift tolerance.
    pub tol: f32,
    /// Optional RNG seed for centroid initialization.
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            variance_threshold: DEFAULT_VARIANCE_THRESHOLD,
            fallback_components: DEFAULT_FALLBACK_COMPONENTS,
            n_zones: 6,
            max_iter: 150,
            tol: 1e-5,
            seed: None,
        }
    }
}

/// Output of [`ZonePipeline::run`].
#[derive(Clone, Debug)]
pub struct ZoneAssignment {
    /// Principal-component stage output.
    pub reduction: Reduction,
    /// K-means stage output.
    pub fit: KmeansFit,
    /// Per-zone tallies.
    pub report: ZoneReport,
}

impl ZoneAssignment {
    /// Zone index for every input row.
    pub fn labels(&self) -> &[usize] {
        &self.fit.labels
    }
}

/// Fingerprint matrix → zone labels.
#[derive(Clone, Debug)]
pub struct ZonePipeline<B = NalgebraBackend> {
    config: PipelineConfig,
    backend: B,
}

impl ZonePipeline {
    /// Create a pipeline on the default CPU backend.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            backend: NalgebraBackend::default(),
        }
    }
}

impl<B: SpectralBackend> ZonePipeline<B> {
    /// Replace the decomposition backend.
    pub fn with_backend<C: SpectralBackend>(self, backend: C) -> ZonePipeline<C> {
        ZonePipeline {
            config: self.config,
            backend,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Reduce `data`, cluster the projection, and tally zone sizes.
    pub fn run(&self, data: &[Vec<f32>]) -> Result<ZoneAssignment> {
        let cfg = &self.config;

        // Reject an impossible zone count before paying for the decomposition.
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }
        if cfg.n_zones == 0 || cfg.n_zones > data.len() {
            return Err(Error::InvalidClusterCount {
                requested: cfg.n_zones,
                n_items: data.len(),
            });
        }

        let reduction = Pca::new()
            .with_variance_threshold(cfg.variance_threshold)
            .with_fallback_components(cfg.fallback_components)
            .with_backend(&self.backend)
            .fit_transform(data)?;

        let fit = Kmeans::new(cfg.n_zones)
            .with_max_iter(cfg.max_iter)
            .with_tol(cfg.tol)
            .with_seed_opt(cfg.seed)
            .fit(&reduction.projected)?;

        let report = ZoneReport::from_fit(&fit);
        info!(
            samples = data.len(),
            components = reduction.components,
            cumulative_variance_pct = reduction.cumulative_variance_pct(),
            zones = cfg.n_zones,
            empty_zones = report.empty_zones().len(),
            converged = fit.converged,
            "zone inference complete"
        );

        Ok(ZoneAssignment {
            reduction,
            fit,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::FingerprintSimulator;

    #[test]
    fn simulated_fingerprints_end_to_end() {
        let data = FingerprintSimulator::new().with_seed(123).generate(200).unwrap();
        let pipeline = ZonePipeline::new(PipelineConfig {
            seed: Some(42),
            ..Default::default()
        });

        let out = pipeline.run(&data).unwrap();
        assert_eq!(out.labels().len(), 200);
        assert!(out.labels().iter().all(|&l| l < 6));
        assert_eq!(out.report.sizes.len(), 6);
        assert_eq!(out.report.total(), 200);
        assert!(out.reduction.components >= 1);
        assert!(out.reduction.components <= 32);
        assert!(out.reduction.cumulative_variance > 0.0);
    }

    #[test]
    fn seeded_runs_agree() {
        let data = FingerprintSimulator::new().with_seed(5).generate(80).unwrap();
        let pipeline = ZonePipeline::new(PipelineConfig {
            n_zones: 4,
            seed: Some(8),
            ..Default::default()
        });
        let a = pipeline.run(&data).unwrap();
        let b = pipeline.run(&data).unwrap();
        assert_eq!(a.labels(), b.labels());
        assert_eq!(a.fit.iterations, b.fit.iterations);
        assert_eq!(a.reduction.components, b.reduction.components);
    }

    #[test]
    fn too_many_zones_is_invalid_input() {
        let data = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let pipeline = ZonePipeline::new(PipelineConfig {
            n_zones: 3,
            ..Default::default()
        });
        assert!(matches!(
            pipeline.run(&data),
            Err(Error::InvalidClusterCount {
                requested: 3,
                n_items: 2
            })
        ));
    }
}
