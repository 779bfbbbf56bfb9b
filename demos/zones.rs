//! Simulated RF fingerprints → principal components → six location zones.
//!
//! Run with `RUST_LOG=rfzones=debug` to see per-stage events.

use rfzones::{FingerprintSimulator, PipelineConfig, ZonePipeline};
use tracing_subscriber::EnvFilter;

fn main() -> rfzones::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let data = FingerprintSimulator::new().with_seed(123).generate(500)?;
    println!(
        "Generated RF fingerprint data shape: [{}, {}]\n",
        data.len(),
        data[0].len()
    );

    let pipeline = ZonePipeline::new(PipelineConfig {
        seed: Some(42),
        ..Default::default()
    });
    let zones = pipeline.run(&data)?;

    let variance = &zones.reduction.variance;
    println!("Explained variance ratios:");
    for (i, (ratio, cumulative)) in variance
        .ratios
        .iter()
        .zip(variance.cumulative.iter())
        .take(15)
        .enumerate()
    {
        println!(
            "  PC{:<2} {:7.4}%   (cumulative: {:8.4}%)",
            i + 1,
            ratio * 100.0,
            cumulative * 100.0
        );
    }
    println!(
        "\nKeeping first {} components (explains ~{:.4}% variance){}\n",
        zones.reduction.components,
        zones.reduction.cumulative_variance_pct(),
        if zones.reduction.fell_back {
            ", fallback count"
        } else {
            ""
        }
    );

    println!("=== K-means in PCA-reduced space ===\n");
    print!("{}", zones.report);
    Ok(())
}
