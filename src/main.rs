use std::process::ExitCode;

use golden_interference::{run_in, FieldConfig, LogProgress, RunExitCode, RunOutcome};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let result = run_in(".", &FieldConfig::default(), &mut LogProgress::default());
    match &result {
        Ok(RunOutcome::Resumed(artifact)) => {
            let (rows, cols) = artifact.field.shape();
            info!(
                "{} non-zero buckets | shape ({}, {}) | memory {:.3} GiB",
                artifact.bucket_count,
                rows,
                cols,
                gib(artifact.field.nbytes())
            );
            if let Some(metadata) = &artifact.metadata {
                info!("Generated {}", metadata.generated);
            }
        }
        Ok(RunOutcome::Built(build)) => {
            let (rows, cols) = build.field.shape();
            info!(
                "Field ready | shape ({}, {}) | memory {:.3} GiB",
                rows,
                cols,
                gib(build.field.nbytes())
            );
            info!("12-fold golden quasicrystal field ready");
        }
        Err(e) => error!("{}", e),
    }

    ExitCode::from(RunExitCode::from(&result) as u8)
}

fn gib(bytes: usize) -> f64 {
    bytes as f64 / (1024.0 * 1024.0 * 1024.0)
}
