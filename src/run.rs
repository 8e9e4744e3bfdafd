//! One complete generator run: clear a stale marker, resume if a saved
//! field loads, otherwise build and save.

use std::path::Path;

use tracing::{info, warn};

use crate::builder::{FieldBuild, FieldBuilder};
use crate::config::{FieldConfig, StorePaths};
use crate::error::{FieldError, FieldResult};
use crate::progress::ProgressReporter;
use crate::store::{FieldMetadata, ResumableStore, StoredArtifact};

/// How a successful run ended.
#[derive(Debug)]
pub enum RunOutcome {
    /// A new field was built and saved
    Built(FieldBuild),
    /// A saved field was loaded; nothing was built
    Resumed(StoredArtifact),
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunExitCode {
    /// Field built and saved, or resumed from disk
    Success = 0,
    /// Invalid configuration or the finished field could not be saved
    Failure = 1,
}

impl From<&FieldError> for RunExitCode {
    fn from(err: &FieldError) -> Self {
        if err.is_fatal() {
            RunExitCode::Failure
        } else {
            RunExitCode::Success
        }
    }
}

impl From<&FieldResult<RunOutcome>> for RunExitCode {
    fn from(result: &FieldResult<RunOutcome>) -> Self {
        match result {
            Ok(_) => RunExitCode::Success,
            Err(e) => e.into(),
        }
    }
}

/// Run the generator against the artifact files in `dir`.
///
/// The configuration is validated before any file is touched. A failure to
/// write the crash marker is only logged; a failure to save the finished
/// field is returned.
pub fn run_in(
    dir: impl AsRef<Path>,
    config: &FieldConfig,
    reporter: &mut dyn ProgressReporter,
) -> FieldResult<RunOutcome> {
    let builder = FieldBuilder::new(config.clone())?;
    let store = ResumableStore::new(StorePaths::in_dir(dir));
    store.clear_stale_marker();

    if let Some(artifact) = store.try_load() {
        return Ok(RunOutcome::Resumed(artifact));
    }

    if let Err(e) = store.mark_building() {
        warn!("Could not write lock file: {}", e);
    }

    info!(
        "{} nodes x {} implicit | {} waves | golden phase offsets",
        config.node_count, config.node_count, config.wave_count
    );
    let build = builder.build_with(reporter);

    let metadata = FieldMetadata::from_build(config, &build);
    store.save(&build.field, &metadata)?;
    Ok(RunOutcome::Built(build))
}
