//! 12-fold golden-ratio interference field generator.
//!
//! Twelve phase-shifted waves are synthesized chunk by chunk over a 1-D
//! node index space too large to hold as a dense N×N grid. Samples above a
//! magnitude threshold are summed into coarse buckets, and the buckets are
//! densified into a normalized 2-D field that is saved with enough metadata
//! to skip the build on the next run.
//!
//! Pipeline: [`WaveSampler`] → [`SparseAccumulator`] → [`DenseField`],
//! driven by [`FieldBuilder`], persisted by [`ResumableStore`], and tied
//! together by [`run_in`].

pub mod accumulator;
pub mod builder;
pub mod config;
pub mod error;
pub mod field;
pub mod progress;
pub mod run;
pub mod store;
pub mod wave;

pub use accumulator::{BucketKey, SparseAccumulator};
pub use builder::{chunk_ranges, BuildStats, FieldBuild, FieldBuilder};
pub use config::{FieldConfig, StorePaths, PHI};
pub use error::{FieldError, FieldResult};
pub use field::DenseField;
pub use progress::{ChunkProgress, LogProgress, ProgressReporter, SilentProgress};
pub use run::{run_in, RunExitCode, RunOutcome};
pub use store::{FieldMetadata, ResumableStore, StoredArtifact};
pub use wave::{Phase, WaveDirection, WaveSampler};

#[cfg(test)]
mod tests;
