//! Chunked synthesis driver: chunks × directions → accumulator → field.

use std::ops::Range;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::accumulator::SparseAccumulator;
use crate::config::FieldConfig;
use crate::error::FieldResult;
use crate::field::DenseField;
use crate::progress::{ChunkProgress, ProgressReporter, SilentProgress};
use crate::wave::WaveSampler;

/// Counters gathered over one build.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildStats {
    pub chunks: usize,
    /// Distinct buckets in the accumulator
    pub buckets: usize,
    /// Accepted samples summed into those buckets
    pub contributions: u64,
    pub elapsed: Duration,
}

/// A finished build: the normalized field and how it was reached.
#[derive(Clone, Debug)]
pub struct FieldBuild {
    pub field: DenseField,
    pub stats: BuildStats,
}

/// Contiguous chunks tiling [0, node_count); the last one is clipped.
pub fn chunk_ranges(node_count: usize, chunk_size: usize) -> impl Iterator<Item = Range<usize>> {
    (0..node_count)
        .step_by(chunk_size.max(1))
        .map(move |start| start..(start + chunk_size).min(node_count))
}

pub struct FieldBuilder {
    config: FieldConfig,
    sampler: WaveSampler,
}

impl FieldBuilder {
    /// Rejects configurations that fail [`FieldConfig::validate`], such as a
    /// zero chunk size or downsample factor.
    pub fn new(config: FieldConfig) -> FieldResult<Self> {
        config.validate()?;
        let sampler = WaveSampler::new(&config);
        Ok(FieldBuilder { config, sampler })
    }

    pub fn build(&self) -> DenseField {
        self.build_with(&mut SilentProgress).field
    }

    pub fn build_with(&self, reporter: &mut dyn ProgressReporter) -> FieldBuild {
        let started = Instant::now();
        let accumulator = self.accumulate(reporter);

        info!("Densifying {} buckets", accumulator.size());
        let field = accumulator.finalize();

        let stats = BuildStats {
            chunks: self.config.chunk_count(),
            buckets: accumulator.size(),
            contributions: accumulator.contributions(),
            elapsed: started.elapsed(),
        };
        reporter.on_complete(&stats);
        FieldBuild { field, stats }
    }

    /// Run every chunk and direction in order, returning the raw sums.
    pub fn accumulate(&self, reporter: &mut dyn ProgressReporter) -> SparseAccumulator {
        let config = &self.config;
        let total_chunks = config.chunk_count();
        let mut accumulator = SparseAccumulator::new(config.threshold);
        let started = Instant::now();

        info!(
            "Starting {}-fold golden interference build: {} nodes, chunk {}, downsample {}",
            config.wave_count, config.node_count, config.chunk_size, config.downsample
        );

        for (chunk_index, range) in chunk_ranges(config.node_count, config.chunk_size).enumerate() {
            let mut added = 0;
            for wave_index in 0..config.wave_count {
                let block = self.sampler.sample(range.start, range.end, wave_index);
                added += accumulator.add_if_above_threshold(&block, range.start, config.downsample);
            }
            debug!(chunk_index, start = range.start, end = range.end, added, "chunk done");

            reporter.on_chunk(&ChunkProgress {
                chunk_index,
                total_chunks,
                buckets: accumulator.size(),
                contributions: accumulator.contributions(),
                elapsed: started.elapsed(),
            });
        }

        accumulator
    }
}
