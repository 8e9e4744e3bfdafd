use std::collections::BTreeSet;

use crate::accumulator::BucketKey;
use crate::builder::{chunk_ranges, BuildStats, FieldBuilder};
use crate::config::FieldConfig;
use crate::error::FieldError;
use crate::progress::{ChunkProgress, ProgressReporter, SilentProgress};

/// Records every notification for inspection.
#[derive(Default)]
struct RecordingProgress {
    chunks: Vec<ChunkProgress>,
    completed: Option<BuildStats>,
}

impl ProgressReporter for RecordingProgress {
    fn on_chunk(&mut self, progress: &ChunkProgress) {
        self.chunks.push(progress.clone());
    }

    fn on_complete(&mut self, stats: &BuildStats) {
        self.completed = Some(stats.clone());
    }
}

/// Keys reachable when every entry is accepted: both indices must come
/// from the same chunk.
fn same_chunk_keys(node_count: usize, chunk_size: usize, downsample: usize) -> BTreeSet<BucketKey> {
    let mut keys = BTreeSet::new();
    for range in chunk_ranges(node_count, chunk_size) {
        for i in range.clone() {
            for j in range.clone() {
                keys.insert((i / downsample, j / downsample));
            }
        }
    }
    keys
}

// =============================================================================
// Chunk tiling
// =============================================================================
#[test]
fn test_chunk_ranges_tile_index_space() {
    let ranges: Vec<_> = chunk_ranges(13, 5).collect();
    assert_eq!(ranges, vec![0..5, 5..10, 10..13]);

    let exact: Vec<_> = chunk_ranges(10, 5).collect();
    assert_eq!(exact, vec![0..5, 5..10]);

    let reference = FieldConfig::default();
    let all: Vec<_> = chunk_ranges(reference.node_count, reference.chunk_size).collect();
    assert_eq!(all.len(), reference.chunk_count());
    assert_eq!(all.last(), Some(&(143_872..144_000)));
}

// =============================================================================
// End-to-end: 10 nodes, 2 waves, chunk 5, accept everything, downsample 2
// =============================================================================
#[test]
fn test_small_grid_end_to_end() {
    let config = FieldConfig {
        node_count: 10,
        wave_count: 2,
        chunk_size: 5,
        threshold: 0.0,
        downsample: 2,
        ..FieldConfig::default()
    };
    let builder = FieldBuilder::new(config.clone()).unwrap();
    let acc = builder.accumulate(&mut SilentProgress);

    // 2 chunks × 2 waves × 25 entries, all above a zero threshold
    assert_eq!(acc.contributions(), 100);

    let keys: BTreeSet<BucketKey> = acc.keys().copied().collect();
    println!("  keys: {:?}", keys);
    assert_eq!(keys, same_chunk_keys(10, 5, 2));
    // Blocks never pair nodes from different chunks.
    assert!(!keys.contains(&(0, 4)));
    assert!(keys.contains(&(2, 2)));

    let field = builder.build();
    println!("  field {:?}\n{}", field.shape(), field.data);
    assert_eq!(field.shape(), (5, 5));
    assert_eq!(field.origin, (0, 0));
    assert_eq!(field.range(), (0.0, 1.0));
    assert!(field.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
}

// =============================================================================
// Boundary: node_count not divisible by chunk_size
// =============================================================================
#[test]
fn test_short_last_chunk_uses_global_indices() {
    let config = FieldConfig {
        node_count: 13,
        wave_count: 3,
        chunk_size: 5,
        threshold: 0.0,
        downsample: 1,
        ..FieldConfig::default()
    };
    let builder = FieldBuilder::new(config).unwrap();
    let mut progress = RecordingProgress::default();
    let acc = builder.accumulate(&mut progress);

    // (25 + 25 + 9) entries per wave
    assert_eq!(acc.contributions(), 3 * 59);
    let keys: BTreeSet<BucketKey> = acc.keys().copied().collect();
    assert_eq!(keys, same_chunk_keys(13, 5, 1));
    assert!(keys.contains(&(12, 12)));
    assert!(keys.contains(&(10, 12)));
    assert!(keys.iter().all(|&(r, c)| r < 13 && c < 13));

    assert_eq!(progress.chunks.len(), 3);
    assert!((progress.chunks[2].fraction() - 1.0).abs() < 1e-12);
}

// =============================================================================
// Determinism: two independent builds agree exactly
// =============================================================================
#[test]
fn test_builds_are_deterministic() {
    let config = FieldConfig {
        node_count: 300,
        chunk_size: 64,
        downsample: 8,
        ..FieldConfig::default()
    };

    let first = FieldBuilder::new(config.clone()).unwrap().build_with(&mut SilentProgress);
    let second = FieldBuilder::new(config).unwrap().build_with(&mut SilentProgress);

    println!(
        "  buckets {} contributions {} shape {:?}",
        first.stats.buckets,
        first.stats.contributions,
        first.field.shape()
    );
    assert!(first.stats.buckets > 0);
    assert_eq!(first.stats.buckets, second.stats.buckets);
    assert_eq!(first.stats.contributions, second.stats.contributions);
    assert_eq!(first.field, second.field);

    let (lo, hi) = first.field.range();
    assert_eq!((lo, hi), (0.0, 1.0));
}

// =============================================================================
// Threshold never matched: 1×1 zero field
// =============================================================================
#[test]
fn test_unreachable_threshold_gives_empty_field() {
    let config = FieldConfig {
        node_count: 40,
        chunk_size: 16,
        threshold: 1.0e9,
        ..FieldConfig::default()
    };
    let mut progress = RecordingProgress::default();
    let build = FieldBuilder::new(config).unwrap().build_with(&mut progress);

    assert_eq!(build.stats.buckets, 0);
    assert_eq!(build.stats.contributions, 0);
    assert_eq!(build.field.shape(), (1, 1));
    assert_eq!(build.field.data[[0, 0]], 0.0);
    assert_eq!(progress.completed, Some(build.stats.clone()));
}

// =============================================================================
// Stats and progress line up with the accumulator
// =============================================================================
#[test]
fn test_progress_tracks_each_chunk() {
    let config = FieldConfig {
        node_count: 100,
        chunk_size: 32,
        downsample: 4,
        ..FieldConfig::default()
    };
    let mut progress = RecordingProgress::default();
    let build = FieldBuilder::new(config.clone()).unwrap().build_with(&mut progress);

    assert_eq!(progress.chunks.len(), config.chunk_count());
    for (n, p) in progress.chunks.iter().enumerate() {
        assert_eq!(p.chunk_index, n);
        assert_eq!(p.total_chunks, 4);
    }
    let last = progress.chunks.last().unwrap();
    assert_eq!(last.buckets, build.stats.buckets);
    assert_eq!(last.contributions, build.stats.contributions);
    assert_eq!(build.stats.chunks, 4);

    // Contribution counts never decrease.
    assert!(progress
        .chunks
        .windows(2)
        .all(|w| w[0].contributions <= w[1].contributions));
}

// =============================================================================
// Degenerate sizes are rejected before any chunk is touched
// =============================================================================
#[test]
fn test_builder_rejects_zero_chunk_and_downsample() {
    let zero_chunk = FieldConfig {
        node_count: 10,
        chunk_size: 0,
        ..FieldConfig::default()
    };
    let err = FieldBuilder::new(zero_chunk).err().expect("chunk_size 0 must be rejected");
    assert!(matches!(err, FieldError::InvalidConfig { field: "chunk_size", .. }));

    let zero_downsample = FieldConfig {
        node_count: 10,
        downsample: 0,
        ..FieldConfig::default()
    };
    let err = FieldBuilder::new(zero_downsample).err().expect("downsample 0 must be rejected");
    assert!(matches!(err, FieldError::InvalidConfig { field: "downsample", .. }));
}
