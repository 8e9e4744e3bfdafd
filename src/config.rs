use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FieldError, FieldResult};

/// Golden ratio Φ = (1 + √5) / 2
pub const PHI: f64 = 1.618_033_988_749_895;

pub const FIELD_FILE: &str = "dodecagonal_golden_field.bin";
pub const STATE_FILE: &str = "dodecagonal_golden_state.json";
pub const LOCK_FILE: &str = "dodecagonal_golden_build.lock";

/// Immutable parameters of one field build.
///
/// `Default` is the reference 12-fold configuration. Smaller values exist
/// for tests; the binary never changes them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    /// Size of the 1-D node index space
    pub node_count: usize,
    /// Number of evenly spaced wave directions
    pub wave_count: usize,
    /// Carrier frequency in cycles per chunk
    pub carrier_freq: f64,
    /// Nodes per chunk (the last chunk may be shorter)
    pub chunk_size: usize,
    /// Magnitude an entry must strictly exceed to be accumulated
    pub threshold: f64,
    /// Fine indices per coarse bucket along each axis
    pub downsample: usize,
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig {
            node_count: 144_000,
            wave_count: 12,
            carrier_freq: 432.0,
            chunk_size: 256,
            threshold: 0.5,
            downsample: 32,
        }
    }
}

impl FieldConfig {
    pub fn validate(&self) -> FieldResult<()> {
        if self.node_count == 0 {
            return Err(FieldError::invalid("node_count", "must be greater than zero"));
        }
        if self.wave_count == 0 {
            return Err(FieldError::invalid("wave_count", "must be greater than zero"));
        }
        if self.chunk_size == 0 {
            return Err(FieldError::invalid("chunk_size", "must be greater than zero"));
        }
        if self.downsample == 0 {
            return Err(FieldError::invalid("downsample", "must be greater than zero"));
        }
        if !self.carrier_freq.is_finite() {
            return Err(FieldError::invalid(
                "carrier_freq",
                format!("must be finite, got {}", self.carrier_freq),
            ));
        }
        if self.threshold.is_nan() || self.threshold < 0.0 {
            return Err(FieldError::invalid(
                "threshold",
                format!("must be a non-negative number, got {}", self.threshold),
            ));
        }
        Ok(())
    }

    /// Number of chunks needed to tile the index space.
    pub fn chunk_count(&self) -> usize {
        self.node_count.div_ceil(self.chunk_size)
    }
}

/// Locations of the three files owned by the store.
#[derive(Clone, Debug)]
pub struct StorePaths {
    pub field: PathBuf,
    pub state: PathBuf,
    pub lock: PathBuf,
}

impl StorePaths {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        StorePaths {
            field: dir.join(FIELD_FILE),
            state: dir.join(STATE_FILE),
            lock: dir.join(LOCK_FILE),
        }
    }
}
