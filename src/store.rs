//! On-disk persistence of the finished field.
//!
//! Two files make up an artifact: the field payload and a JSON metadata
//! record. A third file, the build marker, exists only while a build is in
//! flight; finding it at startup means a previous run was interrupted.
//!
//! Field file format:
//! - Header: magic `GIFD`, version u8, rows u64 LE, cols u64 LE
//! - Body: bincode-serialized `Vec<f64>` in row-major order
//! - Footer: xxhash64 checksum of all preceding bytes

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use ndarray::Array2;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use crate::builder::FieldBuild;
use crate::config::{FieldConfig, StorePaths};
use crate::error::{FieldError, FieldResult};
use crate::field::DenseField;

pub const FIELD_MAGIC: [u8; 4] = *b"GIFD";
pub const FIELD_VERSION: u8 = 1;

const HEADER_LEN: usize = 4 + 1 + 8 + 8;
const CHECKSUM_LEN: usize = 8;

pub const GENERATOR: &str = "dodecagonal-golden-interference";

/// Summary record saved next to the field.
///
/// `bucket_count` is the number of distinct sparse buckets before
/// densification. It may be absent in records written by hand or damaged
/// on disk; the loader then falls back to counting nonzero cells.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldMetadata {
    pub generator: String,
    pub generated: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub bucket_count: Option<usize>,
    pub shape: (usize, usize),
    pub origin: (usize, usize),
    pub sparsity: f64,
    pub config: FieldConfig,
}

impl FieldMetadata {
    pub fn from_build(config: &FieldConfig, build: &FieldBuild) -> Self {
        let field = &build.field;
        FieldMetadata {
            generator: GENERATOR.to_string(),
            generated: Utc::now(),
            bucket_count: Some(build.stats.buckets),
            shape: field.shape(),
            origin: field.origin,
            sparsity: 1.0 - build.stats.buckets as f64 / field.len() as f64,
            config: config.clone(),
        }
    }
}

/// Accept any JSON value for the count; anything other than a
/// non-negative integer reads as missing.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_u64().and_then(|n| usize::try_from(n).ok()))
}

/// A field and its metadata as loaded from disk.
#[derive(Clone, Debug)]
pub struct StoredArtifact {
    pub field: DenseField,
    /// `None` when the record was unreadable but the field itself was
    /// intact; the field origin then defaults to (0, 0).
    pub metadata: Option<FieldMetadata>,
    /// Count to report on resume: the recorded bucket count, or the
    /// nonzero cell count when the record lacks one.
    pub bucket_count: usize,
}

pub struct ResumableStore {
    paths: StorePaths,
}

impl ResumableStore {
    pub fn new(paths: StorePaths) -> Self {
        ResumableStore { paths }
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Remove a marker left by an interrupted build. Returns whether one
    /// was found.
    pub fn clear_stale_marker(&self) -> bool {
        if !self.paths.lock.exists() {
            return false;
        }
        info!("Removing stale lock file {:?}", self.paths.lock);
        if let Err(e) = remove_if_present(&self.paths.lock) {
            warn!("Could not remove stale lock file {:?}: {}", self.paths.lock, e);
        }
        true
    }

    pub fn mark_building(&self) -> FieldResult<()> {
        fs::write(&self.paths.lock, b"").map_err(|e| FieldError::persistence(&self.paths.lock, e))
    }

    /// Load a previously saved artifact.
    ///
    /// Returns `None` if either file is missing. An unreadable metadata
    /// record alone does not block a resume; a damaged field, or a field
    /// whose shape disagrees with its record, discards both files so the
    /// caller rebuilds from scratch.
    pub fn try_load(&self) -> Option<StoredArtifact> {
        if !(self.paths.state.exists() && self.paths.field.exists()) {
            return None;
        }
        info!("Resuming from existing field {:?}", self.paths.field);

        match self.load() {
            Ok(artifact) => Some(artifact),
            Err(e) => {
                warn!("Resume failed ({}); rebuilding", e);
                self.discard();
                None
            }
        }
    }

    fn load(&self) -> FieldResult<StoredArtifact> {
        let field_path = &self.paths.field;
        let bytes = fs::read(field_path).map_err(|e| FieldError::stale(field_path, e))?;
        let data = decode_field(&bytes).map_err(|reason| FieldError::stale(field_path, reason))?;

        let state_path = &self.paths.state;
        let metadata = match read_metadata(state_path) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!("{}; resuming from the field alone", e);
                None
            }
        };

        if let Some(metadata) = &metadata {
            if data.dim() != metadata.shape {
                return Err(FieldError::stale(
                    field_path,
                    format!(
                        "shape {:?} does not match recorded shape {:?}",
                        data.dim(),
                        metadata.shape
                    ),
                ));
            }
        }

        let origin = metadata.as_ref().map_or((0, 0), |m| m.origin);
        let field = DenseField::new(data, origin);
        let bucket_count = match metadata.as_ref().and_then(|m| m.bucket_count) {
            Some(count) => count,
            None => {
                warn!("Metadata has no bucket count; counting nonzero cells instead");
                field.nonzero_count()
            }
        };

        debug!(
            "Loaded field {:?} with {} buckets from {:?}",
            field.shape(),
            bucket_count,
            field_path
        );
        Ok(StoredArtifact {
            field,
            metadata,
            bucket_count,
        })
    }

    /// Write field and metadata, each through a temporary file renamed into
    /// place, then drop the build marker.
    pub fn save(&self, field: &DenseField, metadata: &FieldMetadata) -> FieldResult<()> {
        let bytes = encode_field(&field.data)
            .map_err(|e| FieldError::persistence(&self.paths.field, e))?;
        write_atomic(&self.paths.field, &bytes)?;

        let json = serde_json::to_string_pretty(metadata)
            .map_err(|e| FieldError::persistence(&self.paths.state, e))?;
        write_atomic(&self.paths.state, json.as_bytes())?;

        if let Err(e) = remove_if_present(&self.paths.lock) {
            warn!("Could not remove lock file {:?}: {}", self.paths.lock, e);
        }

        info!(
            "Saved field {:?} to {:?} and state to {:?}",
            field.shape(),
            self.paths.field,
            self.paths.state
        );
        Ok(())
    }

    /// Remove both artifact files.
    pub fn discard(&self) {
        for path in [&self.paths.field, &self.paths.state] {
            if let Err(e) = remove_if_present(path) {
                warn!("Could not remove {:?}: {}", path, e);
            }
        }
    }
}

fn read_metadata(path: &Path) -> FieldResult<FieldMetadata> {
    let text = fs::read_to_string(path).map_err(|e| FieldError::stale(path, e))?;
    serde_json::from_str(&text).map_err(|e| FieldError::stale(path, e))
}

fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> FieldResult<()> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, bytes).map_err(|e| FieldError::persistence(&temp_path, e))?;
    fs::rename(&temp_path, path).map_err(|e| FieldError::persistence(path, e))
}

pub fn encode_field(data: &Array2<f64>) -> Result<Vec<u8>, bincode::Error> {
    let (rows, cols) = data.dim();
    let values: Vec<f64> = data.iter().copied().collect();

    let mut buf = Vec::with_capacity(HEADER_LEN + 8 + values.len() * 8 + CHECKSUM_LEN);
    buf.extend_from_slice(&FIELD_MAGIC);
    buf.push(FIELD_VERSION);
    buf.extend_from_slice(&(rows as u64).to_le_bytes());
    buf.extend_from_slice(&(cols as u64).to_le_bytes());
    buf.extend_from_slice(&bincode::serialize(&values)?);

    let checksum = xxhash_rust::xxh64::xxh64(&buf, 0);
    buf.extend_from_slice(&checksum.to_le_bytes());
    Ok(buf)
}

pub fn decode_field(bytes: &[u8]) -> Result<Array2<f64>, String> {
    if bytes.len() < HEADER_LEN + CHECKSUM_LEN {
        return Err(format!("file too small ({} bytes)", bytes.len()));
    }
    let (body, footer) = bytes.split_at(bytes.len() - CHECKSUM_LEN);

    let stored = u64::from_le_bytes(read_array(footer)?);
    let computed = xxhash_rust::xxh64::xxh64(body, 0);
    if stored != computed {
        return Err(format!(
            "checksum mismatch: stored {stored:#018x}, computed {computed:#018x}"
        ));
    }

    if body[..4] != FIELD_MAGIC {
        return Err("bad magic bytes".to_string());
    }
    if body[4] != FIELD_VERSION {
        return Err(format!("unsupported version {}", body[4]));
    }
    let rows = u64::from_le_bytes(read_array(&body[5..13])?) as usize;
    let cols = u64::from_le_bytes(read_array(&body[13..21])?) as usize;

    let values: Vec<f64> =
        bincode::deserialize(&body[HEADER_LEN..]).map_err(|e| format!("bad payload: {e}"))?;
    Array2::from_shape_vec((rows, cols), values).map_err(|e| format!("bad shape {rows}x{cols}: {e}"))
}

fn read_array(bytes: &[u8]) -> Result<[u8; 8], String> {
    bytes
        .try_into()
        .map_err(|_| format!("expected 8 bytes, got {}", bytes.len()))
}
