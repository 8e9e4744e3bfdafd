//! Sparse accumulation of thresholded wave samples into coarse buckets.

use std::collections::HashMap;

use ndarray::Array2;
use num_complex::Complex64;

use crate::field::DenseField;

/// Coarse (row, col) bucket coordinate.
pub type BucketKey = (usize, usize);

/// Running complex sums keyed by downsampled coordinate.
///
/// Every accepted sample adds into its bucket; nothing is ever replaced or
/// dropped, so the final map is independent of the order in which chunks
/// and directions are fed in.
#[derive(Clone, Debug)]
pub struct SparseAccumulator {
    threshold: f64,
    buckets: HashMap<BucketKey, Complex64>,
    contributions: u64,
}

impl SparseAccumulator {
    pub fn new(threshold: f64) -> Self {
        SparseAccumulator {
            threshold,
            buckets: HashMap::new(),
            contributions: 0,
        }
    }

    /// A sample counts only if it is finite and its magnitude strictly
    /// exceeds the threshold.
    pub fn accepts(&self, value: Complex64) -> bool {
        value.is_finite() && value.norm() > self.threshold
    }

    /// Fold every accepted entry of `block` into its bucket.
    ///
    /// Entry (i, j) lands in `((chunk_start + i) / downsample,
    /// (chunk_start + j) / downsample)`. Returns how many entries were added.
    pub fn add_if_above_threshold(
        &mut self,
        block: &Array2<Complex64>,
        chunk_start: usize,
        downsample: usize,
    ) -> usize {
        let mut added = 0;
        for ((i, j), &value) in block.indexed_iter() {
            if !self.accepts(value) {
                continue;
            }
            let key = ((chunk_start + i) / downsample, (chunk_start + j) / downsample);
            self.add(key, value);
            added += 1;
        }
        added
    }

    /// Add a single contribution without a threshold check.
    pub fn add(&mut self, key: BucketKey, value: Complex64) {
        *self.buckets.entry(key).or_insert(Complex64::new(0.0, 0.0)) += value;
        self.contributions += 1;
    }

    /// Fold another accumulator in, as if its contributions had been added
    /// here directly.
    pub fn merge(&mut self, other: SparseAccumulator) {
        for (key, value) in other.buckets {
            *self.buckets.entry(key).or_insert(Complex64::new(0.0, 0.0)) += value;
        }
        self.contributions += other.contributions;
    }

    /// Number of distinct buckets.
    pub fn size(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total accepted samples across all buckets.
    pub fn contributions(&self) -> u64 {
        self.contributions
    }

    pub fn get(&self, key: BucketKey) -> Option<Complex64> {
        self.buckets.get(&key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = &BucketKey> {
        self.buckets.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&BucketKey, &Complex64)> {
        self.buckets.iter()
    }

    /// Densify over the bounding box of all keys, keep the real part, and
    /// normalize to [0, 1]. An empty accumulator yields a 1×1 zero field.
    pub fn finalize(&self) -> DenseField {
        let Some(((r0, r1), (c0, c1))) = self.bounds() else {
            return DenseField::empty();
        };

        let mut data = Array2::<f64>::zeros((r1 - r0 + 1, c1 - c0 + 1));
        for (&(r, c), value) in &self.buckets {
            data[[r - r0, c - c0]] += value.re;
        }

        let mut field = DenseField::new(data, (r0, c0));
        field.normalize();
        field
    }

    /// ((row_min, row_max), (col_min, col_max)), or None when empty.
    fn bounds(&self) -> Option<((usize, usize), (usize, usize))> {
        let mut keys = self.buckets.keys();
        let &(r, c) = keys.next()?;
        Some(keys.fold(((r, r), (c, c)), |((r0, r1), (c0, c1)), &(r, c)| {
            ((r0.min(r), r1.max(r)), (c0.min(c), c1.max(c)))
        }))
    }
}
