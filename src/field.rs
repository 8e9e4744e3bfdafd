use ndarray::Array2;

/// Real-valued downsampled field covering the bounding box of observed
/// buckets. `origin` is the (row, col) bucket of cell [0, 0].
#[derive(Clone, Debug, PartialEq)]
pub struct DenseField {
    pub data: Array2<f64>,
    pub origin: (usize, usize),
}

impl DenseField {
    pub fn new(data: Array2<f64>, origin: (usize, usize)) -> Self {
        DenseField { data, origin }
    }

    /// The 1×1 zero field produced when nothing crossed the threshold.
    pub fn empty() -> Self {
        DenseField {
            data: Array2::zeros((1, 1)),
            origin: (0, 0),
        }
    }

    /// (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn nbytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f64>()
    }

    pub fn nonzero_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0.0).count()
    }

    /// Value at a global bucket coordinate, if it lies inside the box.
    pub fn at_bucket(&self, row: usize, col: usize) -> Option<f64> {
        let r = row.checked_sub(self.origin.0)?;
        let c = col.checked_sub(self.origin.1)?;
        self.data.get((r, c)).copied()
    }

    /// (min, max) over all cells.
    pub fn range(&self) -> (f64, f64) {
        self.data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Rescale so the minimum becomes 0 and the maximum 1.
    /// A flat field (max == min) is left untouched.
    pub fn normalize(&mut self) {
        let (lo, hi) = self.range();
        let span = hi - lo;
        if span > 0.0 && span.is_finite() {
            self.data.mapv_inplace(|v| (v - lo) / span);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_normalize_maps_range_to_unit_interval() {
        let mut field = DenseField::new(array![[-2.0, 0.0], [2.0, 6.0]], (0, 0));
        field.normalize();
        assert_eq!(field.data, array![[0.0, 0.25], [0.5, 1.0]]);
    }

    #[test]
    fn test_normalize_flat_field_is_noop() {
        let mut field = DenseField::new(array![[3.0, 3.0], [3.0, 3.0]], (4, 4));
        field.normalize();
        assert_eq!(field.data, array![[3.0, 3.0], [3.0, 3.0]]);

        let mut empty = DenseField::empty();
        empty.normalize();
        assert_eq!(empty.data, array![[0.0]]);
    }

    #[test]
    fn test_at_bucket_uses_origin() {
        let field = DenseField::new(array![[1.0, 2.0], [3.0, 4.0]], (10, 20));
        assert_eq!(field.at_bucket(11, 20), Some(3.0));
        assert_eq!(field.at_bucket(9, 20), None);
        assert_eq!(field.at_bucket(12, 21), None);
    }

    #[test]
    fn test_nonzero_count_and_size() {
        let field = DenseField::new(array![[0.0, 1.0], [0.0, 0.5]], (0, 0));
        assert_eq!(field.nonzero_count(), 2);
        assert_eq!(field.nbytes(), 32);
    }
}
