use std::f64::consts::PI;

use ndarray::Array2;
use num_complex::Complex64;

use crate::config::{FieldConfig, PHI};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Phase(pub f64); // angle in radians

impl Phase {
    /// k-th of `count` evenly spaced angles on [0, 2π)
    pub fn from_index(k: usize, count: usize) -> Self {
        Phase((k % count) as f64 * 2.0 * PI / count as f64)
    }

    /// Rotate by π/Φ, the golden offset between a direction's two terms.
    pub fn golden_offset(&self) -> Self {
        Phase(self.0 + PI / PHI)
    }

    pub fn degrees(&self) -> f64 {
        self.0 * 180.0 / PI
    }
}

/// One of the W interference directions: θ_k drives the forward sine term,
/// φ_k = θ_k + π/Φ drives the reverse cosine term.
#[derive(Clone, Copy, Debug)]
pub struct WaveDirection {
    pub theta: Phase,
    pub phi: Phase,
}

impl WaveDirection {
    pub fn new(k: usize, count: usize) -> Self {
        let theta = Phase::from_index(k, count);
        WaveDirection {
            theta,
            phi: theta.golden_offset(),
        }
    }

    /// sin(n·θ_k)
    pub fn forward(&self, n: usize) -> f64 {
        (n as f64 * self.theta.0).sin()
    }

    /// cos(n·φ_k)
    pub fn reverse(&self, n: usize) -> f64 {
        (n as f64 * self.phi.0).cos()
    }
}

/// Synthesizes the complex wave block of one chunk for one direction.
///
/// The sampler is a pure function of its configuration. Overflowing or
/// NaN inputs are not checked here; they surface as non-finite entries and
/// are dropped by the accumulator's threshold test.
#[derive(Clone, Debug)]
pub struct WaveSampler {
    directions: Vec<WaveDirection>,
    carrier_freq: f64,
    inv_phi: f64,
}

impl WaveSampler {
    pub fn new(config: &FieldConfig) -> Self {
        let directions = (0..config.wave_count)
            .map(|k| WaveDirection::new(k, config.wave_count))
            .collect();
        WaveSampler {
            directions,
            carrier_freq: config.carrier_freq,
            inv_phi: PHI.recip(),
        }
    }

    pub fn directions(&self) -> &[WaveDirection] {
        &self.directions
    }

    /// carrier[i] = exp(i·2π·f_c·t_i) with t_i = i / len (end excluded)
    pub fn carrier(&self, len: usize) -> Vec<Complex64> {
        (0..len)
            .map(|i| {
                let t = i as f64 / len as f64;
                Complex64::from_polar(1.0, 2.0 * PI * self.carrier_freq * t)
            })
            .collect()
    }

    /// block[i,j] = carrier[i]·sin(n_j·θ_k) + Φ⁻¹·carrier[i]·cos(n_j·φ_k)
    /// for global node indices n_j in [chunk_start, chunk_end).
    ///
    /// Panics if `chunk_start >= chunk_end` or `wave_index` is out of range.
    pub fn sample(&self, chunk_start: usize, chunk_end: usize, wave_index: usize) -> Array2<Complex64> {
        assert!(
            chunk_start < chunk_end,
            "empty chunk {chunk_start}..{chunk_end}"
        );
        let direction = &self.directions[wave_index];
        let len = chunk_end - chunk_start;
        let carrier = self.carrier(len);

        let fwd: Vec<f64> = (chunk_start..chunk_end).map(|n| direction.forward(n)).collect();
        let rev: Vec<f64> = (chunk_start..chunk_end).map(|n| direction.reverse(n)).collect();

        Array2::from_shape_fn((len, len), |(i, j)| {
            carrier[i] * fwd[j] + (carrier[i] * rev[j]) * self.inv_phi
        })
    }
}
