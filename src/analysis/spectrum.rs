//! One-sided FFT spectrum.
//!
//! Rectangular window, no zero padding: bin `k` sits at `k * fs / N`, and
//! only the first `N / 2` bins (DC up to just below Nyquist) are kept.

use num_complex::Complex64;
use rustfft::FftPlanner;

/// Positive-frequency half of a signal's DFT.
#[derive(Debug, Clone)]
pub struct Spectrum {
    /// Bin frequencies (Hz)
    pub frequencies: Vec<f64>,
    /// Unnormalized DFT coefficients
    pub bins: Vec<Complex64>,
    /// Number of input samples
    pub len: usize,
    /// Sampling rate (Hz)
    pub sample_rate: f64,
}

impl Spectrum {
    /// Compute the spectrum of uniformly sampled data.
    pub fn compute(samples: &[f64], sample_rate: f64) -> Self {
        let n = samples.len();
        if n < 2 || !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Self {
                frequencies: Vec::new(),
                bins: Vec::new(),
                len: n,
                sample_rate,
            };
        }

        let mut buffer: Vec<Complex64> = samples.iter().map(|&x| Complex64::new(x, 0.0)).collect();
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);
        fft.process(&mut buffer);

        let half = n / 2;
        buffer.truncate(half);
        let resolution = sample_rate / n as f64;
        Self {
            frequencies: (0..half).map(|k| k as f64 * resolution).collect(),
            bins: buffer,
            len: n,
            sample_rate,
        }
    }

    /// Check if the spectrum has no bins.
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Bin spacing (Hz).
    pub fn resolution(&self) -> f64 {
        if self.len == 0 {
            0.0
        } else {
            self.sample_rate / self.len as f64
        }
    }

    /// Index of the bin nearest to `frequency`.
    pub fn nearest_bin(&self, frequency: f64) -> Option<usize> {
        if self.is_empty() || !frequency.is_finite() {
            return None;
        }
        let k = (frequency.max(0.0) / self.resolution()).round() as usize;
        Some(k.min(self.bins.len() - 1))
    }

    /// |X[k]|, unnormalized.
    pub fn magnitude(&self, bin: usize) -> f64 {
        self.bins.get(bin).map_or(0.0, |c| c.norm())
    }

    /// |X[k]| / N.
    pub fn amplitude(&self, bin: usize) -> f64 {
        if self.len == 0 {
            0.0
        } else {
            self.magnitude(bin) / self.len as f64
        }
    }

    /// Phase of a bin in degrees.
    pub fn phase_degrees(&self, bin: usize) -> f64 {
        self.bins.get(bin).map_or(0.0, |c| c.arg().to_degrees())
    }

    /// Bins whose frequency lies in `[low, high]`.
    pub fn bins_between(&self, low: f64, high: f64) -> impl Iterator<Item = usize> + '_ {
        self.frequencies
            .iter()
            .enumerate()
            .filter(move |(_, f)| **f >= low && **f <= high)
            .map(|(k, _)| k)
    }
}

/// `n` points spaced logarithmically from `start` to `stop` inclusive.
pub fn logspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    let (a, b) = (start.log10(), stop.log10());
    linspace(a, b, n).into_iter().map(|x| 10f64.powf(x)).collect()
}

/// `n` points spaced linearly from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| start + i as f64 * step).collect()
        }
    }
}
