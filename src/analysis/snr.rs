//! Signal-to-noise ratio against an independently drawn noise realization.
//!
//! The noise is Gaussian with `sigma = noise_level * std(signal)`, the same
//! model used to build the noisy output, but drawn separately so the metric
//! does not depend on the realization that was displayed.

use crate::solver::generator::std_dev;
use crate::solver::NoiseSource;

use super::spectrum::{logspace, Spectrum};

/// SNR reported when no noise is injected (dB).
pub const MAX_SNR_DB: f64 = 100.0;

/// Lowest reported noise floor (dB).
pub const MIN_NOISE_FLOOR_DB: f64 = -120.0;

/// Number of bands in the SNR spectrum.
pub const SPECTRUM_BANDS: usize = 50;

/// Relative half-width of each SNR spectrum band.
const BAND_WIDTH: f64 = 0.1;

/// Overall SNR and noise floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnrReading {
    /// 10 log10(P_signal / P_noise), clamped to [0, 100] dB
    pub snr_db: f64,
    /// 10 log10(P_noise) - 120, clamped to [-120, 0] dB
    pub noise_floor_db: f64,
}

fn mean_power(x: &[f64]) -> f64 {
    if x.is_empty() {
        0.0
    } else {
        x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64
    }
}

/// Draw the noise realization used by the SNR figures.
pub fn draw_noise(signal: &[f64], noise_level: f64, noise: &mut NoiseSource) -> Vec<f64> {
    noise.gaussian(signal.len(), noise_level.max(0.0) * std_dev(signal))
}

/// SNR and noise floor of `signal` against `noise`.
pub fn snr(signal: &[f64], noise: &[f64]) -> SnrReading {
    let signal_power = mean_power(signal);
    if signal.is_empty() || signal_power <= 0.0 {
        return SnrReading {
            snr_db: 0.0,
            noise_floor_db: MIN_NOISE_FLOOR_DB,
        };
    }
    let noise_power = mean_power(noise);
    if noise_power <= 0.0 {
        return SnrReading {
            snr_db: MAX_SNR_DB,
            noise_floor_db: MIN_NOISE_FLOOR_DB,
        };
    }
    SnrReading {
        snr_db: (10.0 * (signal_power / noise_power).log10()).clamp(0.0, MAX_SNR_DB),
        noise_floor_db: (10.0 * noise_power.log10() - 120.0).clamp(MIN_NOISE_FLOOR_DB, 0.0),
    }
}

/// SNR over 50 log bands from 20 Hz to 20 kHz. Each band compares mean bin
/// power within +-10 % of its center; bands with no bins read 0 dB.
pub fn snr_spectrum(signal: &[f64], noise: &[f64], sample_rate: f64) -> Vec<(f64, f64)> {
    let bands = logspace(20.0, 20_000.0, SPECTRUM_BANDS);
    let signal_spectrum = Spectrum::compute(signal, sample_rate);
    let noise_spectrum = Spectrum::compute(noise, sample_rate);

    bands
        .into_iter()
        .map(|f| {
            let bins: Vec<usize> = signal_spectrum
                .bins_between(f * (1.0 - BAND_WIDTH), f * (1.0 + BAND_WIDTH))
                .collect();
            if bins.is_empty() {
                return (f, 0.0);
            }
            let count = bins.len() as f64;
            let p_signal = bins.iter().map(|&k| signal_spectrum.magnitude(k).powi(2)).sum::<f64>() / count;
            let p_noise = bins.iter().map(|&k| noise_spectrum.magnitude(k).powi(2)).sum::<f64>() / count;
            let db = if p_noise <= 0.0 {
                MAX_SNR_DB
            } else if p_signal <= 0.0 {
                0.0
            } else {
                10.0 * (p_signal / p_noise).log10()
            };
            (f, db.clamp(0.0, MAX_SNR_DB))
        })
        .collect()
}
