//! Harmonic distortion: THD, THD+N and the per-harmonic table.
//!
//! ```text
//! THD   = sqrt(V2^2 + ... + Vn^2) / V1 * 100
//! THD+N = sqrt(V2^2 + ... + Vn^2 + noise) / V1 * 100
//! ```
//!
//! Harmonic `n` is read from the bin nearest to `n * f0`. "Noise" is every
//! bin that is neither DC nor one of the harmonic bins. Both figures are
//! capped at 100 %.

use super::spectrum::{linspace, Spectrum};

/// Highest harmonic included by default.
pub const DEFAULT_HARMONICS: usize = 10;

/// Number of bands in the THD-vs-frequency sweep.
pub const SWEEP_BANDS: usize = 20;

/// Fundamental amplitudes below this are treated as no signal.
const MIN_FUNDAMENTAL: f64 = 1e-6;

/// One line of the harmonic table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicRow {
    /// Harmonic number, 1 is the fundamental
    pub index: usize,
    /// |X| / N at the harmonic bin (V)
    pub amplitude: f64,
    /// Share of the total harmonic power (fundamental excluded), percent
    pub power_percent: f64,
}

fn harmonic_bins(spectrum: &Spectrum, fundamental: f64, harmonics: usize) -> Vec<usize> {
    (1..=harmonics)
        .filter_map(|n| spectrum.nearest_bin(fundamental * n as f64))
        .collect()
}

/// Total harmonic distortion in percent.
pub fn thd(spectrum: &Spectrum, fundamental: f64, harmonics: usize) -> f64 {
    let bins = harmonic_bins(spectrum, fundamental, harmonics);
    let Some((&first, rest)) = bins.split_first() else {
        return 0.0;
    };
    let fundamental_power = spectrum.magnitude(first).powi(2);
    if fundamental_power <= 0.0 {
        return 0.0;
    }
    let harmonic_power: f64 = rest.iter().map(|&k| spectrum.magnitude(k).powi(2)).sum();
    ((harmonic_power / fundamental_power).sqrt() * 100.0).min(100.0)
}

/// Total harmonic distortion plus noise in percent.
pub fn thd_plus_n(spectrum: &Spectrum, fundamental: f64, harmonics: usize) -> f64 {
    let bins = harmonic_bins(spectrum, fundamental, harmonics);
    let Some(&first) = bins.first() else {
        return 0.0;
    };
    let fundamental_amp = spectrum.amplitude(first);
    if fundamental_amp <= MIN_FUNDAMENTAL {
        return 0.0;
    }

    let mut is_harmonic = vec![false; spectrum.bins.len()];
    for &k in &bins {
        is_harmonic[k] = true;
    }
    let harmonic_power: f64 = bins[1..]
        .iter()
        .filter(|&&k| k != first)
        .map(|&k| spectrum.amplitude(k).powi(2))
        .sum();
    let noise_power: f64 = (1..spectrum.bins.len())
        .filter(|&k| !is_harmonic[k])
        .map(|k| spectrum.amplitude(k).powi(2))
        .sum();

    (100.0 * (harmonic_power + noise_power).sqrt() / fundamental_amp).min(100.0)
}

/// Harmonic table for n = 1..=`harmonics`.
pub fn harmonic_rows(spectrum: &Spectrum, fundamental: f64, harmonics: usize) -> Vec<HarmonicRow> {
    let amplitudes: Vec<(usize, f64)> = (1..=harmonics)
        .filter_map(|n| {
            spectrum
                .nearest_bin(fundamental * n as f64)
                .map(|k| (n, spectrum.amplitude(k)))
        })
        .collect();
    let total: f64 = amplitudes.iter().skip(1).map(|(_, a)| a * a).sum();

    amplitudes
        .into_iter()
        .map(|(index, amplitude)| HarmonicRow {
            index,
            amplitude,
            power_percent: if total > 0.0 {
                amplitude * amplitude / total * 100.0
            } else {
                0.0
            },
        })
        .collect()
}

/// THD with the fundamental swept over 20 bands from 100 Hz to 10 kHz.
pub fn thd_sweep(spectrum: &Spectrum, harmonics: usize) -> Vec<(f64, f64)> {
    linspace(100.0, 10_000.0, SWEEP_BANDS)
        .into_iter()
        .map(|f| (f, thd(spectrum, f, harmonics)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    const FS: f64 = 10_000.0;

    fn signal(components: &[(f64, f64)]) -> Vec<f64> {
        (0..1000)
            .map(|i| {
                let t = i as f64 / FS;
                components
                    .iter()
                    .map(|(f, a)| a * (2.0 * PI * f * t).sin())
                    .sum()
            })
            .collect()
    }

    #[test]
    fn test_pure_tone_has_no_distortion() {
        let spectrum = Spectrum::compute(&signal(&[(500.0, 1.0)]), FS);
        assert!(thd(&spectrum, 500.0, DEFAULT_HARMONICS) < 1e-9);
        assert!(thd_plus_n(&spectrum, 500.0, DEFAULT_HARMONICS) < 1e-9);
    }

    #[test]
    fn test_known_harmonic_content() {
        let spectrum = Spectrum::compute(&signal(&[(500.0, 1.0), (1000.0, 0.1), (1500.0, 0.05)]), FS);
        let expected = (0.1f64.powi(2) + 0.05f64.powi(2)).sqrt() * 100.0;
        assert_relative_eq!(thd(&spectrum, 500.0, DEFAULT_HARMONICS), expected, max_relative = 1e-6);
        assert_relative_eq!(
            thd_plus_n(&spectrum, 500.0, DEFAULT_HARMONICS),
            expected,
            max_relative = 1e-6
        );
    }

    #[test]
    fn test_noise_only_raises_thd_plus_n() {
        let spectrum = Spectrum::compute(&signal(&[(500.0, 1.0), (730.0, 0.2)]), FS);
        assert!(thd(&spectrum, 500.0, DEFAULT_HARMONICS) < 1e-9);
        assert_relative_eq!(thd_plus_n(&spectrum, 500.0, DEFAULT_HARMONICS), 20.0, max_relative = 1e-6);
    }

    #[test]
    fn test_capped_at_100() {
        let spectrum = Spectrum::compute(&signal(&[(500.0, 0.01), (1000.0, 1.0)]), FS);
        assert_eq!(thd(&spectrum, 500.0, DEFAULT_HARMONICS), 100.0);
        assert_eq!(thd_plus_n(&spectrum, 500.0, DEFAULT_HARMONICS), 100.0);
    }

    #[test]
    fn test_silence_is_zero() {
        let spectrum = Spectrum::compute(&vec![0.0; 1000], FS);
        assert_eq!(thd(&spectrum, 500.0, DEFAULT_HARMONICS), 0.0);
        assert_eq!(thd_plus_n(&spectrum, 500.0, DEFAULT_HARMONICS), 0.0);
        assert_eq!(thd(&Spectrum::compute(&[], FS), 500.0, DEFAULT_HARMONICS), 0.0);
    }

    #[test]
    fn test_harmonic_rows() {
        let spectrum = Spectrum::compute(&signal(&[(500.0, 1.0), (1000.0, 0.2), (1500.0, 0.2)]), FS);
        let rows = harmonic_rows(&spectrum, 500.0, DEFAULT_HARMONICS);
        assert_eq!(rows.len(), DEFAULT_HARMONICS);
        assert_eq!(rows[0].index, 1);
        assert_relative_eq!(rows[0].amplitude, 0.5, epsilon = 1e-9);
        assert_relative_eq!(rows[1].power_percent, 50.0, epsilon = 1e-6);
        assert_relative_eq!(rows[2].power_percent, 50.0, epsilon = 1e-6);
        let total: f64 = rows[1..].iter().map(|r| r.power_percent).sum();
        assert_relative_eq!(total, 100.0, epsilon = 1e-6);
    }

    #[test]
    fn test_sweep_shape() {
        let spectrum = Spectrum::compute(&signal(&[(500.0, 1.0)]), FS);
        let sweep = thd_sweep(&spectrum, DEFAULT_HARMONICS);
        assert_eq!(sweep.len(), SWEEP_BANDS);
        assert!(sweep.iter().all(|(_, t)| (0.0..=100.0).contains(t)));
    }
}
