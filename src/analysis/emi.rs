//! Electromagnetic interference estimate for the switching regulator.
//!
//! Only a switching regulator radiates. Its emissions are modeled as two
//! tones whose amplitude follows the output peak: a conducted tone at the
//! switching frequency and a weaker radiated tone at its tenth harmonic.
//! Levels are RMS in dBuV, reduced by 20 dB when the EMI filter is fitted,
//! and clamped to [0, 120].

use std::f64::consts::SQRT_2;

use crate::circuit::{CircuitConfiguration, RegulatorKind};

use super::spectrum::logspace;

/// Conducted tone amplitude relative to the output peak.
pub const CONDUCTED_FRACTION: f64 = 0.01;

/// Radiated tone amplitude relative to the output peak.
pub const RADIATED_FRACTION: f64 = 0.005;

/// Harmonic of the switching frequency that carries radiated emissions.
pub const RADIATED_HARMONIC: f64 = 10.0;

/// Attenuation of the EMI filter (dB).
pub const FILTER_ATTENUATION_DB: f64 = 20.0;

/// Upper clamp of reported levels (dBuV).
pub const MAX_LEVEL_DBUV: f64 = 120.0;

/// Number of bands in the EMI spectrum.
pub const SPECTRUM_BANDS: usize = 50;

/// Boundary between the conducted and radiated measurement ranges (Hz).
pub const CONDUCTED_LIMIT_HZ: f64 = 30e6;

/// Conducted and radiated emission levels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EmiLevels {
    /// Conducted emissions (dBuV)
    pub conducted_dbuv: f64,
    /// Radiated emissions (dBuV)
    pub radiated_dbuv: f64,
}

/// One band of the EMI spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmiBand {
    /// Band center (Hz)
    pub frequency: f64,
    /// Estimated level (dBuV)
    pub level_dbuv: f64,
    /// CISPR 22 class B limit (dBuV)
    pub limit_dbuv: f64,
}

impl EmiBand {
    /// Check if the estimated level exceeds the limit.
    pub fn exceeds_limit(&self) -> bool {
        self.level_dbuv > self.limit_dbuv
    }
}

/// CISPR 22 class B limit at a frequency (dBuV).
pub fn cispr22_class_b(frequency: f64) -> f64 {
    if frequency <= CONDUCTED_LIMIT_HZ {
        if frequency < 5e6 {
            60.0
        } else {
            56.0
        }
    } else if frequency < 230e6 {
        40.0
    } else {
        47.0
    }
}

/// dBuV level of a sine of the given peak amplitude, after the optional
/// filter, clamped to [0, 120].
fn tone_level(amplitude: f64, filtered: bool) -> f64 {
    let rms = amplitude.abs() / SQRT_2;
    if rms <= 0.0 {
        return 0.0;
    }
    let attenuation = if filtered { FILTER_ATTENUATION_DB } else { 0.0 };
    (20.0 * (rms * 1e6).log10() - attenuation).clamp(0.0, MAX_LEVEL_DBUV)
}

fn output_peak(output: &[f64]) -> f64 {
    output.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
}

/// Emission levels for one output buffer.
pub fn emi_levels(config: &CircuitConfiguration, output: &[f64]) -> EmiLevels {
    if !config.power_on || !matches!(config.regulator, RegulatorKind::Switching { .. }) {
        return EmiLevels::default();
    }
    let peak = output_peak(output);
    EmiLevels {
        conducted_dbuv: tone_level(CONDUCTED_FRACTION * peak, config.emi_filter),
        radiated_dbuv: tone_level(RADIATED_FRACTION * peak, config.emi_filter),
    }
}

/// Emission estimate over 50 log bands from 150 kHz to 1 GHz with the
/// class B limit of each band.
pub fn emi_spectrum(config: &CircuitConfiguration, output: &[f64]) -> Vec<EmiBand> {
    let active = config.power_on && matches!(config.regulator, RegulatorKind::Switching { .. });
    let peak = if active { output_peak(output) } else { 0.0 };

    logspace(150e3, 1e9, SPECTRUM_BANDS)
        .into_iter()
        .map(|frequency| {
            let fraction = if frequency <= CONDUCTED_LIMIT_HZ {
                CONDUCTED_FRACTION
            } else {
                RADIATED_FRACTION
            };
            EmiBand {
                frequency,
                level_dbuv: tone_level(fraction * peak, config.emi_filter),
                limit_dbuv: cispr22_class_b(frequency),
            }
        })
        .collect()
}
