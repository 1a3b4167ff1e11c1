//! Power factor and power-factor correction.
//!
//! `PF = |mean(v * i)| / (rms(v) * rms(i))`, capped at 1. An empty buffer
//! or zero apparent power reads as unity.

use std::f64::consts::PI;

use crate::circuit::PfcKind;
use crate::solver::generator::std_dev;
use crate::solver::NoiseSource;

/// Gaussian distortion left by the active boost stage, relative to std(i).
pub const ACTIVE_DISTORTION: f64 = 0.05;

/// Phase lead restored by the passive corrector (rad).
pub const PASSIVE_PHASE_LEAD: f64 = PI / 12.0;

/// Second-harmonic content of the passive corrector output.
pub const PASSIVE_SECOND_HARMONIC: f64 = 0.1;

fn rms(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    (x.iter().map(|v| v * v).sum::<f64>() / x.len() as f64).sqrt()
}

fn peak(x: &[f64]) -> f64 {
    x.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
}

/// Power factor of a voltage/current pair.
pub fn compute_power_factor(voltage: &[f64], current: &[f64]) -> f64 {
    let n = voltage.len().min(current.len());
    if n == 0 {
        return 1.0;
    }
    let (v, i) = (&voltage[..n], &current[..n]);
    let apparent = rms(v) * rms(i);
    if apparent <= 0.0 || !apparent.is_finite() {
        return 1.0;
    }
    let real = v.iter().zip(i).map(|(a, b)| a * b).sum::<f64>() / n as f64;
    (real.abs() / apparent).min(1.0)
}

/// Shape the line current according to the correction stage.
///
/// Active boost makes the current follow the voltage at the original peak
/// with a little Gaussian distortion. The passive corrector pulls the
/// current back toward the voltage by a fixed phase lead and adds some
/// second harmonic.
pub fn apply_pfc(
    kind: PfcKind,
    voltage: &[f64],
    current: &[f64],
    time: &[f64],
    frequency: f64,
    noise: &mut NoiseSource,
) -> Vec<f64> {
    let i_peak = peak(current);
    match kind {
        PfcKind::None => current.to_vec(),
        PfcKind::ActiveBoost => {
            let v_peak = peak(voltage);
            if v_peak <= 0.0 {
                return current.to_vec();
            }
            let sigma = ACTIVE_DISTORTION * std_dev(current);
            voltage
                .iter()
                .zip(noise.gaussian(voltage.len(), sigma))
                .map(|(v, n)| v * i_peak / v_peak + n)
                .collect()
        }
        PfcKind::Passive => time
            .iter()
            .map(|&t| {
                let phase = 2.0 * PI * frequency * t;
                (phase - PASSIVE_PHASE_LEAD).sin() * i_peak
                    + PASSIVE_SECOND_HARMONIC * (2.0 * phase).sin() * i_peak
            })
            .collect(),
    }
}
