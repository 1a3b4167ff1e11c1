//! Metrics computed from one tick of waveforms.
//!
//! - [`spectrum`] - one-sided FFT shared by the frequency-domain metrics
//! - [`distortion`] - THD, THD+N and the harmonic table
//! - [`snr`] - signal-to-noise ratio and noise floor
//! - [`emi`] - conducted and radiated emission estimate
//! - [`impedance`] - port reflection metrics
//! - [`power_factor`] - power factor and PFC current shaping
//! - [`stability`] - Bode, Nyquist, margins and root locus
//!
//! Every metric is finite and clamped to its documented range. An unpowered
//! receiver reports neutral values.

pub mod distortion;
pub mod emi;
pub mod impedance;
pub mod power_factor;
pub mod snr;
pub mod spectrum;
pub mod stability;

pub use distortion::HarmonicRow;
pub use emi::{EmiBand, EmiLevels};
pub use impedance::{PortMetrics, SmithPoint};
pub use spectrum::Spectrum;
pub use stability::{Margins, StabilityReport, TransferFunction};

use crate::circuit::CircuitConfiguration;
use crate::solver::{NoiseSource, WaveformBuffer};

/// Analysis settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisOptions {
    /// Highest harmonic in THD and the harmonic table
    pub harmonics: usize,
    /// Bode points used for the margins
    pub bode_points: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            harmonics: distortion::DEFAULT_HARMONICS,
            bode_points: stability::DEFAULT_BODE_POINTS,
        }
    }
}

/// Metrics of one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Peak-to-peak of the steady half of the regulated voltage (V)
    pub ripple_voltage: f64,
    /// Mean of the steady half of the regulated voltage (V)
    pub average_voltage: f64,
    /// Total harmonic distortion (%)
    pub thd: f64,
    /// THD plus noise (%)
    pub thd_plus_n: f64,
    /// Signal-to-noise ratio (dB)
    pub snr_db: f64,
    /// Noise floor (dB)
    pub noise_floor_db: f64,
    /// Conducted and radiated emissions
    pub emi: EmiLevels,
    /// Phase of the output at the signal frequency (degrees)
    pub phase_deg: f64,
    /// Mean power into the load over the steady half (W)
    pub power: f64,
    /// System junction temperature (°C)
    pub temperature: f64,
    /// Diode junction temperature (°C)
    pub diode_temperature: f64,
    /// Switch junction temperature (°C)
    pub switch_temperature: f64,
    /// Conversion efficiency in [0, 1]
    pub efficiency: f64,
    /// Line power factor in [0, 1]
    pub power_factor: f64,
    /// Switching regulator duty cycle
    pub duty_cycle: f64,
    /// Transformer core |B| / B_sat (%)
    pub core_saturation: f64,
    /// Receiver input port
    pub input_port: PortMetrics,
    /// Receiver output port
    pub output_port: PortMetrics,
    /// Smith chart points of the input and output ports
    pub smith: (SmithPoint, SmithPoint),
    /// Gain margin (dB)
    pub gain_margin_db: Option<f64>,
    /// Phase margin (degrees)
    pub phase_margin_deg: Option<f64>,
    /// Harmonic table, fundamental first
    pub harmonics: Vec<HarmonicRow>,
    /// THD against fundamental frequency
    pub thd_sweep: Vec<(f64, f64)>,
    /// SNR per frequency band
    pub snr_spectrum: Vec<(f64, f64)>,
    /// Emission estimate per band with its limit
    pub emi_spectrum: Vec<EmiBand>,
}

impl AnalysisResult {
    /// Neutral metrics of an unpowered receiver.
    pub fn powered_off(config: &CircuitConfiguration) -> Self {
        let (input_port, output_port) = impedance::port_metrics(config);
        Self {
            ripple_voltage: 0.0,
            average_voltage: 0.0,
            thd: 0.0,
            thd_plus_n: 0.0,
            snr_db: 0.0,
            noise_floor_db: -120.0,
            emi: EmiLevels::default(),
            phase_deg: 0.0,
            power: 0.0,
            temperature: config.thermal.ambient,
            diode_temperature: config.thermal.ambient,
            switch_temperature: config.thermal.ambient,
            efficiency: 1.0,
            power_factor: 1.0,
            duty_cycle: 0.0,
            core_saturation: 0.0,
            input_port,
            output_port,
            smith: impedance::smith_points(config),
            gain_margin_db: None,
            phase_margin_deg: None,
            harmonics: Vec::new(),
            thd_sweep: Vec::new(),
            snr_spectrum: Vec::new(),
            emi_spectrum: emi::emi_spectrum(config, &[]),
        }
    }
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Analyze a buffer with default options.
pub fn analyze(
    buffer: &WaveformBuffer,
    sampling_rate: f64,
    config: &CircuitConfiguration,
    noise: &mut NoiseSource,
) -> AnalysisResult {
    analyze_with(buffer, sampling_rate, config, noise, &AnalysisOptions::default())
}

/// Analyze a buffer.
///
/// `noise` supplies the independent realization used by the SNR figures.
pub fn analyze_with(
    buffer: &WaveformBuffer,
    sampling_rate: f64,
    config: &CircuitConfiguration,
    noise: &mut NoiseSource,
    options: &AnalysisOptions,
) -> AnalysisResult {
    if !buffer.powered || !config.power_on || buffer.is_empty() {
        return AnalysisResult::powered_off(config);
    }
    let _span = tracing::debug_span!("analyze", samples = buffer.len()).entered();

    let steady = &buffer.regulated[buffer.regulated.len() / 2..];
    let (ripple_voltage, average_voltage, power) = if steady.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        let max = steady.iter().copied().fold(f64::MIN, f64::max);
        let min = steady.iter().copied().fold(f64::MAX, f64::min);
        let n = steady.len() as f64;
        let r_load = config.load_resistance.max(1e-9);
        (
            max - min,
            steady.iter().sum::<f64>() / n,
            steady.iter().map(|v| v * v / r_load).sum::<f64>() / n,
        )
    };

    let f0 = config.frequency;
    let spectrum = Spectrum::compute(&buffer.noisy_output, sampling_rate);
    let clean = Spectrum::compute(&buffer.output, sampling_rate);
    let phase_deg = clean.nearest_bin(f0).map_or(0.0, |k| clean.phase_degrees(k));

    let drawn = snr::draw_noise(&buffer.output, config.noise_level, noise);
    let snr_reading = snr::snr(&buffer.output, &drawn);

    let (input_port, output_port) = impedance::port_metrics(config);
    let margins = stability::margins(&stability::bode(
        &TransferFunction::for_configuration(config),
        &spectrum::logspace(1.0, 1e5, options.bode_points),
    ));

    let result = AnalysisResult {
        ripple_voltage: finite_or_zero(ripple_voltage),
        average_voltage: finite_or_zero(average_voltage),
        thd: distortion::thd(&spectrum, f0, options.harmonics),
        thd_plus_n: distortion::thd_plus_n(&spectrum, f0, options.harmonics),
        snr_db: snr_reading.snr_db,
        noise_floor_db: snr_reading.noise_floor_db,
        emi: emi::emi_levels(config, &buffer.output),
        phase_deg,
        power: finite_or_zero(power),
        temperature: buffer.thermal.system_temperature,
        diode_temperature: buffer.thermal.diode_temperature,
        switch_temperature: buffer.thermal.switch_temperature,
        efficiency: buffer.thermal.efficiency,
        power_factor: power_factor::compute_power_factor(&buffer.source, &buffer.input_current),
        duty_cycle: buffer.duty_cycle,
        core_saturation: buffer.core_saturation,
        input_port,
        output_port,
        smith: impedance::smith_points(config),
        gain_margin_db: margins.gain_margin_db,
        phase_margin_deg: margins.phase_margin_deg,
        harmonics: distortion::harmonic_rows(&spectrum, f0, options.harmonics),
        thd_sweep: distortion::thd_sweep(&spectrum, options.harmonics),
        snr_spectrum: snr::snr_spectrum(&buffer.output, &drawn, sampling_rate),
        emi_spectrum: emi::emi_spectrum(config, &buffer.output),
    };
    tracing::debug!(
        thd = result.thd,
        snr = result.snr_db,
        pf = result.power_factor,
        "analysis complete"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{FilterKind, Modulation, PfcKind, RectifierKind, RegulatorKind};
    use crate::solver::Simulator;
    use approx::assert_relative_eq;

    fn run(sim: &mut Simulator) -> AnalysisResult {
        let buffer = sim.tick_window();
        sim.analyze(&buffer)
    }

    fn assert_in_range(result: &AnalysisResult) {
        assert!((0.0..=100.0).contains(&result.thd));
        assert!((0.0..=100.0).contains(&result.thd_plus_n));
        assert!((0.0..=100.0).contains(&result.snr_db));
        assert!((-120.0..=0.0).contains(&result.noise_floor_db));
        assert!((0.0..=120.0).contains(&result.emi.conducted_dbuv));
        assert!((0.0..=120.0).contains(&result.emi.radiated_dbuv));
        assert!((0.0..=1.0).contains(&result.power_factor));
        assert!((0.0..=1.0).contains(&result.efficiency));
        assert!(result.input_port.vswr >= 1.0 && result.output_port.vswr >= 1.0);
        assert!(result.ripple_voltage.is_finite() && result.power.is_finite());
    }

    #[test]
    fn test_powered_off_is_neutral() {
        let mut sim = Simulator::new();
        let result = run(&mut sim);
        assert_eq!(result.thd, 0.0);
        assert_eq!(result.noise_floor_db, -120.0);
        assert_eq!(result.power_factor, 1.0);
        assert_eq!(result.efficiency, 1.0);
        assert_eq!(result.temperature, 25.0);
        assert_eq!(result.input_port.vswr, 1.0);
        assert_eq!(result.emi, EmiLevels::default());
        assert!(result.harmonics.is_empty());
    }

    #[test]
    fn test_metrics_clamped_across_topologies() {
        let mut sim = Simulator::new();
        sim.set_parameter("power", "on").unwrap();
        for regulator in ["none", "linear", "switching"] {
            for filter in ["capacitive", "inductive", "active"] {
                for pfc in ["none", "active", "passive"] {
                    sim.set_parameter("regulator", regulator).unwrap();
                    sim.set_parameter("filter", filter).unwrap();
                    sim.set_parameter("pfc", pfc).unwrap();
                    let result = run(&mut sim);
                    assert_in_range(&result);
                }
            }
        }
    }

    #[test]
    fn test_bridge_capacitive_average_voltage() {
        let config = CircuitConfiguration::default()
            .with_power(true)
            .with_frequency(1000.0)
            .with_rectifier(RectifierKind::Bridge)
            .with_filter(FilterKind::Capacitive { capacitance: 100e-6 })
            .with_regulator(RegulatorKind::None)
            .with_modulation(Modulation::None);
        let mut sim = Simulator::with_configuration(config, Default::default()).unwrap();
        let buffer = sim.tick_window();
        let result = sim.analyze(&buffer);
        let peak = buffer.rectified.iter().fold(0.0f64, |a, v| a.max(*v));
        assert!(result.average_voltage > 0.3 * peak && result.average_voltage < peak);
        assert!(result.ripple_voltage > 0.0 && result.ripple_voltage < peak);
        assert!(result.power > 0.0);
    }

    #[test]
    fn test_emi_only_for_switching() {
        let mut sim = Simulator::new();
        sim.set_parameter("power", "on").unwrap();
        sim.set_parameter("regulator", "linear").unwrap();
        assert_eq!(run(&mut sim).emi, EmiLevels::default());

        sim.set_parameter("regulator", "switching").unwrap();
        let open = run(&mut sim).emi;
        assert!(open.conducted_dbuv > 0.0);
        sim.set_parameter("emi_filter", "on").unwrap();
        let filtered = run(&mut sim).emi;
        assert!(filtered.conducted_dbuv < open.conducted_dbuv);
    }

    #[test]
    fn test_pfc_raises_power_factor() {
        let mut plain = Simulator::new();
        plain.set_parameter("power", "on").unwrap();
        let before = run(&mut plain).power_factor;

        let mut corrected = Simulator::new();
        corrected.set_parameter("power", "on").unwrap();
        corrected.set_parameter("pfc", PfcKind::ActiveBoost.as_str()).unwrap();
        let after = run(&mut corrected).power_factor;
        assert!(after > before, "{} -> {}", before, after);
    }

    #[test]
    fn test_pfc_disabled_power_factor_matches_buffers() {
        for rectifier in ["half_wave", "full_wave", "bridge"] {
            let mut sim = Simulator::new();
            sim.set_parameter("power", "on").unwrap();
            sim.set_parameter("pfc", "none").unwrap();
            sim.set_parameter("rectifier", rectifier).unwrap();
            let buffer = sim.tick_window();
            let result = sim.analyze(&buffer);
            let expected = power_factor::compute_power_factor(&buffer.source, &buffer.input_current);
            assert_relative_eq!(result.power_factor, expected);
        }
    }

    #[test]
    fn test_pfc_efficiency_penalty() {
        assert_eq!(PfcKind::None.efficiency_factor(), 1.0);
        assert_eq!(PfcKind::ActiveBoost.efficiency_factor(), 0.98);
        assert_eq!(PfcKind::Passive.efficiency_factor(), 0.995);

        let efficiency = |pfc: PfcKind| {
            let mut sim = Simulator::new();
            sim.set_parameter("power", "on").unwrap();
            sim.set_parameter("regulator", "linear").unwrap();
            sim.set_parameter("pfc", pfc.as_str()).unwrap();
            run(&mut sim).efficiency
        };
        let plain = efficiency(PfcKind::None);
        let active = efficiency(PfcKind::ActiveBoost);
        let passive = efficiency(PfcKind::Passive);
        assert!(plain > 0.0 && active <= 0.98);
        assert_relative_eq!(active, plain * 0.98, max_relative = 1e-9);
        assert_relative_eq!(passive, plain * 0.995, max_relative = 1e-9);
    }

    #[test]
    fn test_harmonic_table_and_sweeps() {
        let mut sim = Simulator::new();
        sim.set_parameter("power", "on").unwrap();
        let result = run(&mut sim);
        assert_eq!(result.harmonics.len(), distortion::DEFAULT_HARMONICS);
        assert_eq!(result.thd_sweep.len(), distortion::SWEEP_BANDS);
        assert_eq!(result.snr_spectrum.len(), snr::SPECTRUM_BANDS);
        assert_eq!(result.emi_spectrum.len(), emi::SPECTRUM_BANDS);
        assert!(result.phase_deg.abs() <= 180.0);
    }
}
