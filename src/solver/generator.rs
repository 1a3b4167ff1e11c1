//! Waveform generator: one tick of the receiver signal path.

use std::f64::consts::PI;

use crate::analysis::power_factor::apply_pfc;
use crate::circuit::CircuitConfiguration;
use crate::components::thermal::efficiency;
use crate::components::{CoreSample, ThermalReading};

use super::noise::NoiseSource;
use super::stages::{self, EPSILON};
use super::state::IntegratorState;

/// Sample interval used when the time vector has fewer than two points.
pub const DEFAULT_DT: f64 = 1e-4;

/// Parallel sample buffers produced by one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformBuffer {
    /// Sample times (s)
    pub time: Vec<f64>,
    /// Primary-side source voltage
    pub source: Vec<f64>,
    /// Transformer secondary voltage
    pub transformed: Vec<f64>,
    /// Rectifier output
    pub rectified: Vec<f64>,
    /// Smoothing filter output
    pub filtered: Vec<f64>,
    /// Regulator output
    pub regulated: Vec<f64>,
    /// Modulated output after the coil stage
    pub output: Vec<f64>,
    /// Output with injected noise
    pub noisy_output: Vec<f64>,
    /// Line current after power-factor correction
    pub input_current: Vec<f64>,
    /// Switching regulator duty cycle (1 when not switching)
    pub duty_cycle: f64,
    /// Junction temperatures and efficiency at the end of the tick
    pub thermal: ThermalReading,
    /// Last operating point of the transformer core
    pub core: CoreSample,
    /// |B| / B_sat of the last core sample, in percent
    pub core_saturation: f64,
    /// Whether the receiver was powered during this tick
    pub powered: bool,
}

impl WaveformBuffer {
    /// All-zero buffers for an unpowered receiver.
    pub fn unpowered(time: &[f64], ambient: f64) -> Self {
        let zeros = vec![0.0; time.len()];
        Self {
            time: time.to_vec(),
            source: zeros.clone(),
            transformed: zeros.clone(),
            rectified: zeros.clone(),
            filtered: zeros.clone(),
            regulated: zeros.clone(),
            output: zeros.clone(),
            noisy_output: zeros.clone(),
            input_current: zeros,
            duty_cycle: 0.0,
            thermal: ThermalReading::idle(ambient),
            core: CoreSample::default(),
            core_saturation: 0.0,
            powered: false,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Check if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Sample interval (s).
    pub fn dt(&self) -> f64 {
        sample_interval(&self.time)
    }

    /// Sampling rate (Hz).
    pub fn sampling_rate(&self) -> f64 {
        1.0 / self.dt()
    }

    /// Iterate over every sample array.
    pub fn arrays(&self) -> [&[f64]; 9] {
        [
            &self.time,
            &self.source,
            &self.transformed,
            &self.rectified,
            &self.filtered,
            &self.regulated,
            &self.output,
            &self.noisy_output,
            &self.input_current,
        ]
    }
}

/// Sample interval of a time vector, falling back to [`DEFAULT_DT`].
pub fn sample_interval(time: &[f64]) -> f64 {
    match time {
        [t0, t1, ..] if (t1 - t0).is_finite() && t1 > t0 => t1 - t0,
        _ => DEFAULT_DT,
    }
}

/// Population standard deviation.
pub(crate) fn std_dev(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let n = x.len() as f64;
    let mean = x.iter().sum::<f64>() / n;
    (x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

fn peak(x: &[f64]) -> f64 {
    x.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
}

fn sanitize(x: &mut [f64]) {
    for v in x {
        if !v.is_finite() {
            *v = 0.0;
        }
    }
}

/// Run the full signal path for one time vector.
///
/// Handles the power state machine: an unpowered receiver returns zeros
/// and rests its state, and the first powered tick after that starts from
/// rest.
pub fn generate(
    config: &CircuitConfiguration,
    state: &mut IntegratorState,
    time: &[f64],
    noise: &mut NoiseSource,
) -> WaveformBuffer {
    if !config.power_on {
        if state.powered {
            tracing::debug!("power off, integrator state reset");
        }
        state.reset(config);
        state.powered = false;
        return WaveformBuffer::unpowered(time, config.thermal.ambient);
    }
    if !state.powered {
        tracing::debug!("power on from rest");
        state.reset(config);
        state.powered = true;
    }

    let _span = tracing::debug_span!("tick", samples = time.len()).entered();
    let dt = sample_interval(time);
    let derating = state.thermal.derating_factor(&config.thermal);

    let source = stages::source(config, time);
    let transformed = stages::transformer(config, &source, dt);
    let rectified = stages::rectify(config, &transformed);
    let filtered = stages::filter(config, state, &rectified, dt);
    let regulated = stages::regulate(config, &filtered, time, dt, derating);
    let modulated = stages::modulate(config, &regulated.output, time, dt);

    let line_current = stages::input_current(config, &source, time);
    let input_current = apply_pfc(
        config.pfc,
        &source,
        &line_current,
        time,
        stages::source_frequency(config),
        noise,
    );
    let shaped = if config.pfc.is_enabled() {
        let reference = peak(&line_current).max(EPSILON);
        modulated
            .iter()
            .zip(&input_current)
            .map(|(v, i)| v * i.abs() / reference)
            .collect()
    } else {
        modulated
    };
    let mut output = stages::coil(config, state, &shaped, dt);
    sanitize(&mut output);

    let sigma = config.noise_level * std_dev(&output);
    let noisy_output = output
        .iter()
        .zip(noise.gaussian(output.len(), sigma))
        .map(|(v, n)| v + n)
        .collect();

    let thermal = step_thermal(config, state, &rectified, &regulated, dt);

    if config.core_material != state.core.material() {
        state.core.set_material(config.core_material);
    }
    for &t in time {
        state.core.drive(config.core_field * (2.0 * PI * config.frequency * t).sin());
    }

    let mut buffer = WaveformBuffer {
        time: time.to_vec(),
        source,
        transformed,
        rectified,
        filtered,
        regulated: regulated.output,
        output,
        noisy_output,
        input_current,
        duty_cycle: regulated.duty_cycle,
        thermal,
        core: state.core.last(),
        core_saturation: state.core.saturation_percent(),
        powered: true,
    };
    sanitize(&mut buffer.source);
    sanitize(&mut buffer.transformed);
    sanitize(&mut buffer.rectified);
    sanitize(&mut buffer.filtered);
    sanitize(&mut buffer.regulated);
    sanitize(&mut buffer.noisy_output);
    sanitize(&mut buffer.input_current);

    tracing::debug!(
        temperature = buffer.thermal.system_temperature,
        efficiency = buffer.thermal.efficiency,
        duty = buffer.duty_cycle,
        "tick complete"
    );
    buffer
}

/// Drive the junction network with this tick's device dissipation.
fn step_thermal(
    config: &CircuitConfiguration,
    state: &mut IntegratorState,
    rectified: &[f64],
    regulated: &stages::Regulated,
    dt: f64,
) -> ThermalReading {
    let r_load = config.load_resistance.max(EPSILON);
    let diodes = config.rectifier.diodes_in_path() as f64;
    let diode = &config.devices.diode;

    let mut diode_energy = 0.0;
    let mut switch_energy = 0.0;
    let mut load_energy = 0.0;
    let mut n = 0usize;
    let samples = rectified
        .iter()
        .zip(&regulated.output)
        .zip(&regulated.dissipation);
    for ((&v_rect, &v_out), &p_switch) in samples {
        if !(v_rect.is_finite() && v_out.is_finite() && p_switch.is_finite()) {
            continue;
        }
        let i_load = v_out.max(0.0) / r_load;
        let p_diode = if v_rect > 0.0 {
            diodes * diode.dissipation(i_load)
        } else {
            0.0
        };
        state.thermal.step(&config.thermal, p_diode, p_switch, dt);

        diode_energy += p_diode;
        switch_energy += p_switch;
        load_energy += v_out * v_out / r_load;
        n += 1;
    }

    let count = n.max(1) as f64;
    let diode_power = diode_energy / count;
    let switch_power = switch_energy / count;
    let load_power = load_energy / count;

    ThermalReading {
        diode_temperature: state.thermal.diode,
        switch_temperature: state.thermal.switch,
        system_temperature: state.thermal.system_temperature(),
        diode_power,
        switch_power,
        load_power,
        efficiency: efficiency(load_power, diode_power + switch_power)
            * config.pfc.efficiency_factor(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{
        FilterKind, Modulation, PfcKind, RectifierKind, RegulatorKind, SignalMode,
    };

    fn time(n: usize, duration: f64) -> Vec<f64> {
        let dt = duration / n as f64;
        (0..n).map(|i| i as f64 * dt).collect()
    }

    fn run(config: &CircuitConfiguration, ticks: usize) -> WaveformBuffer {
        let mut state = IntegratorState::at_rest(config);
        let mut noise = NoiseSource::default();
        let t = time(1000, 0.1);
        let mut last = generate(config, &mut state, &t, &mut noise);
        for _ in 1..ticks {
            last = generate(config, &mut state, &t, &mut noise);
        }
        last
    }

    #[test]
    fn test_unpowered_is_all_zero() {
        let config = CircuitConfiguration::default();
        let buffer = run(&config, 1);
        assert!(!buffer.powered);
        for array in &buffer.arrays()[1..] {
            assert!(array.iter().all(|&v| v == 0.0));
        }
        assert_eq!(buffer.thermal.system_temperature, 25.0);
        assert_eq!(buffer.thermal.efficiency, 1.0);
    }

    #[test]
    fn test_lengths_match_time_vector() {
        let config = CircuitConfiguration::default().with_power(true);
        for n in [0, 1, 2, 17, 1000] {
            let mut state = IntegratorState::at_rest(&config);
            let mut noise = NoiseSource::default();
            let t = time(n.max(1), 0.1)[..n].to_vec();
            let buffer = generate(&config, &mut state, &t, &mut noise);
            for array in buffer.arrays() {
                assert_eq!(array.len(), n);
            }
        }
    }

    fn assert_finite(config: &CircuitConfiguration) {
        let buffer = run(config, 2);
        for array in buffer.arrays() {
            assert!(array.iter().all(|v| v.is_finite()), "{:?}", config);
        }
        assert!(buffer.rectified.iter().all(|&v| v >= 0.0));
        assert!((0.0..=1.0).contains(&buffer.thermal.efficiency));
        assert!(buffer.thermal.system_temperature.is_finite());
    }

    #[test]
    fn test_all_topologies_finite() {
        let filters = [
            FilterKind::Capacitive { capacitance: 100e-6 },
            FilterKind::Inductive { inductance: 10e-3 },
            FilterKind::Active { cutoff: 100.0 },
        ];
        let regulators = [
            RegulatorKind::None,
            RegulatorKind::Linear { vref: 5.0 },
            RegulatorKind::Switching {
                frequency: 10_000.0,
                vref: 5.0,
            },
        ];
        for frequency in [100.0, 1000.0, 10_000.0] {
            for rectifier in [RectifierKind::HalfWave, RectifierKind::FullWave, RectifierKind::Bridge] {
                for filter in filters {
                    for regulator in regulators {
                        for pfc in [PfcKind::None, PfcKind::ActiveBoost, PfcKind::Passive] {
                            assert_finite(
                                &CircuitConfiguration::default()
                                    .with_power(true)
                                    .with_frequency(frequency)
                                    .with_rectifier(rectifier)
                                    .with_filter(filter)
                                    .with_regulator(regulator)
                                    .with_pfc(pfc),
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_signal_options_finite() {
        let regulators = [
            RegulatorKind::Linear { vref: 5.0 },
            RegulatorKind::Switching {
                frequency: 10_000.0,
                vref: 5.0,
            },
        ];
        for modulation in [Modulation::None, Modulation::Am, Modulation::Fm] {
            for mode in [SignalMode::Analog, SignalMode::Digital, SignalMode::Mixed] {
                for pfc in [PfcKind::None, PfcKind::ActiveBoost, PfcKind::Passive] {
                    for gain_db in [-20.0, 0.0, 20.0] {
                        for noise_level in [0.0, 10.0] {
                            for regulator in regulators {
                                let mut config = CircuitConfiguration::default()
                                    .with_power(true)
                                    .with_modulation(modulation)
                                    .with_pfc(pfc)
                                    .with_regulator(regulator)
                                    .with_noise_level(noise_level);
                                config.signal_mode = mode;
                                config.gain_db = gain_db;
                                config.modulation_index = 1.0;
                                assert_finite(&config);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_thermal_skips_non_finite_samples() {
        let config = CircuitConfiguration::default().with_power(true);
        let mut state = IntegratorState::at_rest(&config);
        let rectified = [6.0, 6.0, 6.0, f64::NAN];
        let regulated = stages::Regulated {
            output: vec![5.0, f64::NAN, 5.0, 5.0],
            dissipation: vec![0.5, 0.5, f64::INFINITY, 0.5],
            duty_cycle: 1.0,
        };
        let reading = step_thermal(&config, &mut state, &rectified, &regulated, 1e-4);
        assert!(state.thermal.system_temperature().is_finite());
        assert!(reading.diode_temperature.is_finite() && reading.switch_temperature.is_finite());
        assert_eq!(reading.switch_power, 0.5);
        assert_eq!(reading.load_power, 0.25);
        assert!((0.0..=1.0).contains(&reading.efficiency));
    }

    #[test]
    fn test_state_carries_across_ticks() {
        let config = CircuitConfiguration::default()
            .with_power(true)
            .with_filter(FilterKind::Inductive { inductance: 5.0 });
        let mut state = IntegratorState::at_rest(&config);
        let mut noise = NoiseSource::default();
        let t = time(1000, 0.1);
        let first = generate(&config, &mut state, &t, &mut noise);
        let second = generate(&config, &mut state, &t, &mut noise);
        assert!(second.filtered[0] > first.filtered[0]);
    }

    #[test]
    fn test_power_cycle_resets_state() {
        let mut config = CircuitConfiguration::default().with_power(true);
        let mut state = IntegratorState::at_rest(&config);
        let mut noise = NoiseSource::default();
        let t = time(1000, 0.1);
        generate(&config, &mut state, &t, &mut noise);
        assert!(state.capacitor_voltage > 0.0);
        assert!(state.thermal.system_temperature() > 25.0);

        config.power_on = false;
        let off = generate(&config, &mut state, &t, &mut noise);
        assert_eq!(off.thermal.system_temperature, 25.0);
        assert_eq!(state.capacitor_voltage, 0.0);
        assert_eq!(state.thermal.system_temperature(), 25.0);
    }

    #[test]
    fn test_bridge_capacitive_scenario() {
        let config = CircuitConfiguration::default()
            .with_power(true)
            .with_rectifier(RectifierKind::Bridge)
            .with_filter(FilterKind::Capacitive { capacitance: 100e-6 })
            .with_regulator(RegulatorKind::None)
            .with_modulation(Modulation::None);
        let buffer = run(&config, 1);
        let peak_rect = peak(&buffer.rectified);
        let second_half = &buffer.filtered[500..];
        let mean = second_half.iter().sum::<f64>() / second_half.len() as f64;
        assert!(buffer.rectified.iter().all(|&v| v >= 0.0));
        assert!(mean > 0.3 * peak_rect && mean < peak_rect, "mean {} peak {}", mean, peak_rect);
        assert!(peak(&buffer.filtered) <= peak_rect);
    }

    #[test]
    fn test_pfc_disabled_passes_current() {
        let config = CircuitConfiguration::default().with_power(true);
        let buffer = run(&config, 1);
        let expected = stages::input_current(&config, &buffer.source, &buffer.time);
        assert_eq!(buffer.input_current, expected);
    }

    #[test]
    fn test_noise_level_zero_is_clean() {
        let config = CircuitConfiguration::default()
            .with_power(true)
            .with_noise_level(0.0);
        let buffer = run(&config, 1);
        assert_eq!(buffer.noisy_output, buffer.output);
    }

    #[test]
    fn test_core_is_driven() {
        let config = CircuitConfiguration::default().with_power(true);
        let buffer = run(&config, 1);
        assert!(buffer.core_saturation > 0.0 && buffer.core_saturation <= 100.0);
    }
}
