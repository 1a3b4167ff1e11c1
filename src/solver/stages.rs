//! Signal-path stages.
//!
//! Each stage maps one buffer to the next. Stages that integrate take the
//! [`IntegratorState`] and leave it at the value of the last sample.

use std::f64::consts::{PI, SQRT_2};

use crate::circuit::{
    CircuitConfiguration, FilterKind, Modulation, RectifierKind, RegulatorKind, SignalMode,
    SourceKind,
};
use crate::components::MosfetRegion;

use super::state::IntegratorState;

/// Voltage ceiling applied after the transformer.
pub const MAX_VOLTAGE: f64 = 1000.0;

/// Frequency of the AM/FM modulating tone (Hz).
pub const MODULATING_TONE: f64 = 100.0;

/// Guard added to divisors.
pub const EPSILON: f64 = 1e-9;

/// Euler coefficient for a first-order lag, limited to a full step.
fn lag_coefficient(dt: f64, tau: f64) -> f64 {
    (dt / tau.max(EPSILON)).min(1.0)
}

/// Primary-side source voltage.
pub fn source(config: &CircuitConfiguration, time: &[f64]) -> Vec<f64> {
    let amplitude = config.input_voltage * SQRT_2;
    let f = source_frequency(config);
    time.iter()
        .map(|&t| amplitude * (2.0 * PI * f * t).sin())
        .collect()
}

/// Frequency of the source waveform.
pub fn source_frequency(config: &CircuitConfiguration) -> f64 {
    match config.source {
        SourceKind::Mains => config.line_frequency,
        SourceKind::TestTone => config.frequency,
    }
}

/// Transformer: turns ratio, leakage-inductance drop, voltage ceiling.
pub fn transformer(config: &CircuitConfiguration, v_ac: &[f64], dt: f64) -> Vec<f64> {
    let mut out: Vec<f64> = v_ac.iter().map(|v| v * config.turns_ratio).collect();

    if config.coil_inductance > 0.0 && out.len() > 1 {
        let mut derivative: Vec<f64> = out.windows(2).map(|w| (w[1] - w[0]) / dt).collect();
        let last = derivative[derivative.len() - 1];
        derivative.push(last);
        for (v, dv) in out.iter_mut().zip(&derivative) {
            *v -= config.coil_inductance * dv;
        }
    }

    for v in &mut out {
        *v = v.clamp(-MAX_VOLTAGE, MAX_VOLTAGE);
    }
    out
}

/// Rectifier. Output is never negative.
pub fn rectify(config: &CircuitConfiguration, v: &[f64]) -> Vec<f64> {
    let diode = &config.devices.diode;
    let r_load = config.load_resistance.max(EPSILON);

    v.iter()
        .map(|&v| {
            let out = match config.rectifier {
                RectifierKind::HalfWave => {
                    if diode.is_forward(v) {
                        v
                    } else {
                        0.0
                    }
                }
                RectifierKind::FullWave => v.abs(),
                RectifierKind::Bridge => {
                    let v = v.abs();
                    v - 2.0 * diode.voltage_drop(v / r_load)
                }
            };
            out.max(0.0)
        })
        .collect()
}

/// Smoothing filter.
pub fn filter(
    config: &CircuitConfiguration,
    state: &mut IntegratorState,
    v: &[f64],
    dt: f64,
) -> Vec<f64> {
    let r_load = config.load_resistance.max(EPSILON);

    match config.filter {
        FilterKind::Capacitive { capacitance } => {
            let c = capacitance.max(EPSILON);
            let k_charge = lag_coefficient(dt, config.charge_resistance * c);
            let k_discharge = lag_coefficient(dt, r_load * c);
            v.iter()
                .map(|&vin| {
                    let vc = state.capacitor_voltage;
                    // Diodes conduct only while the input is above the reservoir
                    let next = if vin > vc {
                        vc + k_charge * (vin - vc)
                    } else {
                        vc - k_discharge * vc
                    };
                    state.capacitor_voltage = next.max(0.0);
                    state.capacitor_voltage
                })
                .collect()
        }
        FilterKind::Inductive { inductance } => {
            let tau = inductance / (r_load + config.parasitic_resistance);
            let k = lag_coefficient(dt, tau);
            v.iter()
                .map(|&vin| {
                    state.filter_output += k * (vin - state.filter_output);
                    state.filter_output
                })
                .collect()
        }
        FilterKind::Active { cutoff } => {
            let tau = 1.0 / (2.0 * PI * cutoff.max(EPSILON));
            let k = lag_coefficient(dt, tau);
            let opamp = &config.devices.opamp;
            v.iter()
                .map(|&vin| {
                    let y = state.filter_output;
                    state.filter_output = opamp.saturate(y + k * (opamp.follower(vin) - y));
                    state.filter_output
                })
                .collect()
        }
    }
}

/// Regulator output with the power dissipated in its pass element or switch.
#[derive(Debug, Clone, PartialEq)]
pub struct Regulated {
    /// Regulated voltage
    pub output: Vec<f64>,
    /// Per-sample dissipation in the regulator semiconductor (W)
    pub dissipation: Vec<f64>,
    /// Duty cycle of the switching regulator, 1 otherwise
    pub duty_cycle: f64,
}

/// Fraction of `[p0, p1)` (in switching periods) during which a 50 % square
/// wave is high. Anti-aliases the gate when the sample interval is not much
/// shorter than the switching period.
fn gate_fraction(p0: f64, p1: f64) -> f64 {
    let high_time = |p: f64| 0.5 * p.floor() + p.fract().min(0.5);
    let span = p1 - p0;
    if span <= 0.0 {
        let phase = p0.fract();
        return if phase > 0.0 && phase < 0.5 { 1.0 } else { 0.0 };
    }
    ((high_time(p1) - high_time(p0)) / span).clamp(0.0, 1.0)
}

/// Voltage regulator.
///
/// `derating` scales the linear reference for junction temperature.
pub fn regulate(
    config: &CircuitConfiguration,
    filtered: &[f64],
    time: &[f64],
    dt: f64,
    derating: f64,
) -> Regulated {
    let r_load = config.load_resistance.max(EPSILON);
    let n = filtered.len();

    match config.regulator {
        RegulatorKind::None => Regulated {
            output: filtered.to_vec(),
            dissipation: vec![0.0; n],
            duty_cycle: 1.0,
        },
        RegulatorKind::Linear { vref } => {
            let target = vref * derating;
            let pass = &config.devices.pass_transistor;
            let dropout = pass.vbe_for_current(target / r_load).max(0.0);
            let output: Vec<f64> = filtered
                .iter()
                .map(|&v| (v - dropout).min(target).clamp(0.0, target.max(0.0)))
                .collect();
            let dissipation = filtered
                .iter()
                .zip(&output)
                .map(|(&vin, &vout)| (vin - vout).max(0.0) * vout / r_load)
                .collect();
            Regulated {
                output,
                dissipation,
                duty_cycle: 1.0,
            }
        }
        RegulatorKind::Switching { frequency, vref } => {
            let mean = if n > 0 {
                filtered.iter().sum::<f64>() / n as f64
            } else {
                0.0
            };
            let duty = (vref / (mean + EPSILON)).clamp(0.0, 1.0);
            let switch = &config.devices.mosfet;

            let mut output = Vec::with_capacity(n);
            let mut dissipation = Vec::with_capacity(n);
            for (&v, &t) in filtered.iter().zip(time) {
                let gate = gate_fraction(t * frequency, (t + dt) * frequency);
                let vout = v * duty * gate;
                let i = vout / r_load;
                output.push(vout);
                dissipation.push(
                    switch.conduction_loss(i, duty) + switch.switching_loss(v, i, frequency),
                );
            }
            Regulated {
                output,
                dissipation,
                duty_cycle: duty,
            }
        }
    }
}

/// Square data wave in {-1, +1}.
fn data_level(frequency: f64, t: f64) -> f64 {
    if (2.0 * PI * frequency * t).sin() >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

/// Modulation and signal-mode stage.
pub fn modulate(config: &CircuitConfiguration, regulated: &[f64], time: &[f64], dt: f64) -> Vec<f64> {
    let g = config.gain_linear();
    let f = config.frequency;
    let m = config.modulation_index;

    match config.signal_mode {
        SignalMode::Digital => {
            let switch = &config.devices.mosfet;
            regulated
                .iter()
                .zip(time)
                .map(|(&rail, &t)| {
                    // Output switch is driven from the rail while data is high
                    let vgs = if data_level(config.digital_frequency, t) > 0.0 {
                        rail
                    } else {
                        0.0
                    };
                    match switch.region(vgs, rail) {
                        MosfetRegion::Cutoff => -g,
                        _ => g,
                    }
                })
                .collect()
        }
        SignalMode::Mixed => regulated
            .iter()
            .zip(time)
            .map(|(&r, &t)| {
                g * (r * (2.0 * PI * f * t).sin() + data_level(config.digital_frequency, t))
            })
            .collect(),
        SignalMode::Analog => match config.modulation {
            Modulation::None => regulated
                .iter()
                .zip(time)
                .map(|(&r, &t)| g * r * (2.0 * PI * f * t).sin())
                .collect(),
            Modulation::Am => regulated
                .iter()
                .zip(time)
                .map(|(&r, &t)| {
                    let envelope = 1.0 + m * (2.0 * PI * MODULATING_TONE * t).sin();
                    g * r * (2.0 * PI * f * t).sin() * envelope
                })
                .collect(),
            Modulation::Fm => {
                // Phase deviation integral, restarted every tick
                let mut integral = 0.0;
                regulated
                    .iter()
                    .zip(time)
                    .map(|(&r, &t)| {
                        integral += 2.0 * PI * f * (2.0 * PI * MODULATING_TONE * t).sin() * dt;
                        g * r * (2.0 * PI * f * t + m * integral).sin()
                    })
                    .collect()
            }
        },
    }
}

/// Output coil: single-pole lag through the coil inductance into the load.
pub fn coil(
    config: &CircuitConfiguration,
    state: &mut IntegratorState,
    v: &[f64],
    dt: f64,
) -> Vec<f64> {
    if config.coil_inductance <= 0.0 {
        if let Some(&last) = v.last() {
            state.coil_output = last;
        }
        return v.to_vec();
    }
    let tau = config.coil_inductance / (config.load_resistance + config.parasitic_resistance).max(EPSILON);
    let k = lag_coefficient(dt, tau);
    v.iter()
        .map(|&vin| {
            state.coil_output += k * (vin - state.coil_output);
            state.coil_output
        })
        .collect()
}

/// Line current drawn by the rectifier: a sine lagging the source by 30°
/// with a tenth of the source peak in amperes.
pub fn input_current(config: &CircuitConfiguration, v_ac: &[f64], time: &[f64]) -> Vec<f64> {
    let peak = v_ac.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
    let f = source_frequency(config);
    time.iter()
        .map(|&t| (2.0 * PI * f * t - PI / 6.0).sin() * peak / 10.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::CircuitConfiguration;
    use approx::assert_relative_eq;

    const DT: f64 = 1e-4;

    fn time(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64 * DT).collect()
    }

    fn powered() -> CircuitConfiguration {
        CircuitConfiguration::default().with_power(true)
    }

    #[test]
    fn test_source_amplitude() {
        let config = powered();
        let v = source(&config, &time(1000));
        let peak = v.iter().fold(0.0f64, |a, v| a.max(v.abs()));
        assert_relative_eq!(peak, 120.0 * SQRT_2, max_relative = 0.01);
    }

    #[test]
    fn test_transformer_scales_and_clamps() {
        let mut config = powered();
        config.coil_inductance = 0.0;
        config.turns_ratio = 0.5;
        let out = transformer(&config, &[10.0, -10.0], DT);
        assert_eq!(out, vec![5.0, -5.0]);

        config.turns_ratio = 100.0;
        let out = transformer(&config, &[100.0, -100.0], DT);
        assert_eq!(out, vec![MAX_VOLTAGE, -MAX_VOLTAGE]);
    }

    #[test]
    fn test_transformer_leakage_repeats_last_derivative() {
        let mut config = powered();
        config.coil_inductance = 1e-3;
        let out = transformer(&config, &[0.0, 1.0, 2.0], 1.0);
        // dV/dt = 1 everywhere, last point repeats it
        assert_relative_eq!(out[0], -1e-3);
        assert_relative_eq!(out[2], 2.0 - 1e-3);
    }

    #[test]
    fn test_rectifiers_never_negative() {
        let v: Vec<f64> = (0..500).map(|i| 300.0 * ((i as f64) * 0.37).sin()).collect();
        for kind in [RectifierKind::HalfWave, RectifierKind::FullWave, RectifierKind::Bridge] {
            let config = powered().with_rectifier(kind);
            assert!(rectify(&config, &v).iter().all(|&x| x >= 0.0), "{}", kind);
        }
    }

    #[test]
    fn test_bridge_drops_two_diodes() {
        let config = powered().with_rectifier(RectifierKind::Bridge);
        let out = rectify(&config, &[-100.0])[0];
        let drop = 100.0 - out;
        assert!(drop > 1.0 && drop < 2.0, "drop = {}", drop);
        assert_eq!(rectify(&config, &[0.5])[0], 0.0);
    }

    #[test]
    fn test_half_wave_blocks_negative() {
        let config = powered().with_rectifier(RectifierKind::HalfWave);
        assert_eq!(rectify(&config, &[5.0, -5.0]), vec![5.0, 0.0]);
    }

    #[test]
    fn test_capacitor_charge_discharge_monotonic() {
        let config = powered().with_filter(FilterKind::Capacitive { capacitance: 100e-6 });
        let mut state = IntegratorState::at_rest(&config);
        let rect: Vec<f64> = (0..1000)
            .map(|i| (2.0 * PI * 60.0 * i as f64 * DT).sin().abs() * 160.0)
            .collect();
        let mut prev = state.capacitor_voltage;
        let out = filter(&config, &mut state, &rect, DT);
        for (vin, vc) in rect.iter().zip(&out) {
            if *vin > prev {
                assert!(*vc >= prev);
            } else {
                assert!(*vc <= prev);
            }
            prev = *vc;
        }
        assert_eq!(state.capacitor_voltage, *out.last().unwrap());
    }

    #[test]
    fn test_inductive_and_active_track_dc() {
        for kind in [
            FilterKind::Inductive { inductance: 0.5 },
            FilterKind::Active { cutoff: 50.0 },
        ] {
            let config = powered().with_filter(kind);
            let mut state = IntegratorState::at_rest(&config);
            let out = filter(&config, &mut state, &vec![0.5; 5000], DT);
            assert_relative_eq!(*out.last().unwrap(), 0.5, epsilon = 1e-3);
            assert!(out.windows(2).all(|w| w[1] >= w[0] - 1e-12));
        }
    }

    #[test]
    fn test_large_step_settles_within_five_tau() {
        let cases = [
            (
                FilterKind::Inductive { inductance: 0.5 },
                0.5 / (100.0 + 0.1),
            ),
            (FilterKind::Active { cutoff: 100.0 }, 1.0 / (2.0 * PI * 100.0)),
        ];
        for (kind, tau) in cases {
            let config = powered().with_filter(kind);
            let mut state = IntegratorState::at_rest(&config);
            let n = (5.0 * tau / DT).ceil() as usize + 1;
            let out = filter(&config, &mut state, &vec![100.0; n], DT);
            let last = *out.last().unwrap();
            assert!((last - 100.0).abs() <= 1.0, "{:?} settled at {}", kind, last);
        }
    }

    #[test]
    fn test_active_filter_limited_to_output_swing() {
        let mut config = powered().with_filter(FilterKind::Active { cutoff: 100.0 });
        config.devices.opamp.v_max = 15.0;
        let mut state = IntegratorState::at_rest(&config);
        let out = filter(&config, &mut state, &vec![100.0; 2000], DT);
        assert!(out.iter().all(|v| v.abs() <= 15.0));
        assert_relative_eq!(*out.last().unwrap(), 15.0, epsilon = 1e-6);
    }

    #[test]
    fn test_linear_regulator_clamps() {
        let config = powered().with_regulator(RegulatorKind::Linear { vref: 5.0 });
        let reg = regulate(&config, &[0.0, 3.0, 20.0], &time(3), DT, 1.0);
        assert_eq!(reg.output[0], 0.0);
        assert!(reg.output[1] < 3.0);
        assert_relative_eq!(reg.output[2], 5.0);
        assert!(reg.dissipation[2] > 0.0);
    }

    #[test]
    fn test_linear_regulator_derating() {
        let config = powered().with_regulator(RegulatorKind::Linear { vref: 10.0 });
        let reg = regulate(&config, &[50.0], &time(1), DT, 0.9);
        assert_relative_eq!(reg.output[0], 9.0);
    }

    #[test]
    fn test_switching_regulator_duty() {
        let config = powered().with_regulator(RegulatorKind::Switching {
            frequency: 10_000.0,
            vref: 5.0,
        });
        let filtered = vec![20.0; 1000];
        let reg = regulate(&config, &filtered, &time(1000), DT, 1.0);
        assert_relative_eq!(reg.duty_cycle, 0.25, epsilon = 1e-6);
        // One switching period per sample: gate averages to one half
        let mean = reg.output.iter().sum::<f64>() / 1000.0;
        assert_relative_eq!(mean, 20.0 * 0.25 * 0.5, max_relative = 1e-6);
        assert!(reg.dissipation.iter().all(|&p| p > 0.0));
    }

    #[test]
    fn test_gate_fraction() {
        assert_relative_eq!(gate_fraction(0.0, 0.25), 1.0);
        assert_relative_eq!(gate_fraction(0.5, 0.75), 0.0);
        assert_relative_eq!(gate_fraction(0.0, 10.0), 0.5);
        assert_relative_eq!(gate_fraction(0.25, 0.75), 0.5);
    }

    #[test]
    fn test_digital_mode_thresholds_on_vth() {
        let mut config = powered();
        config.signal_mode = SignalMode::Digital;
        let t = vec![0.1e-3, 1.1e-3]; // data high, then low at 500 Hz
        let high_rail = modulate(&config, &[12.0, 12.0], &t, DT);
        assert_eq!(high_rail, vec![1.0, -1.0]);
        // Rail below Vth never turns the output switch on
        let low_rail = modulate(&config, &[1.0, 1.0], &t, DT);
        assert_eq!(low_rail, vec![-1.0, -1.0]);
    }

    #[test]
    fn test_am_envelope_bounds() {
        let config = powered().with_modulation(Modulation::Am);
        let t = time(1000);
        let out = modulate(&config, &vec![10.0; 1000], &t, DT);
        let peak = out.iter().fold(0.0f64, |a, v| a.max(v.abs()));
        assert!(peak <= 10.0 * (1.0 + config.modulation_index) + 1e-9);
    }

    #[test]
    fn test_fm_keeps_amplitude() {
        let config = powered().with_modulation(Modulation::Fm);
        let out = modulate(&config, &vec![3.0; 1000], &time(1000), DT);
        assert!(out.iter().all(|v| v.abs() <= 3.0 + 1e-12));
    }

    #[test]
    fn test_coil_lag_persists() {
        let mut config = powered();
        config.coil_inductance = 1.0;
        let mut state = IntegratorState::at_rest(&config);
        let first = coil(&config, &mut state, &[10.0; 10], DT);
        assert!(first[9] < 10.0);
        let second = coil(&config, &mut state, &[10.0; 10], DT);
        assert!(second[0] > first[9]);
    }

    #[test]
    fn test_input_current_lags_source() {
        let config = powered();
        let t = time(1000);
        let v = source(&config, &t);
        let i = input_current(&config, &v, &t);
        let peak_v = v.iter().fold(0.0f64, |a, x| a.max(x.abs()));
        let peak_i = i.iter().fold(0.0f64, |a, x| a.max(x.abs()));
        assert_relative_eq!(peak_i, peak_v / 10.0, max_relative = 0.01);
        assert!(i[0] < 0.0);
    }
}
