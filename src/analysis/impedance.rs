//! Port impedances and reflection metrics.
//!
//! ```text
//! Gamma = (Z - Zref) / (Z + Zref)
//! VSWR  = (1 + |Gamma|) / (1 - |Gamma|)
//! RL    = -20 log10 |Gamma|
//! ```

use std::f64::consts::PI;

use num_complex::Complex64;

use crate::circuit::{CircuitConfiguration, FilterKind};

use super::spectrum::logspace;

/// Series resistance of the conducting rectifier path (ohms).
pub const RECTIFIER_RESISTANCE: f64 = 10.0;

/// Output resistance of the regulator (ohms).
pub const REGULATOR_OUTPUT_RESISTANCE: f64 = 5.0;

/// Number of points in the |Gamma| sweep.
pub const SWEEP_POINTS: usize = 100;

const EPSILON: f64 = 1e-10;

/// Reflection metrics of one port.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortMetrics {
    /// Port impedance (ohms)
    pub impedance: Complex64,
    /// Reflection coefficient
    pub gamma: Complex64,
    /// Voltage standing wave ratio, >= 1
    pub vswr: f64,
    /// Return loss (dB)
    pub return_loss_db: f64,
}

impl PortMetrics {
    /// Metrics of a perfectly matched port.
    pub fn matched(impedance: Complex64) -> Self {
        Self {
            impedance,
            gamma: Complex64::new(0.0, 0.0),
            vswr: 1.0,
            return_loss_db: 0.0,
        }
    }

    /// Reflection metrics of `impedance` seen from `reference`.
    pub fn new(impedance: Complex64, reference: Complex64) -> Self {
        let gamma = reflection_coefficient(impedance, reference);
        Self {
            impedance,
            gamma,
            vswr: vswr(gamma.norm()),
            return_loss_db: return_loss(gamma.norm()),
        }
    }

    /// |Gamma|.
    pub fn gamma_magnitude(&self) -> f64 {
        self.gamma.norm()
    }
}

/// Reflection coefficient of `z` against `z_ref`.
pub fn reflection_coefficient(z: Complex64, z_ref: Complex64) -> Complex64 {
    let den = z + z_ref;
    if den.norm() < EPSILON {
        return Complex64::new(0.0, 0.0);
    }
    let gamma = (z - z_ref) / den;
    if gamma.is_finite() {
        gamma
    } else {
        Complex64::new(0.0, 0.0)
    }
}

/// Voltage standing wave ratio from |Gamma|.
pub fn vswr(gamma_magnitude: f64) -> f64 {
    let g = gamma_magnitude.clamp(0.0, 1.0);
    ((1.0 + g) / (1.0 - g + EPSILON)).max(1.0)
}

/// Return loss in dB from |Gamma|.
pub fn return_loss(gamma_magnitude: f64) -> f64 {
    -20.0 * (gamma_magnitude.max(0.0) + EPSILON).log10()
}

/// Receiver input impedance at `frequency`: rectifier resistance in series
/// with the smoothing filter and load.
pub fn input_impedance(config: &CircuitConfiguration, frequency: f64) -> Complex64 {
    let omega = 2.0 * PI * frequency.max(0.0);
    let r_load = Complex64::new(config.load_resistance, 0.0);
    let network = match config.filter {
        FilterKind::Capacitive { capacitance } => {
            let y_c = Complex64::new(0.0, omega * capacitance.max(0.0));
            let y = Complex64::new(1.0 / config.load_resistance.max(EPSILON), 0.0) + y_c;
            if y.norm() < EPSILON {
                r_load
            } else {
                y.inv()
            }
        }
        FilterKind::Inductive { inductance } => {
            Complex64::new(config.parasitic_resistance, omega * inductance) + r_load
        }
        FilterKind::Active { .. } => r_load,
    };
    Complex64::new(RECTIFIER_RESISTANCE, 0.0) + network
}

/// Output impedance of the regulator.
pub fn output_impedance() -> Complex64 {
    Complex64::new(REGULATOR_OUTPUT_RESISTANCE, 0.0)
}

/// Input and output port metrics at the signal frequency.
///
/// The input port is referenced to the source impedance, the output port
/// is the load seen from the regulator.
pub fn port_metrics(config: &CircuitConfiguration) -> (PortMetrics, PortMetrics) {
    if !config.power_on {
        return (
            PortMetrics::matched(config.source_impedance),
            PortMetrics::matched(config.load_impedance),
        );
    }
    let z_in = input_impedance(config, config.frequency);
    (
        PortMetrics::new(z_in, config.source_impedance),
        PortMetrics::new(config.load_impedance, output_impedance()),
    )
}

/// |Gamma_in| over 100 log points from 100 Hz to 100 kHz.
pub fn gamma_sweep(config: &CircuitConfiguration) -> Vec<(f64, f64)> {
    logspace(100.0, 100_000.0, SWEEP_POINTS)
        .into_iter()
        .map(|f| {
            let g = if config.power_on {
                reflection_coefficient(input_impedance(config, f), config.source_impedance).norm()
            } else {
                0.0
            };
            (f, g)
        })
        .collect()
}

/// Smith chart coordinates of a port.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmithPoint {
    /// Re(Gamma)
    pub re: f64,
    /// Im(Gamma)
    pub im: f64,
}

/// Smith chart points of the input and output ports, normalized to Z0.
pub fn smith_points(config: &CircuitConfiguration) -> (SmithPoint, SmithPoint) {
    let z0 = Complex64::new(config.reference_impedance.max(EPSILON), 0.0);
    let (z_in, z_out) = if config.power_on {
        (input_impedance(config, config.frequency), output_impedance())
    } else {
        (z0, z0)
    };
    let point = |z: Complex64| {
        let g = reflection_coefficient(z, z0);
        SmithPoint { re: g.re, im: g.im }
    };
    (point(z_in), point(z_out))
}
