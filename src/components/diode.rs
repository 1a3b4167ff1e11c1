//! Diode model.
//!
//! Uses the Shockley diode equation:
//!   I = Is * (exp(V / (n * Vt)) - 1)
//!
//! and its inverse for the forward drop at a given current:
//!   V = n * Vt * ln(I / Is + 1)
//!
//! Both directions clamp their argument so no input can overflow.

use crate::THERMAL_VOLTAGE;

/// Largest exponent argument passed to `exp()`.
pub const MAX_EXPONENT: f64 = 700.0;

/// Current range accepted by [`DiodeParams::voltage_drop`].
pub const MIN_DROP_CURRENT: f64 = 1e-15;
/// Upper current clamp for [`DiodeParams::voltage_drop`].
pub const MAX_DROP_CURRENT: f64 = 1e6;

/// Parameters for a diode model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiodeParams {
    /// Saturation current (Is), typically 1e-14 to 1e-12 A
    pub is: f64,
    /// Ideality factor (n), typically 1.0 to 2.0
    pub n: f64,
}

impl Default for DiodeParams {
    fn default() -> Self {
        Self { is: 1e-12, n: 1.0 }
    }
}

impl DiodeParams {
    /// Create parameters for a Schottky rectifier (lower forward voltage).
    pub fn schottky() -> Self {
        Self { is: 1e-8, n: 1.05 }
    }

    /// Thermal voltage times ideality factor.
    pub fn n_vt(&self) -> f64 {
        self.n * THERMAL_VOLTAGE
    }

    /// Calculate the diode current at a given voltage.
    pub fn current(&self, v: f64) -> f64 {
        let x = (v / self.n_vt()).clamp(-MAX_EXPONENT, MAX_EXPONENT);
        self.is * (x.exp() - 1.0)
    }

    /// Forward voltage drop while conducting `i` amperes.
    pub fn voltage_drop(&self, i: f64) -> f64 {
        let i = i.clamp(MIN_DROP_CURRENT, MAX_DROP_CURRENT);
        self.n_vt() * (i / self.is.max(f64::MIN_POSITIVE) + 1.0).ln()
    }

    /// Check if the diode conducts in the forward direction at `v`.
    pub fn is_forward(&self, v: f64) -> bool {
        self.current(v) > 0.0
    }

    /// Power dissipated while conducting `i` amperes.
    pub fn dissipation(&self, i: f64) -> f64 {
        if i <= 0.0 {
            return 0.0;
        }
        i * self.voltage_drop(i)
    }
}
