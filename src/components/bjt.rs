//! BJT (Bipolar Junction Transistor) model.
//!
//! Uses the transport form of the Ebers-Moll model for NPN and PNP
//! transistors, with the Early effect on the collector current. The linear
//! regulator uses it as its series-pass element.

use crate::components::diode::MAX_EXPONENT;
use crate::THERMAL_VOLTAGE;

/// BJT type (NPN or PNP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BjtType {
    #[default]
    Npn,
    Pnp,
}

/// Parameters for a BJT model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BjtParams {
    /// Polarity
    pub bjt_type: BjtType,
    /// Forward current gain (β_F)
    pub beta_f: f64,
    /// Reverse current gain (β_R)
    pub beta_r: f64,
    /// Transport saturation current
    pub is: f64,
    /// Ideality factor
    pub n: f64,
    /// Early voltage (for output resistance), 0 = infinite
    pub va: f64,
}

impl Default for BjtParams {
    fn default() -> Self {
        Self {
            bjt_type: BjtType::Npn,
            beta_f: 100.0,
            beta_r: 1.0,
            is: 1e-14,
            n: 1.0,
            va: 100.0,
        }
    }
}

impl BjtParams {
    /// Medium-power NPN pass transistor (TIP31-class).
    pub fn power_npn() -> Self {
        Self {
            bjt_type: BjtType::Npn,
            beta_f: 50.0,
            beta_r: 2.0,
            is: 1e-12,
            n: 1.2,
            va: 80.0,
        }
    }

    /// Thermal voltage times ideality factor.
    pub fn n_vt(&self) -> f64 {
        self.n * THERMAL_VOLTAGE
    }

    fn sign(&self) -> f64 {
        match self.bjt_type {
            BjtType::Npn => 1.0,
            BjtType::Pnp => -1.0,
        }
    }

    fn junction(&self, v: f64) -> f64 {
        let x = (self.sign() * v / self.n_vt()).clamp(-MAX_EXPONENT, MAX_EXPONENT);
        x.exp() - 1.0
    }

    /// Calculate the collector current (Ic).
    pub fn i_c(&self, v_be: f64, v_bc: f64) -> f64 {
        let transport = self.is * (self.junction(v_be) - self.junction(v_bc));
        let reverse = self.is / self.beta_r * self.junction(v_bc);
        let early = if self.va > 0.0 {
            1.0 + (self.sign() * (v_be - v_bc)).max(0.0) / self.va
        } else {
            1.0
        };
        self.sign() * (transport * early - reverse)
    }

    /// Calculate the base current (Ib).
    pub fn i_b(&self, v_be: f64, v_bc: f64) -> f64 {
        self.sign()
            * (self.is / self.beta_f * self.junction(v_be)
                + self.is / self.beta_r * self.junction(v_bc))
    }

    /// Calculate the emitter current (Ie).
    pub fn i_e(&self, v_be: f64, v_bc: f64) -> f64 {
        // Ie = Ic + Ib
        self.i_c(v_be, v_bc) + self.i_b(v_be, v_bc)
    }

    /// Base-emitter voltage needed to carry `i_c` in forward-active mode.
    pub fn vbe_for_current(&self, i_c: f64) -> f64 {
        let i = i_c.abs().clamp(1e-15, 1e6);
        self.sign() * self.n_vt() * (i / self.is.max(f64::MIN_POSITIVE) + 1.0).ln()
    }
}
