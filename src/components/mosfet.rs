//! MOSFET / power switch model.
//!
//! Square-law long-channel model:
//!
//! | Region     | Condition            | Drain current              |
//! |------------|----------------------|----------------------------|
//! | Cutoff     | Vgs < Vth            | 0                          |
//! | Linear     | Vds < Vgs - Vth      | k (Vgs - Vth) Vds          |
//! | Saturation | otherwise            | 0.5 k (Vgs - Vth)^2        |
//!
//! The same parameter set carries the switching-loss figures used by the
//! thermal model when the part sits in a buck regulator.

/// Operating region of a MOSFET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MosfetRegion {
    Cutoff,
    Linear,
    Saturation,
}

/// Power switch technology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwitchTechnology {
    /// Silicon power MOSFET
    #[default]
    Mosfet,
    /// Insulated-gate bipolar transistor
    Igbt,
    /// Gallium nitride HEMT
    Gan,
    /// Silicon carbide MOSFET
    Sic,
}

impl SwitchTechnology {
    /// Accepted spellings, for error messages.
    pub const CHOICES: &'static [&'static str] = &["mosfet", "igbt", "gan", "sic"];

    /// Parse technology from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mosfet" | "si" => Some(Self::Mosfet),
            "igbt" => Some(Self::Igbt),
            "gan" => Some(Self::Gan),
            "sic" => Some(Self::Sic),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mosfet => "mosfet",
            Self::Igbt => "igbt",
            Self::Gan => "gan",
            Self::Sic => "sic",
        }
    }
}

/// Parameters for a MOSFET model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MosfetParams {
    /// Device technology the figures below were taken from
    pub technology: SwitchTechnology,
    /// Threshold voltage (V)
    pub vth: f64,
    /// Transconductance parameter (A/V^2)
    pub k: f64,
    /// On-state resistance (ohms)
    pub r_on: f64,
    /// Turn-on transition time (s)
    pub t_on: f64,
    /// Turn-off transition time (s)
    pub t_off: f64,
}

impl Default for MosfetParams {
    fn default() -> Self {
        Self::silicon()
    }
}

impl MosfetParams {
    /// Typical silicon power MOSFET.
    pub fn silicon() -> Self {
        Self {
            technology: SwitchTechnology::Mosfet,
            vth: 2.0,
            k: 0.1,
            r_on: 0.1,
            t_on: 50e-9,
            t_off: 50e-9,
        }
    }

    /// Typical 1200 V IGBT.
    pub fn igbt() -> Self {
        Self {
            technology: SwitchTechnology::Igbt,
            vth: 4.0,
            k: 0.1,
            r_on: 0.2,
            t_on: 100e-9,
            t_off: 100e-9,
        }
    }

    /// Typical 650 V GaN HEMT.
    pub fn gan() -> Self {
        Self {
            technology: SwitchTechnology::Gan,
            vth: 1.5,
            k: 0.1,
            r_on: 0.05,
            t_on: 20e-9,
            t_off: 20e-9,
        }
    }

    /// Typical 1200 V SiC MOSFET.
    pub fn sic() -> Self {
        Self {
            technology: SwitchTechnology::Sic,
            vth: 2.5,
            k: 0.1,
            r_on: 0.08,
            t_on: 30e-9,
            t_off: 30e-9,
        }
    }

    /// Preset for a technology.
    pub fn for_technology(technology: SwitchTechnology) -> Self {
        match technology {
            SwitchTechnology::Mosfet => Self::silicon(),
            SwitchTechnology::Igbt => Self::igbt(),
            SwitchTechnology::Gan => Self::gan(),
            SwitchTechnology::Sic => Self::sic(),
        }
    }

    /// Determine the operating region.
    pub fn region(&self, vgs: f64, vds: f64) -> MosfetRegion {
        if vgs < self.vth {
            MosfetRegion::Cutoff
        } else if vds < vgs - self.vth {
            MosfetRegion::Linear
        } else {
            MosfetRegion::Saturation
        }
    }

    /// Drain current for the given terminal voltages.
    pub fn drain_current(&self, vgs: f64, vds: f64) -> f64 {
        let vov = vgs - self.vth;
        match self.region(vgs, vds) {
            MosfetRegion::Cutoff => 0.0,
            MosfetRegion::Linear => self.k * vov * vds,
            MosfetRegion::Saturation => 0.5 * self.k * vov * vov,
        }
    }

    /// Conduction loss at `i` amperes and duty cycle `duty`.
    pub fn conduction_loss(&self, i: f64, duty: f64) -> f64 {
        i * i * self.r_on * duty.clamp(0.0, 1.0)
    }

    /// Hard-switching loss when commutating `i` against `v` at `f_sw`.
    pub fn switching_loss(&self, v: f64, i: f64, f_sw: f64) -> f64 {
        0.5 * v.abs() * i.abs() * (self.t_on + self.t_off) * f_sw.max(0.0)
    }
}
