//! Component models for the receiver signal path.
//!
//! This module provides:
//! - Nonlinear devices: Diode, MOSFET / power switch, BJT, Op-Amp
//! - Thermal: coupled RC junction network
//! - Magnetic: Jiles-Atherton style transformer core
//!
//! Device models are pure: every call is a function of its parameters and
//! arguments only. State lives in [`ThermalState`] and [`MagneticCore`],
//! which the solver carries between ticks.

pub mod bjt;
pub mod diode;
pub mod magnetic;
pub mod mosfet;
pub mod opamp;
pub mod thermal;

pub use bjt::{BjtParams, BjtType};
pub use diode::DiodeParams;
pub use magnetic::{CoreParams, CoreSample, MagneticCore};
pub use mosfet::{MosfetParams, MosfetRegion, SwitchTechnology};
pub use opamp::OpAmpParams;
pub use thermal::{ThermalParams, ThermalReading, ThermalState};

/// Parameter sets for every semiconductor in the signal path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceModels {
    /// Rectifier diodes
    pub diode: DiodeParams,
    /// Regulator switch and digital output stage
    pub mosfet: MosfetParams,
    /// Linear regulator pass transistor
    pub pass_transistor: BjtParams,
    /// Active filter amplifier
    pub opamp: OpAmpParams,
}

impl Default for DeviceModels {
    fn default() -> Self {
        Self {
            diode: DiodeParams::default(),
            mosfet: MosfetParams::default(),
            pass_transistor: BjtParams::power_npn(),
            opamp: OpAmpParams::default(),
        }
    }
}
