//! Integrator state carried from one tick to the next.

use crate::circuit::CircuitConfiguration;
use crate::components::{MagneticCore, ThermalState};

/// Everything the waveform generator remembers between ticks.
///
/// A fresh state is the receiver at rest: discharged filter, demagnetized
/// core, junctions at ambient.
#[derive(Debug, Clone)]
pub struct IntegratorState {
    /// Reservoir capacitor voltage (V)
    pub capacitor_voltage: f64,
    /// Running output of the inductive or active filter (V)
    pub filter_output: f64,
    /// Output of the coil stage after modulation (V)
    pub coil_output: f64,
    /// Transformer core
    pub core: MagneticCore,
    /// Junction temperatures
    pub thermal: ThermalState,
    /// Power state seen by the previous tick
    pub powered: bool,
}

impl IntegratorState {
    /// State of a receiver at rest.
    pub fn at_rest(config: &CircuitConfiguration) -> Self {
        Self {
            capacitor_voltage: 0.0,
            filter_output: 0.0,
            coil_output: 0.0,
            core: MagneticCore::new(config.core_material),
            thermal: ThermalState::at_ambient(config.thermal.ambient),
            powered: false,
        }
    }

    /// Return to rest, keeping the core material.
    pub fn reset(&mut self, config: &CircuitConfiguration) {
        self.capacitor_voltage = 0.0;
        self.filter_output = 0.0;
        self.coil_output = 0.0;
        self.core.set_material(config.core_material);
        self.core.reset();
        self.thermal = ThermalState::at_ambient(config.thermal.ambient);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_returns_to_rest() {
        let config = CircuitConfiguration::default();
        let mut state = IntegratorState::at_rest(&config);
        state.capacitor_voltage = 12.0;
        state.filter_output = 3.0;
        state.thermal.diode = 80.0;
        state.core.drive(100.0);
        state.reset(&config);
        assert_eq!(state.capacitor_voltage, 0.0);
        assert_eq!(state.filter_output, 0.0);
        assert_eq!(state.thermal.system_temperature(), config.thermal.ambient);
        assert_eq!(state.core.history_len(), 0);
    }
}
