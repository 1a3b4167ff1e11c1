//! Coupled RC thermal network for the rectifier diode and the power switch.
//!
//! Each device is one thermal node:
//!
//! ```text
//! dT/dt = (P * Rth + coupling * (T_other - T) - (T - T_ambient)) / Cth
//! ```
//!
//! integrated with forward Euler at the waveform sample interval.

/// Fractional derating of the linear regulator reference per °C above ambient.
pub const VREF_DERATING_PER_DEGREE: f64 = 0.002;

/// The derated reference never drops below this fraction of nominal.
pub const MIN_DERATING_FACTOR: f64 = 0.5;

/// Parameters for the thermal network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalParams {
    /// Ambient temperature (°C)
    pub ambient: f64,
    /// Diode thermal resistance (°C/W)
    pub rth_diode: f64,
    /// Diode thermal capacitance (J/°C)
    pub cth_diode: f64,
    /// Switch thermal resistance (°C/W)
    pub rth_switch: f64,
    /// Switch thermal capacitance (J/°C)
    pub cth_switch: f64,
    /// Heat exchange between the two nodes, 0..1
    pub coupling: f64,
}

impl Default for ThermalParams {
    fn default() -> Self {
        Self {
            ambient: 25.0,
            rth_diode: 2.0,
            cth_diode: 0.1,
            rth_switch: 1.5,
            cth_switch: 0.08,
            coupling: 0.2,
        }
    }
}

/// Junction temperatures carried between ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalState {
    /// Diode junction temperature (°C)
    pub diode: f64,
    /// Switch junction temperature (°C)
    pub switch: f64,
}

impl ThermalState {
    /// Both junctions at `ambient`.
    pub fn at_ambient(ambient: f64) -> Self {
        Self {
            diode: ambient,
            switch: ambient,
        }
    }

    /// Mean of the device temperatures.
    pub fn system_temperature(&self) -> f64 {
        0.5 * (self.diode + self.switch)
    }

    /// Advance both nodes by one Euler step of `dt` seconds.
    pub fn step(&mut self, params: &ThermalParams, p_diode: f64, p_switch: f64, dt: f64) {
        // Each node sees itself through (1 + coupling); keep the step below
        // the explicit-Euler overshoot limit.
        let limit = 1.0 / (1.0 + 2.0 * params.coupling.max(0.0));
        let kd = (dt / params.cth_diode.max(1e-9)).min(limit);
        let ks = (dt / params.cth_switch.max(1e-9)).min(limit);

        let d_diode = p_diode.max(0.0) * params.rth_diode
            + params.coupling * (self.switch - self.diode)
            - (self.diode - params.ambient);
        let d_switch = p_switch.max(0.0) * params.rth_switch
            + params.coupling * (self.diode - self.switch)
            - (self.switch - params.ambient);

        self.diode += kd * d_diode;
        self.switch += ks * d_switch;
    }

    /// Multiplier applied to the linear regulator reference.
    pub fn derating_factor(&self, params: &ThermalParams) -> f64 {
        let rise = (self.system_temperature() - params.ambient).max(0.0);
        (1.0 - VREF_DERATING_PER_DEGREE * rise).max(MIN_DERATING_FACTOR)
    }
}

/// Thermal and efficiency figures for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalReading {
    /// Diode junction temperature at the end of the tick (°C)
    pub diode_temperature: f64,
    /// Switch junction temperature at the end of the tick (°C)
    pub switch_temperature: f64,
    /// Mean junction temperature (°C)
    pub system_temperature: f64,
    /// Mean diode dissipation over the tick (W)
    pub diode_power: f64,
    /// Mean switch dissipation over the tick (W)
    pub switch_power: f64,
    /// Mean power delivered to the load (W)
    pub load_power: f64,
    /// 1 - P_dissipated / P_input, after the PFC penalty, in [0, 1]
    pub efficiency: f64,
}

impl ThermalReading {
    /// Reading of an unpowered receiver.
    pub fn idle(ambient: f64) -> Self {
        Self {
            diode_temperature: ambient,
            switch_temperature: ambient,
            system_temperature: ambient,
            diode_power: 0.0,
            switch_power: 0.0,
            load_power: 0.0,
            efficiency: 1.0,
        }
    }
}

/// Efficiency from load and dissipated power, clamped to [0, 1].
pub fn efficiency(load_power: f64, dissipated: f64) -> f64 {
    let input = load_power.max(0.0) + dissipated.max(0.0);
    if input <= 1e-12 {
        return 1.0;
    }
    (1.0 - dissipated.max(0.0) / input).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rest_state_is_stable() {
        let params = ThermalParams::default();
        let mut state = ThermalState::at_ambient(params.ambient);
        for _ in 0..1000 {
            state.step(&params, 0.0, 0.0, 1e-4);
        }
        assert_relative_eq!(state.diode, 25.0);
        assert_relative_eq!(state.switch, 25.0);
    }

    #[test]
    fn test_heating_and_steady_state() {
        let params = ThermalParams {
            coupling: 0.0,
            ..ThermalParams::default()
        };
        let mut state = ThermalState::at_ambient(params.ambient);
        // 5 W into the diode, steady state rise = P * Rth = 10 °C
        for _ in 0..200_000 {
            state.step(&params, 5.0, 0.0, 1e-3);
        }
        assert_relative_eq!(state.diode, 35.0, epsilon = 1e-6);
        assert_relative_eq!(state.switch, 25.0);
    }

    #[test]
    fn test_coupling_heats_neighbour() {
        let params = ThermalParams::default();
        let mut state = ThermalState::at_ambient(params.ambient);
        for _ in 0..10_000 {
            state.step(&params, 5.0, 0.0, 1e-3);
        }
        assert!(state.switch > 25.0);
        assert!(state.diode > state.switch);
    }

    #[test]
    fn test_huge_step_does_not_overshoot() {
        let params = ThermalParams {
            cth_diode: 1e-12,
            cth_switch: 1e-12,
            ..ThermalParams::default()
        };
        let mut state = ThermalState::at_ambient(params.ambient);
        state.diode = 200.0;
        state.step(&params, 0.0, 0.0, 1.0);
        assert!(state.diode >= 25.0 && state.diode < 200.0);
    }

    #[test]
    fn test_efficiency_bounds() {
        assert_relative_eq!(efficiency(0.0, 0.0), 1.0);
        assert_relative_eq!(efficiency(9.0, 1.0), 0.9);
        assert_relative_eq!(efficiency(0.0, 5.0), 0.0);
    }

    #[test]
    fn test_derating() {
        let params = ThermalParams::default();
        let mut state = ThermalState::at_ambient(params.ambient);
        assert_relative_eq!(state.derating_factor(&params), 1.0);
        state.diode = 75.0;
        state.switch = 75.0;
        assert_relative_eq!(state.derating_factor(&params), 0.9);
        state.diode = 1000.0;
        state.switch = 1000.0;
        assert_relative_eq!(state.derating_factor(&params), MIN_DERATING_FACTOR);
    }
}
