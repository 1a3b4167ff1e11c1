//! The mutable receiver configuration.

use std::fmt;

use num_complex::Complex64;

use crate::components::{DeviceModels, MosfetParams, SwitchTechnology, ThermalParams};
use crate::dsl::parse_value;
use crate::error::ParamError;

use super::types::*;
use super::validate::{canonical_name, check_range, numeric_spec, parse_flag};

/// Value of a parameter as read back from the configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// Numeric parameter in SI units
    Number(f64),
    /// Enumerated parameter, canonical spelling
    Choice(&'static str),
    /// On/off parameter
    Flag(bool),
}

impl ParamValue {
    /// Numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{}", v),
            Self::Choice(s) => write!(f, "{}", s),
            Self::Flag(true) => write!(f, "on"),
            Self::Flag(false) => write!(f, "off"),
        }
    }
}

/// Component values of the stages that are not currently selected, kept so
/// switching topology back and forth restores the previous values.
#[derive(Debug, Clone, Copy, PartialEq)]
struct StageValues {
    capacitance: f64,
    inductance: f64,
    cutoff: f64,
    vref: f64,
    switching_frequency: f64,
}

impl Default for StageValues {
    fn default() -> Self {
        Self {
            capacitance: 100e-6,
            inductance: 10e-3,
            cutoff: 100.0,
            vref: 5.0,
            switching_frequency: 10_000.0,
        }
    }
}

/// Complete description of the receiver under simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitConfiguration {
    /// Whether the receiver is powered
    pub power_on: bool,
    /// Primary-side source
    pub source: SourceKind,
    /// Mains RMS voltage (V)
    pub input_voltage: f64,
    /// Mains line frequency (Hz)
    pub line_frequency: f64,
    /// Carrier frequency (Hz)
    pub frequency: f64,
    /// Output gain (dB)
    pub gain_db: f64,
    /// Carrier modulation
    pub modulation: Modulation,
    /// AM depth / FM deviation index
    pub modulation_index: f64,
    /// Output signal mode
    pub signal_mode: SignalMode,
    /// Data rate of the digital square wave (Hz)
    pub digital_frequency: f64,
    /// Rectifier topology
    pub rectifier: RectifierKind,
    /// Smoothing filter
    pub filter: FilterKind,
    /// Voltage regulator
    pub regulator: RegulatorKind,
    /// Secondary / primary turns ratio
    pub turns_ratio: f64,
    /// Transformer leakage / output coil inductance (H)
    pub coil_inductance: f64,
    /// Load resistance (ohms)
    pub load_resistance: f64,
    /// Series resistance of wound components (ohms)
    pub parasitic_resistance: f64,
    /// Source plus diode resistance charging the reservoir capacitor (ohms)
    pub charge_resistance: f64,
    /// Semiconductor models
    pub devices: DeviceModels,
    /// Junction thermal network
    pub thermal: ThermalParams,
    /// Power-factor correction
    pub pfc: PfcKind,
    /// Injected noise, as a fraction of the output standard deviation
    pub noise_level: f64,
    /// EMI line filter fitted
    pub emi_filter: bool,
    /// Transformer core material
    pub core_material: CoreMaterial,
    /// Peak field applied to the core (A/m)
    pub core_field: f64,
    /// Source-side port impedance (ohms)
    pub source_impedance: Complex64,
    /// Load-side port impedance (ohms)
    pub load_impedance: Complex64,
    /// Reference impedance Z0 (ohms)
    pub reference_impedance: f64,
    stored: StageValues,
}

impl Default for CircuitConfiguration {
    fn default() -> Self {
        let stored = StageValues::default();
        Self {
            power_on: false,
            source: SourceKind::Mains,
            input_voltage: 120.0,
            line_frequency: 60.0,
            frequency: 1000.0,
            gain_db: 0.0,
            modulation: Modulation::Am,
            modulation_index: 0.5,
            signal_mode: SignalMode::Analog,
            digital_frequency: 500.0,
            rectifier: RectifierKind::Bridge,
            filter: FilterKind::Capacitive {
                capacitance: stored.capacitance,
            },
            regulator: RegulatorKind::None,
            turns_ratio: 1.0,
            coil_inductance: 1e-3,
            load_resistance: 100.0,
            parasitic_resistance: 0.1,
            charge_resistance: 1.0,
            devices: DeviceModels::default(),
            thermal: ThermalParams::default(),
            pfc: PfcKind::None,
            noise_level: 0.01,
            emi_filter: false,
            core_material: CoreMaterial::Ferrite,
            core_field: 100.0,
            source_impedance: Complex64::new(50.0, 0.0),
            load_impedance: Complex64::new(50.0, 0.0),
            reference_impedance: 50.0,
            stored,
        }
    }
}

impl CircuitConfiguration {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the power state.
    pub fn with_power(mut self, on: bool) -> Self {
        self.power_on = on;
        self
    }

    /// Set the carrier frequency (Hz).
    pub fn with_frequency(mut self, frequency: f64) -> Self {
        self.frequency = frequency;
        self
    }

    /// Set the rectifier topology.
    pub fn with_rectifier(mut self, rectifier: RectifierKind) -> Self {
        self.rectifier = rectifier;
        self
    }

    /// Set the filter, remembering its component value.
    pub fn with_filter(mut self, filter: FilterKind) -> Self {
        self.filter = filter;
        self.remember_stage_values();
        self
    }

    /// Set the regulator, remembering its component values.
    pub fn with_regulator(mut self, regulator: RegulatorKind) -> Self {
        self.regulator = regulator;
        self.remember_stage_values();
        self
    }

    /// Set the carrier modulation.
    pub fn with_modulation(mut self, modulation: Modulation) -> Self {
        self.modulation = modulation;
        self
    }

    /// Set the power-factor correction scheme.
    pub fn with_pfc(mut self, pfc: PfcKind) -> Self {
        self.pfc = pfc;
        self
    }

    /// Set the injected noise level.
    pub fn with_noise_level(mut self, level: f64) -> Self {
        self.noise_level = level;
        self
    }

    /// Linear output gain.
    pub fn gain_linear(&self) -> f64 {
        10f64.powf(self.gain_db / 20.0)
    }

    /// Reference voltage of the regulator, whether or not it is active.
    pub fn vref(&self) -> f64 {
        match self.regulator {
            RegulatorKind::Linear { vref } | RegulatorKind::Switching { vref, .. } => vref,
            RegulatorKind::None => self.stored.vref,
        }
    }

    fn remember_stage_values(&mut self) {
        match self.filter {
            FilterKind::Capacitive { capacitance } => self.stored.capacitance = capacitance,
            FilterKind::Inductive { inductance } => self.stored.inductance = inductance,
            FilterKind::Active { cutoff } => self.stored.cutoff = cutoff,
        }
        match self.regulator {
            RegulatorKind::None => {}
            RegulatorKind::Linear { vref } => self.stored.vref = vref,
            RegulatorKind::Switching { frequency, vref } => {
                self.stored.switching_frequency = frequency;
                self.stored.vref = vref;
            }
        }
    }

    fn refresh_stage_payloads(&mut self) {
        let s = self.stored;
        self.filter = match self.filter {
            FilterKind::Capacitive { .. } => FilterKind::Capacitive {
                capacitance: s.capacitance,
            },
            FilterKind::Inductive { .. } => FilterKind::Inductive {
                inductance: s.inductance,
            },
            FilterKind::Active { .. } => FilterKind::Active { cutoff: s.cutoff },
        };
        self.regulator = match self.regulator {
            RegulatorKind::None => RegulatorKind::None,
            RegulatorKind::Linear { .. } => RegulatorKind::Linear { vref: s.vref },
            RegulatorKind::Switching { .. } => RegulatorKind::Switching {
                frequency: s.switching_frequency,
                vref: s.vref,
            },
        };
    }

    /// Update one parameter from its textual value.
    ///
    /// Numbers accept SI suffixes (`100u`, `10k`). On error the
    /// configuration is left untouched.
    pub fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), ParamError> {
        let key = canonical_name(name);
        let value = value.trim();

        match key.as_str() {
            "power" => self.power_on = parse_flag(&key, value)?,
            "emi_filter" => self.emi_filter = parse_flag(&key, value)?,
            "source" => self.source = choice(&key, value, SourceKind::from_str, SourceKind::CHOICES)?,
            "rectifier" => {
                self.rectifier = choice(&key, value, RectifierKind::from_str, RectifierKind::CHOICES)?
            }
            "modulation" => {
                self.modulation = choice(&key, value, Modulation::from_str, Modulation::CHOICES)?
            }
            "signal_mode" => {
                self.signal_mode = choice(&key, value, SignalMode::from_str, SignalMode::CHOICES)?
            }
            "pfc" => self.pfc = choice(&key, value, PfcKind::from_str, PfcKind::CHOICES)?,
            "core_material" => {
                self.core_material =
                    choice(&key, value, CoreMaterial::from_str, CoreMaterial::CHOICES)?
            }
            "switch_device" => {
                let tech = choice(
                    &key,
                    value,
                    SwitchTechnology::from_str,
                    SwitchTechnology::CHOICES,
                )?;
                self.devices.mosfet = MosfetParams::for_technology(tech);
            }
            "filter" => {
                let pick: fn(&StageValues) -> FilterKind = match value.to_lowercase().as_str() {
                    "capacitive" | "capacitor" | "c" => |s| FilterKind::Capacitive {
                        capacitance: s.capacitance,
                    },
                    "inductive" | "inductor" | "l" => |s| FilterKind::Inductive {
                        inductance: s.inductance,
                    },
                    "active" => |s| FilterKind::Active { cutoff: s.cutoff },
                    _ => return Err(ParamError::invalid_choice(key, value, FilterKind::CHOICES)),
                };
                self.remember_stage_values();
                self.filter = pick(&self.stored);
            }
            "regulator" => {
                let pick: fn(&StageValues) -> RegulatorKind = match value.to_lowercase().as_str() {
                    "none" | "off" => |_| RegulatorKind::None,
                    "linear" => |s| RegulatorKind::Linear { vref: s.vref },
                    "switching" | "buck" => |s| RegulatorKind::Switching {
                        frequency: s.switching_frequency,
                        vref: s.vref,
                    },
                    _ => {
                        return Err(ParamError::invalid_choice(
                            key,
                            value,
                            RegulatorKind::CHOICES,
                        ))
                    }
                };
                self.remember_stage_values();
                self.regulator = pick(&self.stored);
            }
            _ => {
                let spec = numeric_spec(&key).ok_or_else(|| ParamError::unknown(name.trim()))?;
                let number = parse_value(value).ok_or_else(|| ParamError::InvalidNumber {
                    name: key.clone(),
                    value: value.to_string(),
                })?;
                let number = check_range(spec, number)?;
                self.write_numeric(spec.name, number);
            }
        }
        Ok(())
    }

    /// Read one parameter back.
    pub fn get_parameter(&self, name: &str) -> Result<ParamValue, ParamError> {
        let key = canonical_name(name);
        let value = match key.as_str() {
            "power" => ParamValue::Flag(self.power_on),
            "emi_filter" => ParamValue::Flag(self.emi_filter),
            "source" => ParamValue::Choice(self.source.as_str()),
            "rectifier" => ParamValue::Choice(self.rectifier.as_str()),
            "modulation" => ParamValue::Choice(self.modulation.as_str()),
            "signal_mode" => ParamValue::Choice(self.signal_mode.as_str()),
            "pfc" => ParamValue::Choice(self.pfc.as_str()),
            "core_material" => ParamValue::Choice(self.core_material.as_str()),
            "switch_device" => ParamValue::Choice(self.devices.mosfet.technology.as_str()),
            "filter" => ParamValue::Choice(self.filter.as_str()),
            "regulator" => ParamValue::Choice(self.regulator.as_str()),
            _ => ParamValue::Number(
                self.numeric(&key)
                    .ok_or_else(|| ParamError::unknown(name.trim()))?,
            ),
        };
        Ok(value)
    }

    /// Read a numeric parameter by canonical name.
    pub fn numeric(&self, name: &str) -> Option<f64> {
        let d = &self.devices;
        let t = &self.thermal;
        let v = match name {
            "frequency" => self.frequency,
            "gain" => self.gain_db,
            "modulation_index" => self.modulation_index,
            "digital_frequency" => self.digital_frequency,
            "noise_level" => self.noise_level,
            "input_voltage" => self.input_voltage,
            "line_frequency" => self.line_frequency,
            "turns_ratio" => self.turns_ratio,
            "coil_inductance" => self.coil_inductance,
            "capacitance" => match self.filter {
                FilterKind::Capacitive { capacitance } => capacitance,
                _ => self.stored.capacitance,
            },
            "inductance" => match self.filter {
                FilterKind::Inductive { inductance } => inductance,
                _ => self.stored.inductance,
            },
            "cutoff" => match self.filter {
                FilterKind::Active { cutoff } => cutoff,
                _ => self.stored.cutoff,
            },
            "load_resistance" => self.load_resistance,
            "parasitic_resistance" => self.parasitic_resistance,
            "charge_resistance" => self.charge_resistance,
            "vref" => self.vref(),
            "switching_frequency" => self
                .regulator
                .switching_frequency()
                .unwrap_or(self.stored.switching_frequency),
            "diode_is" => d.diode.is,
            "diode_n" => d.diode.n,
            "mosfet_vth" => d.mosfet.vth,
            "mosfet_k" => d.mosfet.k,
            "switch_on_resistance" => d.mosfet.r_on,
            "opamp_gain" => d.opamp.gain,
            "opamp_max_output" => d.opamp.v_max,
            "ambient_temperature" => t.ambient,
            "rth_diode" => t.rth_diode,
            "cth_diode" => t.cth_diode,
            "rth_switch" => t.rth_switch,
            "cth_switch" => t.cth_switch,
            "thermal_coupling" => t.coupling,
            "core_field" => self.core_field,
            "z0" => self.reference_impedance,
            "zs_real" => self.source_impedance.re,
            "zs_imag" => self.source_impedance.im,
            "zl_real" => self.load_impedance.re,
            "zl_imag" => self.load_impedance.im,
            _ => return None,
        };
        Some(v)
    }

    fn write_numeric(&mut self, name: &str, v: f64) {
        match name {
            "frequency" => self.frequency = v,
            "gain" => self.gain_db = v,
            "modulation_index" => self.modulation_index = v,
            "digital_frequency" => self.digital_frequency = v,
            "noise_level" => self.noise_level = v,
            "input_voltage" => self.input_voltage = v,
            "line_frequency" => self.line_frequency = v,
            "turns_ratio" => self.turns_ratio = v,
            "coil_inductance" => self.coil_inductance = v,
            "capacitance" | "inductance" | "cutoff" | "vref" | "switching_frequency" => {
                self.remember_stage_values();
                match name {
                    "capacitance" => self.stored.capacitance = v,
                    "inductance" => self.stored.inductance = v,
                    "cutoff" => self.stored.cutoff = v,
                    "vref" => self.stored.vref = v,
                    _ => self.stored.switching_frequency = v,
                }
                self.refresh_stage_payloads();
            }
            "load_resistance" => self.load_resistance = v,
            "parasitic_resistance" => self.parasitic_resistance = v,
            "charge_resistance" => self.charge_resistance = v,
            "diode_is" => self.devices.diode.is = v,
            "diode_n" => self.devices.diode.n = v,
            "mosfet_vth" => self.devices.mosfet.vth = v,
            "mosfet_k" => self.devices.mosfet.k = v,
            "switch_on_resistance" => self.devices.mosfet.r_on = v,
            "opamp_gain" => self.devices.opamp.gain = v,
            "opamp_max_output" => self.devices.opamp.v_max = v,
            "ambient_temperature" => self.thermal.ambient = v,
            "rth_diode" => self.thermal.rth_diode = v,
            "cth_diode" => self.thermal.cth_diode = v,
            "rth_switch" => self.thermal.rth_switch = v,
            "cth_switch" => self.thermal.cth_switch = v,
            "thermal_coupling" => self.thermal.coupling = v,
            "core_field" => self.core_field = v,
            "z0" => self.reference_impedance = v,
            "zs_real" => self.source_impedance.re = v,
            "zs_imag" => self.source_impedance.im = v,
            "zl_real" => self.load_impedance.re = v,
            "zl_imag" => self.load_impedance.im = v,
            _ => {}
        }
    }
}

fn choice<T>(
    name: &str,
    value: &str,
    parse: fn(&str) -> Option<T>,
    choices: &[&str],
) -> Result<T, ParamError> {
    parse(value).ok_or_else(|| ParamError::invalid_choice(name, value, choices))
}
