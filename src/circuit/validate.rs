//! Parameter names, accepted ranges and configuration validation.

use std::fmt;

use crate::error::ParamError;

use super::CircuitConfiguration;

/// Accepted range of a numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    /// Canonical parameter name
    pub name: &'static str,
    /// Inclusive lower bound
    pub min: f64,
    /// Inclusive upper bound
    pub max: f64,
    /// Unit, for help output
    pub unit: &'static str,
}

const fn spec(name: &'static str, min: f64, max: f64, unit: &'static str) -> ParamSpec {
    ParamSpec {
        name,
        min,
        max,
        unit,
    }
}

impl fmt::Display for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}, {}]", self.name, self.min, self.max)?;
        if !self.unit.is_empty() {
            write!(f, " {}", self.unit)?;
        }
        Ok(())
    }
}

/// Every numeric parameter accepted by `set_parameter`.
pub const NUMERIC_PARAMS: &[ParamSpec] = &[
    // Signal
    spec("frequency", 100.0, 10_000.0, "Hz"),
    spec("gain", -20.0, 20.0, "dB"),
    spec("modulation_index", 0.0, 1.0, ""),
    spec("digital_frequency", 1.0, 1e5, "Hz"),
    spec("noise_level", 0.0, 10.0, ""),
    // Source and transformer
    spec("input_voltage", 0.0, 1000.0, "Vrms"),
    spec("line_frequency", 1.0, 1000.0, "Hz"),
    spec("turns_ratio", 1e-3, 1e3, ""),
    spec("coil_inductance", 0.0, 10.0, "H"),
    // Filter and load
    spec("capacitance", 1e-12, 10.0, "F"),
    spec("inductance", 1e-9, 100.0, "H"),
    spec("cutoff", 0.1, 1e6, "Hz"),
    spec("load_resistance", 1e-3, 1e9, "ohm"),
    spec("parasitic_resistance", 0.0, 1e6, "ohm"),
    spec("charge_resistance", 1e-3, 1e6, "ohm"),
    // Regulator
    spec("vref", 0.0, 1000.0, "V"),
    spec("switching_frequency", 1.0, 1e7, "Hz"),
    // Devices
    spec("diode_is", 1e-18, 1e-3, "A"),
    spec("diode_n", 0.5, 5.0, ""),
    spec("mosfet_vth", 0.0, 50.0, "V"),
    spec("mosfet_k", 1e-6, 1e3, "A/V^2"),
    spec("switch_on_resistance", 0.0, 1e3, "ohm"),
    spec("opamp_gain", 1.0, 1e9, ""),
    spec("opamp_max_output", 1e-3, 1e4, "V"),
    // Thermal
    spec("ambient_temperature", -55.0, 150.0, "°C"),
    spec("rth_diode", 0.0, 1e3, "°C/W"),
    spec("cth_diode", 1e-6, 1e3, "J/°C"),
    spec("rth_switch", 0.0, 1e3, "°C/W"),
    spec("cth_switch", 1e-6, 1e3, "J/°C"),
    spec("thermal_coupling", 0.0, 1.0, ""),
    // Magnetic core
    spec("core_field", 0.0, 1e6, "A/m"),
    // Port impedances
    spec("z0", 1e-3, 1e6, "ohm"),
    spec("zs_real", 0.0, 1e9, "ohm"),
    spec("zs_imag", -1e9, 1e9, "ohm"),
    spec("zl_real", 0.0, 1e9, "ohm"),
    spec("zl_imag", -1e9, 1e9, "ohm"),
];

/// Every enumerated or boolean parameter accepted by `set_parameter`.
pub const CHOICE_PARAMS: &[&str] = &[
    "power",
    "emi_filter",
    "source",
    "rectifier",
    "filter",
    "regulator",
    "modulation",
    "signal_mode",
    "pfc",
    "core_material",
    "switch_device",
];

/// Map an accepted alias to its canonical parameter name.
pub fn canonical_name(name: &str) -> String {
    let key = name.trim().to_lowercase().replace('-', "_");
    let canonical = match key.as_str() {
        "gain_db" => "gain",
        "filter_capacitance" => "capacitance",
        "filter_inductance" => "inductance",
        "active_filter_cutoff" | "filter_cutoff" => "cutoff",
        "linear_vref" => "vref",
        "switching_freq" | "fsw" => "switching_frequency",
        "power_on" => "power",
        "ambient" => "ambient_temperature",
        "filter_type" => "filter",
        "regulator_type" => "regulator",
        "rectifier_type" => "rectifier",
        "pfc_type" => "pfc",
        "noise" => "noise_level",
        "h_field" => "core_field",
        other => return other.to_string(),
    };
    canonical.to_string()
}

/// Look up the range of a numeric parameter by canonical name.
pub fn numeric_spec(name: &str) -> Option<&'static ParamSpec> {
    NUMERIC_PARAMS.iter().find(|s| s.name == name)
}

/// Check that `value` is finite and inside the range of `spec`.
pub fn check_range(spec: &ParamSpec, value: f64) -> Result<f64, ParamError> {
    if value.is_finite() && value >= spec.min && value <= spec.max {
        Ok(value)
    } else {
        Err(ParamError::out_of_range(spec.name, value, spec.min, spec.max))
    }
}

/// Parse a boolean parameter value.
pub fn parse_flag(name: &str, value: &str) -> Result<bool, ParamError> {
    match value.trim().to_lowercase().as_str() {
        "on" | "true" | "1" | "yes" | "enabled" => Ok(true),
        "off" | "false" | "0" | "no" | "disabled" => Ok(false),
        _ => Err(ParamError::invalid_choice(name, value, &["on", "off"])),
    }
}

/// Validate a configuration assembled outside `set_parameter`.
///
/// Checks:
/// - Every numeric parameter is finite and inside its range
/// - The active filter and regulator payloads are inside their ranges
pub fn validate_configuration(config: &CircuitConfiguration) -> Result<(), ParamError> {
    for spec in NUMERIC_PARAMS {
        if let Some(value) = config.numeric(spec.name) {
            check_range(spec, value)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_display_carries_unit() {
        let frequency = numeric_spec("frequency").unwrap();
        assert_eq!(frequency.to_string(), "frequency [100, 10000] Hz");
        let index = numeric_spec("modulation_index").unwrap();
        assert_eq!(index.to_string(), "modulation_index [0, 1]");
    }

    #[test]
    fn test_aliases() {
        assert_eq!(canonical_name("Linear_Vref"), "vref");
        assert_eq!(canonical_name("switching-freq"), "switching_frequency");
        assert_eq!(canonical_name("frequency"), "frequency");
    }

    #[test]
    fn test_names_are_unique() {
        for (i, a) in NUMERIC_PARAMS.iter().enumerate() {
            assert!(a.min <= a.max, "{}", a.name);
            assert!(!CHOICE_PARAMS.contains(&a.name));
            for b in &NUMERIC_PARAMS[i + 1..] {
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn test_check_range() {
        let spec = numeric_spec("frequency").unwrap();
        assert!(check_range(spec, 1000.0).is_ok());
        assert!(check_range(spec, 99.0).is_err());
        assert!(check_range(spec, f64::NAN).is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("power", "ON"), Ok(true));
        assert_eq!(parse_flag("power", "0"), Ok(false));
        assert!(parse_flag("power", "maybe").is_err());
    }

    #[test]
    fn test_default_configuration_is_valid() {
        assert!(validate_configuration(&CircuitConfiguration::default()).is_ok());
    }

    #[test]
    fn test_direct_field_edit_is_caught() {
        let mut config = CircuitConfiguration::default();
        config.load_resistance = -1.0;
        assert!(matches!(
            validate_configuration(&config),
            Err(ParamError::OutOfRange { .. })
        ));
    }
}
