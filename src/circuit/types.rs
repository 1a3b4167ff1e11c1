//! Stage selection types for the receiver signal path.
//!
//! Every stage with a choice of topology is a tagged enum. Variants that
//! need a component value carry it, so exactly one filter and one regulator
//! are active at any time.

use std::fmt;

/// AC source feeding the transformer primary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    /// Mains sine at the configured RMS voltage and line frequency
    #[default]
    Mains,
    /// Test sine at the carrier frequency, same amplitude as mains
    TestTone,
}

impl SourceKind {
    /// Accepted spellings, for error messages.
    pub const CHOICES: &'static [&'static str] = &["mains", "tone"];

    /// Parse source kind from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mains" | "line" | "ac" => Some(Self::Mains),
            "tone" | "test" | "test_tone" => Some(Self::TestTone),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mains => "mains",
            Self::TestTone => "tone",
        }
    }
}

/// Rectifier topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RectifierKind {
    /// Single diode, passes the positive half-cycle
    HalfWave,
    /// Centre-tapped full-wave, no modeled drop
    FullWave,
    /// Four-diode bridge, two diode drops in the conduction path
    #[default]
    Bridge,
}

impl RectifierKind {
    /// Accepted spellings, for error messages.
    pub const CHOICES: &'static [&'static str] = &["half_wave", "full_wave", "bridge"];

    /// Parse rectifier kind from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "half_wave" | "half" => Some(Self::HalfWave),
            "full_wave" | "full" => Some(Self::FullWave),
            "bridge" => Some(Self::Bridge),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HalfWave => "half_wave",
            Self::FullWave => "full_wave",
            Self::Bridge => "bridge",
        }
    }

    /// Number of diodes in series with the load during conduction.
    pub fn diodes_in_path(&self) -> usize {
        match self {
            Self::HalfWave | Self::FullWave => 1,
            Self::Bridge => 2,
        }
    }
}

/// Smoothing filter with its defining component value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterKind {
    /// Reservoir capacitor (farads)
    Capacitive { capacitance: f64 },
    /// Series choke (henries)
    Inductive { inductance: f64 },
    /// Op-amp single-pole low-pass (cutoff in Hz)
    Active { cutoff: f64 },
}

impl Default for FilterKind {
    fn default() -> Self {
        Self::Capacitive {
            capacitance: 100e-6,
        }
    }
}

impl FilterKind {
    /// Accepted spellings, for error messages.
    pub const CHOICES: &'static [&'static str] = &["capacitive", "inductive", "active"];

    /// Canonical name of the variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Capacitive { .. } => "capacitive",
            Self::Inductive { .. } => "inductive",
            Self::Active { .. } => "active",
        }
    }
}

/// Voltage regulator stage.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RegulatorKind {
    /// Filter output passes straight through
    #[default]
    None,
    /// Series-pass regulator clamping to `vref`
    Linear { vref: f64 },
    /// Buck converter switching at `frequency`, duty chosen to reach `vref`
    Switching { frequency: f64, vref: f64 },
}

impl RegulatorKind {
    /// Accepted spellings, for error messages.
    pub const CHOICES: &'static [&'static str] = &["none", "linear", "switching"];

    /// Canonical name of the variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Linear { .. } => "linear",
            Self::Switching { .. } => "switching",
        }
    }

    /// Switching frequency, if this is a switching regulator.
    pub fn switching_frequency(&self) -> Option<f64> {
        match self {
            Self::Switching { frequency, .. } => Some(*frequency),
            _ => None,
        }
    }
}

/// Carrier modulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modulation {
    /// Plain carrier
    None,
    /// Amplitude modulation by a 100 Hz tone
    #[default]
    Am,
    /// Frequency modulation by a 100 Hz tone
    Fm,
}

impl Modulation {
    /// Accepted spellings, for error messages.
    pub const CHOICES: &'static [&'static str] = &["none", "am", "fm"];

    /// Parse modulation from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "none" | "off" | "cw" => Some(Self::None),
            "am" => Some(Self::Am),
            "fm" => Some(Self::Fm),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Am => "am",
            Self::Fm => "fm",
        }
    }
}

/// How the output is built from the regulated rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalMode {
    /// Modulated carrier
    #[default]
    Analog,
    /// Two-level data signal switched by the output MOSFET
    Digital,
    /// Carrier plus square-wave data
    Mixed,
}

impl SignalMode {
    /// Accepted spellings, for error messages.
    pub const CHOICES: &'static [&'static str] = &["analog", "digital", "mixed"];

    /// Parse signal mode from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "analog" => Some(Self::Analog),
            "digital" => Some(Self::Digital),
            "mixed" => Some(Self::Mixed),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analog => "analog",
            Self::Digital => "digital",
            Self::Mixed => "mixed",
        }
    }
}

/// Power-factor correction scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PfcKind {
    /// No correction
    #[default]
    None,
    /// Boost converter forcing current to follow the line voltage
    ActiveBoost,
    /// LC network partially cancelling the phase lag
    Passive,
}

impl PfcKind {
    /// Accepted spellings, for error messages.
    pub const CHOICES: &'static [&'static str] = &["none", "active_boost", "passive"];

    /// Parse PFC kind from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "none" | "off" => Some(Self::None),
            "active_boost" | "active" | "boost" => Some(Self::ActiveBoost),
            "passive" => Some(Self::Passive),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ActiveBoost => "active_boost",
            Self::Passive => "passive",
        }
    }

    /// Multiplicative efficiency penalty of the correction stage.
    pub fn efficiency_factor(&self) -> f64 {
        match self {
            Self::None => 1.0,
            Self::ActiveBoost => 0.98,
            Self::Passive => 0.995,
        }
    }

    /// Check if any correction is applied.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Transformer core material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoreMaterial {
    /// MnZn ferrite, low saturation, high permeability
    #[default]
    Ferrite,
    /// Distributed-gap iron powder
    IronPowder,
    /// Laminated silicon steel
    SiliconSteel,
}

impl CoreMaterial {
    /// Accepted spellings, for error messages.
    pub const CHOICES: &'static [&'static str] = &["ferrite", "iron_powder", "silicon_steel"];

    /// Parse core material from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "ferrite" => Some(Self::Ferrite),
            "iron_powder" | "iron" => Some(Self::IronPowder),
            "silicon_steel" | "steel" => Some(Self::SiliconSteel),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ferrite => "ferrite",
            Self::IronPowder => "iron_powder",
            Self::SiliconSteel => "silicon_steel",
        }
    }
}

macro_rules! impl_display_as_str {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.as_str())
            }
        })*
    };
}

impl_display_as_str!(
    SourceKind,
    RectifierKind,
    FilterKind,
    RegulatorKind,
    Modulation,
    SignalMode,
    PfcKind,
    CoreMaterial
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(RectifierKind::from_str("half-wave"), Some(RectifierKind::HalfWave));
        assert_eq!(PfcKind::from_str("Active"), Some(PfcKind::ActiveBoost));
        assert_eq!(CoreMaterial::from_str("Silicon Steel"), Some(CoreMaterial::SiliconSteel));
        assert_eq!(Modulation::from_str("qam"), None);
    }

    #[test]
    fn test_display_round_trips() {
        for kind in [RectifierKind::HalfWave, RectifierKind::FullWave, RectifierKind::Bridge] {
            assert_eq!(RectifierKind::from_str(&kind.to_string()), Some(kind));
        }
        for mode in [SignalMode::Analog, SignalMode::Digital, SignalMode::Mixed] {
            assert_eq!(SignalMode::from_str(&mode.to_string()), Some(mode));
        }
    }

    #[test]
    fn test_pfc_efficiency_penalty() {
        assert_eq!(PfcKind::None.efficiency_factor(), 1.0);
        assert!(PfcKind::ActiveBoost.efficiency_factor() < PfcKind::Passive.efficiency_factor());
    }
}
