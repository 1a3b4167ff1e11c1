//! # Receiver Core
//!
//! A stateful simulator of an AC-to-DC receiver signal path.
//!
//! This library provides:
//! - A parameter store for the source, rectifier, filter, regulator and
//!   modulation stages, edited by name with validated textual values
//! - Device models (diode, MOSFET/IGBT/GaN/SiC switch, BJT, op-amp), a
//!   thermal network and a Jiles-Atherton transformer core
//! - Spectral, impedance, power-factor and stability analysis of each tick
//! - Harmonic table export as CSV
//!
//! ## Architecture
//!
//! - [`circuit`] - Stage topology and the parameter store
//! - [`components`] - Device, thermal and magnetic models
//! - [`solver`] - Signal path generation and the [`Simulator`] session
//! - [`analysis`] - THD, SNR, EMI, impedance, power factor and stability
//! - [`dsl`] - Preset file parser
//! - [`export`] - CSV output
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! receiver --preset mains.preset --set gain=6 --ticks 10 --export harmonics.csv
//! ```
//!
//! ### Library
//!
//! ```no_run
//! use receiver_core::Simulator;
//!
//! let mut sim = Simulator::new();
//! sim.set_parameter("rectifier", "bridge")?;
//! sim.set_parameter("capacitance", "470u")?;
//! sim.set_parameter("power", "on")?;
//!
//! let buffer = sim.tick_window();
//! let result = sim.analyze(&buffer);
//! println!("ripple {:.3} V, THD {:.2} %", result.ripple_voltage, result.thd);
//! # Ok::<(), receiver_core::ReceiverError>(())
//! ```
//!
//! ## Signal Path
//!
//! Each tick runs the time vector through
//!
//! 1. Source (mains or tone at the input voltage)
//! 2. Transformer (turns ratio and the winding's lag)
//! 3. Rectifier (half-wave, full-wave or bridge with diode drops)
//! 4. Filter (reservoir capacitor, choke or active low-pass)
//! 5. Regulator (linear or switching, derated by junction temperature)
//! 6. Gain, modulation (AM or FM) or digital data, then the output coil
//!    and injected noise
//!
//! Filter and thermal state carry over between ticks until power is
//! switched off.

pub mod analysis;
pub mod circuit;
pub mod components;
pub mod dsl;
pub mod error;
pub mod export;
pub mod solver;

// Re-export main types for convenience
pub use analysis::AnalysisResult;
pub use circuit::CircuitConfiguration;
pub use error::{ParamError, ReceiverError, Result};
pub use solver::{Simulator, SimulatorConfig, WaveformBuffer};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmReceiverSim;

/// Thermal voltage at room temperature (approximately 26mV)
pub const THERMAL_VOLTAGE: f64 = 0.0258;

/// Default number of samples per tick window
pub const DEFAULT_SAMPLES: usize = 1000;

/// Default tick window length in seconds
pub const DEFAULT_DURATION: f64 = 0.1;
