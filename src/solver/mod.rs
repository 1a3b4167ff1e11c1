//! Time-domain engine of the receiver.
//!
//! A tick runs the stages of [`stages`] in order over one time vector:
//!
//! ```text
//! source -> transformer -> rectifier -> filter -> regulator
//!        -> modulation -> PFC shaping -> output coil -> noise
//! ```
//!
//! Integrating stages read and update the [`IntegratorState`], so each tick
//! continues where the previous one ended. The [`Simulator`] owns that state
//! together with the configuration and the noise source.

pub mod generator;
mod noise;
pub mod stages;
mod simulator;
mod state;

pub use generator::{generate, WaveformBuffer};
pub use noise::{NoiseSource, DEFAULT_SEED};
pub use simulator::{Simulator, SimulatorConfig};
pub use state::IntegratorState;
