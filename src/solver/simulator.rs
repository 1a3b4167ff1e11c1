//! Main simulator interface.

use crate::analysis::{self, stability, AnalysisOptions, AnalysisResult, StabilityReport};
use crate::circuit::{canonical_name, validate_configuration, CircuitConfiguration, ParamValue};
use crate::error::{ParamError, ReceiverError, Result};

use super::generator::{self, WaveformBuffer};
use super::noise::{NoiseSource, DEFAULT_SEED};
use super::state::IntegratorState;

/// Frequency drift range (fraction of the base frequency).
const DRIFT_FREQUENCY_DEPTH: f64 = 0.1;
/// Frequency drift rate (rad/s of elapsed time).
const DRIFT_FREQUENCY_RATE: f64 = 0.1;
/// Gain drift range (dB).
const DRIFT_GAIN_DEPTH: f64 = 5.0;
/// Gain drift rate (rad/s of elapsed time).
const DRIFT_GAIN_RATE: f64 = 0.05;

/// Configuration for the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// Samples per tick window.
    pub samples: usize,
    /// Length of a tick window (s).
    pub duration: f64,
    /// Seed of the noise source.
    pub seed: u64,
    /// Highest harmonic included in THD and the harmonic table.
    pub harmonics: usize,
    /// Frequency points of the Bode sweep.
    pub bode_points: usize,
    /// Gain steps of the root locus.
    pub locus_gains: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            samples: crate::DEFAULT_SAMPLES,
            duration: crate::DEFAULT_DURATION,
            seed: DEFAULT_SEED,
            harmonics: analysis::distortion::DEFAULT_HARMONICS,
            bode_points: stability::DEFAULT_BODE_POINTS,
            locus_gains: stability::DEFAULT_LOCUS_GAINS,
        }
    }
}

impl SimulatorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of samples per tick window.
    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    /// Set the tick window length (in seconds).
    ///
    /// Together with the sample count this fixes the sampling rate, which
    /// bounds the highest frequency the analyzers can resolve.
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    /// Set the noise seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the highest harmonic analyzed.
    pub fn with_harmonics(mut self, harmonics: usize) -> Self {
        self.harmonics = harmonics;
        self
    }

    /// Set the Bode and root-locus resolution.
    pub fn with_stability_resolution(mut self, bode_points: usize, locus_gains: usize) -> Self {
        self.bode_points = bode_points;
        self.locus_gains = locus_gains;
        self
    }

    fn check(&self) -> Result<()> {
        if self.samples < 2 {
            return Err(ReceiverError::invalid_simulation(format!(
                "at least 2 samples per window required, got {}",
                self.samples
            )));
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(ReceiverError::invalid_simulation(format!(
                "window duration must be positive, got {}",
                self.duration
            )));
        }
        if self.harmonics < 2 {
            return Err(ReceiverError::invalid_simulation(
                "harmonic count must be at least 2",
            ));
        }
        Ok(())
    }

    fn analysis_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            harmonics: self.harmonics,
            bode_points: self.bode_points,
        }
    }
}

/// A receiver simulation session.
///
/// Owns the configuration, the integrator state and the noise source.
/// Ticks take `&mut self`, so they are serialized.
pub struct Simulator {
    /// Parameter store
    config: CircuitConfiguration,
    /// State carried across ticks
    state: IntegratorState,
    /// Injected and analysis noise
    noise: NoiseSource,
    /// Session settings
    settings: SimulatorConfig,
    /// Start time of the next window from [`Simulator::tick_window`]
    elapsed: f64,
    /// Frequency the drift oscillates around
    base_frequency: f64,
    /// Gain the drift oscillates around
    base_gain: f64,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    /// Create a simulator with the default configuration.
    pub fn new() -> Self {
        Self::build(CircuitConfiguration::default(), SimulatorConfig::default())
    }

    /// Create a simulator with custom session settings.
    pub fn with_config(settings: SimulatorConfig) -> Result<Self> {
        settings.check()?;
        Ok(Self::build(CircuitConfiguration::default(), settings))
    }

    /// Create a simulator for an existing receiver configuration.
    pub fn with_configuration(
        config: CircuitConfiguration,
        settings: SimulatorConfig,
    ) -> Result<Self> {
        settings.check()?;
        validate_configuration(&config)?;
        Ok(Self::build(config, settings))
    }

    fn build(config: CircuitConfiguration, settings: SimulatorConfig) -> Self {
        let state = IntegratorState::at_rest(&config);
        let noise = NoiseSource::new(settings.seed);
        Self {
            base_frequency: config.frequency,
            base_gain: config.gain_db,
            config,
            state,
            noise,
            settings,
            elapsed: 0.0,
        }
    }

    /// Update one parameter. A rejected edit leaves the configuration as it was.
    pub fn set_parameter(&mut self, name: &str, value: &str) -> std::result::Result<(), ParamError> {
        if let Err(e) = self.config.set_parameter(name, value) {
            tracing::warn!(parameter = name, value, error = %e, "parameter rejected");
            return Err(e);
        }
        match canonical_name(name).as_str() {
            "frequency" => self.base_frequency = self.config.frequency,
            "gain" => self.base_gain = self.config.gain_db,
            _ => {}
        }
        tracing::debug!(parameter = name, value, "parameter set");
        Ok(())
    }

    /// Read one parameter.
    pub fn get_parameter(&self, name: &str) -> std::result::Result<ParamValue, ParamError> {
        self.config.get_parameter(name)
    }

    /// Current receiver configuration.
    pub fn configuration(&self) -> &CircuitConfiguration {
        &self.config
    }

    /// Session settings.
    pub fn settings(&self) -> &SimulatorConfig {
        &self.settings
    }

    /// Restart the noise source from a seed.
    pub fn reseed(&mut self, seed: u64) {
        self.settings.seed = seed;
        self.noise = NoiseSource::new(seed);
    }

    /// Run the signal path over an explicit time vector.
    pub fn tick(&mut self, time: &[f64]) -> WaveformBuffer {
        generator::generate(&self.config, &mut self.state, time, &mut self.noise)
    }

    /// Run the signal path over the next window of the session clock.
    pub fn tick_window(&mut self) -> WaveformBuffer {
        let time = self.time_vector(self.elapsed);
        self.elapsed += self.settings.duration;
        self.tick(&time)
    }

    /// Evenly spaced window of `samples` points starting at `start`.
    pub fn time_vector(&self, start: f64) -> Vec<f64> {
        let dt = self.settings.duration / self.settings.samples as f64;
        (0..self.settings.samples)
            .map(|i| start + i as f64 * dt)
            .collect()
    }

    /// Compute metrics for a buffer produced by this session.
    pub fn analyze(&mut self, buffer: &WaveformBuffer) -> AnalysisResult {
        analysis::analyze_with(
            buffer,
            buffer.sampling_rate(),
            &self.config,
            &mut self.noise,
            &self.settings.analysis_options(),
        )
    }

    /// Bode, Nyquist, margins and root locus of the current filter/regulator.
    pub fn stability(&self) -> StabilityReport {
        stability::analyze_stability(
            &self.config,
            self.settings.bode_points,
            self.settings.locus_gains,
        )
    }

    /// Recorded (H, B) points of the transformer core, oldest first.
    pub fn hysteresis_loop(&self) -> Vec<(f64, f64)> {
        self.state.core.history().collect()
    }

    /// Dynamic mode: let frequency and gain wander slowly around the values
    /// last set by the user.
    pub fn apply_drift(&mut self, elapsed: f64) {
        let f = self.base_frequency
            + DRIFT_FREQUENCY_DEPTH * self.base_frequency * (DRIFT_FREQUENCY_RATE * elapsed).sin();
        let g = self.base_gain + DRIFT_GAIN_DEPTH * (DRIFT_GAIN_RATE * elapsed).sin();
        self.config.frequency = f.clamp(100.0, 10_000.0);
        self.config.gain_db = g.clamp(-20.0, 20.0);
    }
}
