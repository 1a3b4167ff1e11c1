//! WASM bindings for Receiver Core.
//!
//! JavaScript-friendly wrapper around [`Simulator`] for driving the
//! receiver from a browser UI.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmReceiverSim } from 'receiver_core';
//!
//! await init();
//!
//! const sim = new WasmReceiverSim(1000, 0.1, 42);
//! sim.set_parameter('rectifier', 'bridge');
//! sim.set_parameter('power', 'on');
//!
//! sim.tick();
//! console.log(sim.ripple_voltage, sim.thd, sim.power_factor);
//! const output = sim.output();
//! ```

use wasm_bindgen::prelude::*;

use crate::analysis::AnalysisResult;
use crate::dsl;
use crate::error::ReceiverError;
use crate::export;
use crate::solver::{Simulator, SimulatorConfig, WaveformBuffer};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-compatible receiver simulator.
///
/// Keeps the buffer and metrics of the last tick so the UI can read them
/// field by field.
#[wasm_bindgen]
pub struct WasmReceiverSim {
    simulator: Simulator,
    buffer: Option<WaveformBuffer>,
    result: Option<AnalysisResult>,
}

impl WasmReceiverSim {
    fn metric(&self, f: impl Fn(&AnalysisResult) -> f64) -> f64 {
        self.result.as_ref().map(f).unwrap_or(0.0)
    }

    fn waveform(&self, f: impl Fn(&WaveformBuffer) -> &[f64]) -> Vec<f64> {
        self.buffer.as_ref().map(|b| f(b).to_vec()).unwrap_or_default()
    }
}

#[wasm_bindgen]
impl WasmReceiverSim {
    /// Create a simulator.
    ///
    /// # Arguments
    /// * `samples` - Samples per tick (default 1000)
    /// * `duration` - Tick window length in seconds (default 0.1)
    /// * `seed` - Noise seed
    #[wasm_bindgen(constructor)]
    pub fn new(samples: usize, duration: f64, seed: u64) -> Result<WasmReceiverSim, JsValue> {
        let settings = SimulatorConfig::new()
            .with_samples(samples)
            .with_duration(duration)
            .with_seed(seed);
        let simulator = Simulator::with_config(settings).map_err(js_error)?;
        Ok(Self {
            simulator,
            buffer: None,
            result: None,
        })
    }

    /// Update one parameter. Throws with the reason if the value is rejected.
    #[wasm_bindgen]
    pub fn set_parameter(&mut self, name: &str, value: &str) -> Result<(), JsValue> {
        self.simulator.set_parameter(name, value).map_err(js_error)
    }

    /// Read one parameter back as text.
    #[wasm_bindgen]
    pub fn get_parameter(&self, name: &str) -> Result<String, JsValue> {
        self.simulator
            .get_parameter(name)
            .map(|v| v.to_string())
            .map_err(js_error)
    }

    /// Apply a preset given as text.
    #[wasm_bindgen]
    pub fn load_preset(&mut self, preset: &str) -> Result<(), JsValue> {
        dsl::parse(preset)
            .and_then(|p| p.apply(&mut self.simulator))
            .map_err(js_error)
    }

    /// Run the next window and analyze it.
    #[wasm_bindgen]
    pub fn tick(&mut self) {
        let buffer = self.simulator.tick_window();
        self.result = Some(self.simulator.analyze(&buffer));
        self.buffer = Some(buffer);
    }

    /// Dynamic mode: drift frequency and gain for the given elapsed time.
    #[wasm_bindgen]
    pub fn apply_drift(&mut self, elapsed: f64) {
        self.simulator.apply_drift(elapsed);
    }

    /// Time axis of the last tick.
    #[wasm_bindgen]
    pub fn time(&self) -> Vec<f64> {
        self.waveform(|b| b.time.as_slice())
    }

    /// Clean output of the last tick.
    #[wasm_bindgen]
    pub fn output(&self) -> Vec<f64> {
        self.waveform(|b| b.output.as_slice())
    }

    /// Output with injected noise.
    #[wasm_bindgen]
    pub fn noisy_output(&self) -> Vec<f64> {
        self.waveform(|b| b.noisy_output.as_slice())
    }

    /// Regulated DC of the last tick.
    #[wasm_bindgen]
    pub fn regulated(&self) -> Vec<f64> {
        self.waveform(|b| b.regulated.as_slice())
    }

    /// Ripple voltage (V).
    #[wasm_bindgen(getter)]
    pub fn ripple_voltage(&self) -> f64 {
        self.metric(|r| r.ripple_voltage)
    }

    /// Average regulated voltage (V).
    #[wasm_bindgen(getter)]
    pub fn average_voltage(&self) -> f64 {
        self.metric(|r| r.average_voltage)
    }

    /// THD (%).
    #[wasm_bindgen(getter)]
    pub fn thd(&self) -> f64 {
        self.metric(|r| r.thd)
    }

    /// THD+N (%).
    #[wasm_bindgen(getter)]
    pub fn thd_plus_n(&self) -> f64 {
        self.metric(|r| r.thd_plus_n)
    }

    /// SNR (dB).
    #[wasm_bindgen(getter)]
    pub fn snr_db(&self) -> f64 {
        self.metric(|r| r.snr_db)
    }

    /// Conducted emissions (dBuV).
    #[wasm_bindgen(getter)]
    pub fn emi_conducted(&self) -> f64 {
        self.metric(|r| r.emi.conducted_dbuv)
    }

    /// Radiated emissions (dBuV).
    #[wasm_bindgen(getter)]
    pub fn emi_radiated(&self) -> f64 {
        self.metric(|r| r.emi.radiated_dbuv)
    }

    /// System temperature (°C).
    #[wasm_bindgen(getter)]
    pub fn temperature(&self) -> f64 {
        self.metric(|r| r.temperature)
    }

    /// Efficiency in [0, 1].
    #[wasm_bindgen(getter)]
    pub fn efficiency(&self) -> f64 {
        self.metric(|r| r.efficiency)
    }

    /// Power factor in [0, 1].
    #[wasm_bindgen(getter)]
    pub fn power_factor(&self) -> f64 {
        self.metric(|r| r.power_factor)
    }

    /// Input VSWR.
    #[wasm_bindgen(getter)]
    pub fn input_vswr(&self) -> f64 {
        self.metric(|r| r.input_port.vswr)
    }

    /// Phase margin (degrees), NaN if there is no gain crossover.
    #[wasm_bindgen(getter)]
    pub fn phase_margin(&self) -> f64 {
        self.result
            .as_ref()
            .and_then(|r| r.phase_margin_deg)
            .unwrap_or(f64::NAN)
    }

    /// Harmonic table of the last tick as CSV.
    #[wasm_bindgen]
    pub fn harmonics_csv(&self) -> Result<String, JsValue> {
        let result = self
            .result
            .as_ref()
            .ok_or_else(|| {
                js_error(ReceiverError::WasmError {
                    message: "no tick has been run".to_string(),
                })
            })?;
        let mut out = Vec::new();
        export::write_harmonics_csv(result, &mut out).map_err(js_error)?;
        String::from_utf8(out).map_err(js_error)
    }
}
