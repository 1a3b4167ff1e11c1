//! Receiver - AC-to-DC receiver signal-path simulator
//!
//! Runs a number of ticks against a configuration built from an optional
//! preset file and command-line overrides, then prints the metrics of the
//! last tick.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=receiver_core=debug receiver --preset mains.preset --set regulator=switching --ticks 5 --export harmonics.csv
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use receiver_core::{
    circuit::{CHOICE_PARAMS, NUMERIC_PARAMS},
    dsl,
    error::{ReceiverError, Result},
    export, AnalysisResult, Simulator, SimulatorConfig, DEFAULT_DURATION, DEFAULT_SAMPLES,
};

/// AC-to-DC receiver signal-path simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Preset file applied before any --set override
    #[arg(short, long, value_name = "PRESET_FILE")]
    preset: Option<PathBuf>,

    /// Parameter override, may be repeated (e.g. --set capacitance=470u)
    #[arg(short, long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
    set: Vec<(String, String)>,

    /// Number of ticks to run
    #[arg(short, long, default_value_t = 1)]
    ticks: usize,

    /// Samples per tick
    #[arg(long, default_value_t = DEFAULT_SAMPLES)]
    samples: usize,

    /// Tick window length in seconds
    #[arg(long, default_value_t = DEFAULT_DURATION)]
    duration: f64,

    /// Noise seed (overrides the preset's .seed)
    #[arg(long)]
    seed: Option<u64>,

    /// Let frequency and gain drift slowly between ticks
    #[arg(long)]
    drift: bool,

    /// Write the harmonic table of the last tick as CSV
    #[arg(short, long, value_name = "CSV_FILE")]
    export: Option<PathBuf>,

    /// Write the waveforms of the last tick as CSV
    #[arg(short, long, value_name = "CSV_FILE")]
    waveform: Option<PathBuf>,

    /// Print every parameter with its accepted range and unit, then exit
    #[arg(long)]
    list_params: bool,
}

fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if args.list_params {
        for spec in NUMERIC_PARAMS {
            println!("{}", spec);
        }
        for name in CHOICE_PARAMS {
            println!("{}", name);
        }
        return Ok(());
    }

    let settings = SimulatorConfig::new()
        .with_samples(args.samples)
        .with_duration(args.duration);
    let mut simulator = Simulator::with_config(settings)?;

    if let Some(path) = &args.preset {
        dsl::parse_file(path)?.apply(&mut simulator)?;
    }
    for (name, value) in &args.set {
        simulator.set_parameter(name, value)?;
    }
    if let Some(seed) = args.seed {
        simulator.reseed(seed);
    }

    if args.ticks == 0 {
        return Err(ReceiverError::invalid_simulation("at least one tick is required"));
    }

    let mut last = None;
    for i in 0..args.ticks {
        if args.drift {
            simulator.apply_drift(i as f64 * args.duration);
        }
        let buffer = simulator.tick_window();
        let result = simulator.analyze(&buffer);
        last = Some((buffer, result));
    }
    let Some((buffer, result)) = last else {
        return Ok(());
    };

    print_metrics(&result);

    if let Some(path) = &args.export {
        let mut writer = BufWriter::new(File::create(path)?);
        export::write_harmonics_csv(&result, &mut writer)?;
        writer.flush()?;
    }
    if let Some(path) = &args.waveform {
        let mut writer = BufWriter::new(File::create(path)?);
        export::write_waveform_csv(&buffer, &mut writer)?;
        writer.flush()?;
    }

    Ok(())
}

fn print_metrics(r: &AnalysisResult) {
    let margin = |v: Option<f64>, unit: &str| match v {
        Some(v) => format!("{:.2} {}", v, unit),
        None => "n/a".to_string(),
    };

    println!("ripple          {:.4} V", r.ripple_voltage);
    println!("average         {:.4} V", r.average_voltage);
    println!("power           {:.4} W", r.power);
    println!("thd             {:.2} %", r.thd);
    println!("thd+n           {:.2} %", r.thd_plus_n);
    println!("snr             {:.2} dB", r.snr_db);
    println!("noise floor     {:.2} dB", r.noise_floor_db);
    println!("emi conducted   {:.2} dBuV", r.emi.conducted_dbuv);
    println!("emi radiated    {:.2} dBuV", r.emi.radiated_dbuv);
    println!("phase           {:.2} deg", r.phase_deg);
    println!("temperature     {:.2} C", r.temperature);
    println!("efficiency      {:.2} %", r.efficiency * 100.0);
    println!("power factor    {:.3}", r.power_factor);
    println!("duty cycle      {:.3}", r.duty_cycle);
    println!("core saturation {:.2} %", r.core_saturation);
    println!(
        "input port      |G| {:.3}  VSWR {:.2}  RL {:.2} dB",
        r.input_port.gamma_magnitude(),
        r.input_port.vswr,
        r.input_port.return_loss_db
    );
    println!(
        "output port     |G| {:.3}  VSWR {:.2}  RL {:.2} dB",
        r.output_port.gamma_magnitude(),
        r.output_port.vswr,
        r.output_port.return_loss_db
    );
    println!("gain margin     {}", margin(r.gain_margin_db, "dB"));
    println!("phase margin    {}", margin(r.phase_margin_deg, "deg"));
}
