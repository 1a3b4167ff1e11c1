//! Results output formatting (CSV).

use std::io::Write;

use crate::analysis::AnalysisResult;
use crate::error::Result;
use crate::solver::WaveformBuffer;

/// Write the harmonic table as CSV.
///
/// Format:
/// ```csv
/// THD+N (%),1.23
/// Harmonic,Amplitude (V),Power Contribution (%)
/// 1,0.5000,0.00
/// 2,0.0100,80.00
/// ```
pub fn write_harmonics_csv<W: Write>(result: &AnalysisResult, writer: &mut W) -> Result<()> {
    writeln!(writer, "THD+N (%),{:.2}", result.thd_plus_n)?;
    writeln!(writer, "Harmonic,Amplitude (V),Power Contribution (%)")?;
    for row in &result.harmonics {
        writeln!(
            writer,
            "{},{:.4},{:.2}",
            row.index, row.amplitude, row.power_percent
        )?;
    }
    Ok(())
}

/// Write every waveform of a tick as CSV, one row per sample.
pub fn write_waveform_csv<W: Write>(buffer: &WaveformBuffer, writer: &mut W) -> Result<()> {
    writeln!(
        writer,
        "time,source,transformed,rectified,filtered,regulated,output,noisy_output,input_current"
    )?;
    for i in 0..buffer.len() {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{}",
            buffer.time[i],
            buffer.source[i],
            buffer.transformed[i],
            buffer.rectified[i],
            buffer.filtered[i],
            buffer.regulated[i],
            buffer.output[i],
            buffer.noisy_output[i],
            buffer.input_current[i]
        )?;
    }
    Ok(())
}
