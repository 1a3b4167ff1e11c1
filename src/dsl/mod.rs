//! Preset files: line-oriented receiver configurations.
//!
//! A preset is a list of parameter assignments applied in order through
//! [`Simulator::set_parameter`], so it accepts exactly the names and values
//! the parameter store does.
//!
//! # Grammar Overview
//!
//! ```text
//! preset      = { line }
//! line        = comment | directive | assignment | empty
//! comment     = ('#' | ';') { any_char }
//! assignment  = identifier ['='] value
//! directive   = ".power" value | ".seed" integer
//! value       = number [unit_suffix] | identifier
//!
//! number      = ['-'|'+'] digit+ ['.' digit+] [('e'|'E') ['-'|'+'] digit+]
//! unit_suffix = 'p' | 'n' | 'u' | 'm' | 'k' | 'M' | 'G'
//! identifier  = (letter | '_') { letter | digit | '_' }
//! ```
//!
//! # Example
//!
//! ```text
//! # 60 Hz mains into a bridge with a reservoir capacitor
//! .seed 7
//! source       mains
//! rectifier    bridge
//! filter       capacitive
//! capacitance  = 470u
//! regulator    switching
//! .power on
//! ```

mod ast;
mod lexer;
mod parser;

pub use ast::{Assignment, Preset};
pub use lexer::{parse_value, Lexer, Token, TokenKind};
pub use parser::Parser;

use crate::error::{ReceiverError, Result};
use crate::solver::Simulator;

/// Parse a preset string.
pub fn parse(input: &str) -> Result<Preset> {
    let lexer = Lexer::new(input);
    let mut parser = Parser::new(lexer)?;
    parser.parse()
}

/// Parse a preset file.
#[cfg(feature = "cli")]
pub fn parse_file(path: &std::path::Path) -> Result<Preset> {
    let content = std::fs::read_to_string(path).map_err(|e| ReceiverError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    parse(&content)
}

impl Preset {
    /// Apply the preset to a simulator.
    ///
    /// Assignments run in file order. The first rejected edit stops the
    /// run and is reported with its line; earlier edits stay applied.
    pub fn apply(&self, simulator: &mut Simulator) -> Result<()> {
        if let Some(seed) = self.seed {
            simulator.reseed(seed);
        }
        for a in &self.assignments {
            simulator
                .set_parameter(&a.name, &a.value)
                .map_err(|source| ReceiverError::PresetParameter {
                    line: a.line,
                    source,
                })?;
        }
        tracing::debug!(assignments = self.len(), seed = ?self.seed, "preset applied");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{ParamValue, RectifierKind};
    use crate::error::ParamError;
    use approx::assert_relative_eq;

    #[test]
    fn test_apply_preset() {
        let preset = parse(
            ".seed 7\nrectifier half_wave\ncapacitance = 470u\nfrequency 2k\n.power on\n",
        )
        .unwrap();
        let mut sim = Simulator::new();
        preset.apply(&mut sim).unwrap();

        let config = sim.configuration();
        assert!(config.power_on);
        assert_eq!(config.rectifier, RectifierKind::HalfWave);
        assert_relative_eq!(config.frequency, 2000.0);
        assert_relative_eq!(config.numeric("capacitance").unwrap(), 470e-6);
        assert_eq!(sim.settings().seed, 7);
        assert_eq!(sim.get_parameter("power").unwrap(), ParamValue::Flag(true));
    }

    #[test]
    fn test_rejected_assignment_reports_line() {
        let preset = parse("gain 3\n\nbogus 1\n").unwrap();
        let mut sim = Simulator::new();
        let err = preset.apply(&mut sim).unwrap_err();
        match err {
            ReceiverError::PresetParameter { line, source } => {
                assert_eq!(line, 3);
                assert_eq!(source, ParamError::unknown("bogus"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // Edits before the failing line stay applied
        assert_relative_eq!(sim.configuration().gain_db, 3.0);
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_missing_file() {
        let err = parse_file(std::path::Path::new("/nonexistent/receiver.preset")).unwrap_err();
        assert!(matches!(err, ReceiverError::FileReadError { .. }));
    }
}
