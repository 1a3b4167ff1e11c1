//! Error types for the receiver simulator.
//!
//! [`ReceiverError`] is the unified error for preset parsing, export and
//! simulation setup. Parameter edits report the narrower [`ParamError`],
//! which converts into [`ReceiverError`] so callers can use `?` on both.

use thiserror::Error;

/// Result type alias using [`ReceiverError`].
pub type Result<T> = std::result::Result<T, ReceiverError>;

/// Rejected parameter edit. The previous value is always retained.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParamError {
    /// No parameter with this name exists
    #[error("Unknown parameter '{name}'")]
    UnknownParameter { name: String },

    /// Value could not be parsed as a number
    #[error("Invalid numeric value '{value}' for parameter '{name}'")]
    InvalidNumber { name: String, value: String },

    /// Value parsed but lies outside the accepted range
    #[error("Value {value} for parameter '{name}' is outside [{min}, {max}]")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Value is not one of the accepted choices
    #[error("Invalid choice '{value}' for parameter '{name}' (expected one of: {expected})")]
    InvalidChoice {
        name: String,
        value: String,
        expected: String,
    },
}

impl ParamError {
    /// Create an unknown parameter error
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownParameter { name: name.into() }
    }

    /// Create an out-of-range error
    pub fn out_of_range(name: impl Into<String>, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            name: name.into(),
            value,
            min,
            max,
        }
    }

    /// Create an invalid choice error
    pub fn invalid_choice(
        name: impl Into<String>,
        value: impl Into<String>,
        expected: &[&str],
    ) -> Self {
        Self::InvalidChoice {
            name: name.into(),
            value: value.into(),
            expected: expected.join(", "),
        }
    }
}

/// Unified error type for all receiver operations.
#[derive(Error, Debug)]
pub enum ReceiverError {
    // ============ Preset Parsing Errors ============
    /// Error during lexical analysis
    #[error("Lexer error at line {line}, column {column}: {message}")]
    LexerError {
        line: usize,
        column: usize,
        message: String,
    },

    /// Error during parsing
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    /// A preset assignment was rejected by the parameter store
    #[error("Preset line {line}: {source}")]
    PresetParameter {
        line: usize,
        #[source]
        source: ParamError,
    },

    // ============ Parameter Errors ============
    /// Rejected parameter edit
    #[error(transparent)]
    Parameter(#[from] ParamError),

    // ============ Simulation Errors ============
    /// Invalid simulation setup (sample count, window length, ...)
    #[error("Invalid simulation parameter: {message}")]
    InvalidSimulationParam { message: String },

    // ============ I/O Errors ============
    /// Error reading a preset file
    #[error("Failed to read preset file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Error writing exported data
    #[error("Export failed: {0}")]
    ExportError(#[from] std::io::Error),

    // ============ WASM Errors ============
    /// WASM-specific error
    #[cfg(feature = "wasm")]
    #[error("WASM error: {message}")]
    WasmError { message: String },
}

impl ReceiverError {
    /// Create a lexer error
    pub fn lexer(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self::LexerError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::ParseError {
            line,
            message: message.into(),
        }
    }

    /// Create an invalid simulation parameter error
    pub fn invalid_simulation(message: impl Into<String>) -> Self {
        Self::InvalidSimulationParam {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_error_converts() {
        let err: ReceiverError = ParamError::unknown("bogus").into();
        assert!(matches!(err, ReceiverError::Parameter(_)));
        assert_eq!(err.to_string(), "Unknown parameter 'bogus'");
    }

    #[test]
    fn test_invalid_choice_lists_options() {
        let err = ParamError::invalid_choice("rectifier", "quad", &["half", "full", "bridge"]);
        assert!(err.to_string().contains("half, full, bridge"));
    }
}
