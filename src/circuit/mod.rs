//! Receiver configuration: stage topology and component values.
//!
//! [`CircuitConfiguration`] is the parameter store read by every stage of
//! the simulator. It is edited through [`CircuitConfiguration::set_parameter`],
//! which validates the value against [`NUMERIC_PARAMS`] before applying it.

mod config;
mod types;
mod validate;

pub use config::{CircuitConfiguration, ParamValue};
pub use types::*;
pub use validate::{
    canonical_name, numeric_spec, validate_configuration, ParamSpec, CHOICE_PARAMS,
    NUMERIC_PARAMS,
};
