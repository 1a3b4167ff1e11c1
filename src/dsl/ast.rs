//! Syntax tree of a parsed preset.

/// Complete representation of a parsed preset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Preset {
    /// Parameter assignments in file order
    pub assignments: Vec<Assignment>,
    /// Noise seed from `.seed`, if given
    pub seed: Option<u64>,
}

impl Preset {
    /// Create an empty preset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of assignments.
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    /// True if the preset assigns nothing.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Last value assigned to `name`, if any.
    pub fn value_of(&self, name: &str) -> Option<&str> {
        self.assignments
            .iter()
            .rev()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }
}

/// One `name value` line.
///
/// The value is kept as text. Numbers, SI suffixes and choices are
/// resolved by the parameter store when the preset is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    /// Parameter name as written
    pub name: String,
    /// Value as written
    pub value: String,
    /// Source line number for error reporting
    pub line: usize,
}
