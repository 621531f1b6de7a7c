//! Instrument descriptor as the terminal reports it.

use serde::{Deserialize, Serialize};

/// One tradable symbol known to the terminal.
///
/// `name` is unique within a terminal; the remaining fields are informational.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Group path inside the terminal, e.g. `Forex\Majors\EURUSD`.
    #[serde(default)]
    pub path: String,
    /// Price precision in decimal places.
    #[serde(default)]
    pub digits: u32,
}

impl SymbolInfo {
    /// Descriptor carrying only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            path: String::new(),
            digits: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }
}
