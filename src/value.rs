//! Config values as they travel from spreadsheet cells to the job request.

use serde::Serialize;

/// A configuration value: either a literal string or a boolean.
///
/// Serialized untagged, so `Bool(true)` becomes `true` and `Str("1")` becomes `"1"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Str(String),
}

impl ConfigValue {
    /// Build a value from raw cell text, applying boolean coercion.
    pub fn from_cell(text: &str) -> Self {
        coerce(ConfigValue::Str(text.to_string()))
    }
}

/// Turn "true"/"false" (any case) into a bool; everything else is left alone.
///
/// Only the two literal words count. "1", "yes" and "t" stay strings, which is
/// what lets a default like `{1,true}` keep its `"1"`.
pub fn coerce(value: ConfigValue) -> ConfigValue {
    match value {
        ConfigValue::Str(s) => match s.to_ascii_lowercase().as_str() {
            "true" => ConfigValue::Bool(true),
            "false" => ConfigValue::Bool(false),
            _ => ConfigValue::Str(s),
        },
        b @ ConfigValue::Bool(_) => b,
    }
}
