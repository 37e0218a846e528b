/// Post-decryption instructions: a caller-supplied string bound into every
/// sealed message. This type only validates that the string is well-formed
/// JSON; the contents stay opaque and travel verbatim.
use serde_json::Value;

use crate::error::{Result, SeedSealError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsealingInstructions {
    json: String,
}

impl UnsealingInstructions {
    /// Wrap an instructions string, rejecting anything that does not parse
    /// as JSON.
    pub fn new(instructions_json: &str) -> Result<Self> {
        serde_json::from_str::<Value>(instructions_json)
            .map_err(|e| SeedSealError::JsonParsing(e.to_string()))?;
        Ok(Self {
            json: instructions_json.to_string(),
        })
    }

    /// The validated string, exactly as supplied.
    pub fn as_json(&self) -> &str {
        &self.json
    }
}
