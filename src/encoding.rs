/// Hex and JSON access helpers shared by every serialized object.
///
/// Hex is emitted lowercase without a prefix; parsers additionally accept
/// an optional `0x`/`0X` prefix and mixed case. JSON field access goes
/// through typed getters so every wrong-typed field surfaces as the same
/// error kind regardless of which object was being parsed.
use serde_json::{Map, Value};

use crate::error::{Result, SeedSealError};

/// Encode bytes as lowercase hex without a prefix.
pub fn to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Decode a hex string, tolerating a `0x` prefix and mixed case.
///
/// Odd-length input and non-hex characters both fail.
pub fn from_hex(hex_str: &str) -> Result<Vec<u8>> {
    let digits = hex_str
        .strip_prefix("0x")
        .or_else(|| hex_str.strip_prefix("0X"))
        .unwrap_or(hex_str);
    hex::decode(digits).map_err(|_| SeedSealError::InvalidHexCharacter)
}

/// Parse a string as a JSON object, rejecting any other top-level value.
pub fn parse_json_object(json: &str) -> Result<Map<String, Value>> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| SeedSealError::JsonParsing(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(SeedSealError::JsonParsing(
            "expected a JSON object".to_string(),
        )),
    }
}

/// Read an optional string field, failing if present with any other type.
pub fn optional_string_field<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a str>> {
    match object.get(field) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(_) => Err(SeedSealError::InvalidDerivationOptionValueType(field)),
    }
}

/// Read an optional positive-integer field, failing on any other JSON type,
/// on fractional values, and on values < 1.
pub fn optional_positive_integer_field(
    object: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<u64>> {
    match object.get(field) {
        None => Ok(None),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(v) if v > 0 => Ok(Some(v)),
            _ => Err(SeedSealError::InvalidDerivationOptionValueType(field)),
        },
        Some(_) => Err(SeedSealError::InvalidDerivationOptionValueType(field)),
    }
}
