/// A derived secret: raw bytes plus the options document that produced
/// them. The simplest of the derived objects — no operations beyond
/// serialization.
use serde::{Deserialize, Serialize};

use crate::derivation::generate_seed;
use crate::error::{Result, SeedSealError};
use crate::options::KeyType;
use crate::sensitive::SecretBuffer;

/// Default length of a derived secret when the options document does not
/// say otherwise.
pub const DEFAULT_SECRET_LENGTH_IN_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret {
    pub secret_bytes: SecretBuffer,
    pub derivation_options_json: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretWire {
    secret_bytes: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    derivation_options_json: String,
}

impl Secret {
    /// Derive from a seed string (`type=Secret`, default 32 bytes).
    pub fn derive_from_seed(seed: &str, derivation_options_json: &str) -> Result<Self> {
        Ok(Self {
            secret_bytes: generate_seed(
                seed,
                derivation_options_json,
                KeyType::Secret,
                DEFAULT_SECRET_LENGTH_IN_BYTES,
            )?,
            derivation_options_json: derivation_options_json.to_string(),
        })
    }

    /// Wrap pre-existing secret bytes.
    pub fn from_secret_bytes(secret_bytes: SecretBuffer, derivation_options_json: &str) -> Self {
        Self {
            secret_bytes,
            derivation_options_json: derivation_options_json.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        let wire = SecretWire {
            secret_bytes: self.secret_bytes.to_hex(),
            derivation_options_json: self.derivation_options_json.clone(),
        };
        serde_json::to_string(&wire).map_err(|e| SeedSealError::JsonParsing(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let wire: SecretWire =
            serde_json::from_str(json).map_err(|e| SeedSealError::JsonParsing(e.to_string()))?;
        Ok(Self {
            secret_bytes: SecretBuffer::from_hex(&wire.secret_bytes)?,
            derivation_options_json: wire.derivation_options_json,
        })
    }

    /// Binary form: fixed-length list `[secretBytes, derivationOptionsJson]`.
    pub fn to_serialized_binary_form(&self) -> SecretBuffer {
        SecretBuffer::combine_fixed_length_list(&[
            &self.secret_bytes,
            &SecretBuffer::from_utf8(&self.derivation_options_json),
        ])
    }

    pub fn from_serialized_binary_form(serialized: &[u8]) -> Result<Self> {
        let fields = SecretBuffer::from_slice(serialized).split_fixed_length_list(2)?;
        Ok(Self {
            secret_bytes: fields[0].clone(),
            derivation_options_json: fields[1].to_utf8()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str =
        "A1tB2rC3bD4lE5tF6bG1tH1tI1tJ1tK1tL1tM1tN1tO1tP1tR1tS1tT1tU1tV1tW1tX1tY1tZ1t";
    const FAST_OPTIONS: &str = r#"{
	"type": "Secret",
	"hashFunction": "SHA256",
	"lengthInBytes": 96
}"#;

    #[test]
    fn test_json_roundtrip() {
        let secret = Secret::derive_from_seed(SEED, FAST_OPTIONS).unwrap();
        let replica = Secret::from_json(&secret.to_json().unwrap()).unwrap();
        assert_eq!(replica.derivation_options_json, secret.derivation_options_json);
        assert_eq!(replica.secret_bytes.to_hex(), secret.secret_bytes.to_hex());
        assert_eq!(replica, secret);
    }

    #[test]
    fn test_binary_roundtrip() {
        let secret = Secret::derive_from_seed(SEED, FAST_OPTIONS).unwrap();
        let serialized = secret.to_serialized_binary_form();
        let replica = Secret::from_serialized_binary_form(serialized.as_bytes()).unwrap();
        assert_eq!(replica, secret);
    }

    #[test]
    fn test_from_json_without_derivation_options() {
        let secret = Secret::from_json(
            r#"{
	"secretBytes": "0xffFE"
}"#,
        )
        .unwrap();
        assert_eq!(secret.secret_bytes.len(), 2);
        assert_eq!(secret.secret_bytes.as_bytes(), &[0xff, 0xfe]);
        assert!(secret.derivation_options_json.is_empty());
    }

    #[test]
    fn test_empty_options_field_is_omitted_from_json() {
        let secret = Secret::from_secret_bytes(SecretBuffer::from_slice(&[1, 2, 3]), "");
        let json = secret.to_json().unwrap();
        assert!(!json.contains("derivationOptionsJson"));
        assert_eq!(Secret::from_json(&json).unwrap(), secret);
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let a = Secret::derive_from_seed(SEED, FAST_OPTIONS).unwrap();
        let b = Secret::derive_from_seed(SEED, FAST_OPTIONS).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.secret_bytes.len(), 96);
    }
}
