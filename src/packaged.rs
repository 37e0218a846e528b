/// The wire artifact a seal produces: ciphertext plus the metadata needed
/// to re-derive the key from a seed. Never contains the key or the seed.
use serde::{Deserialize, Serialize};

use crate::encoding;
use crate::error::{Result, SeedSealError};
use crate::sensitive::SecretBuffer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedSealedMessage {
    /// The composite ciphertext (layout depends on the sealing key family).
    pub ciphertext: Vec<u8>,
    /// The verbatim options document the sealing key was derived with.
    pub derivation_options_json: String,
    /// The post-decryption instructions the message was sealed with.
    pub unsealing_instructions: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackagedSealedMessageWire {
    ciphertext: String,
    #[serde(default)]
    derivation_options_json: String,
    #[serde(default)]
    unsealing_instructions: String,
}

impl PackagedSealedMessage {
    pub fn new(
        ciphertext: Vec<u8>,
        derivation_options_json: &str,
        unsealing_instructions: &str,
    ) -> Self {
        Self {
            ciphertext,
            derivation_options_json: derivation_options_json.to_string(),
            unsealing_instructions: unsealing_instructions.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        let wire = PackagedSealedMessageWire {
            ciphertext: encoding::to_hex(&self.ciphertext),
            derivation_options_json: self.derivation_options_json.clone(),
            unsealing_instructions: self.unsealing_instructions.clone(),
        };
        serde_json::to_string(&wire).map_err(|e| SeedSealError::JsonParsing(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let wire: PackagedSealedMessageWire = serde_json::from_str(json)
            .map_err(|e| SeedSealError::JsonParsing(e.to_string()))?;
        Ok(Self {
            ciphertext: encoding::from_hex(&wire.ciphertext)?,
            derivation_options_json: wire.derivation_options_json,
            unsealing_instructions: wire.unsealing_instructions,
        })
    }

    /// Binary form: fixed-length list
    /// `[ciphertext, derivationOptionsJson, unsealingInstructions]`.
    pub fn to_serialized_binary_form(&self) -> SecretBuffer {
        SecretBuffer::combine_fixed_length_list(&[
            &SecretBuffer::from_slice(&self.ciphertext),
            &SecretBuffer::from_utf8(&self.derivation_options_json),
            &SecretBuffer::from_utf8(&self.unsealing_instructions),
        ])
    }

    pub fn from_serialized_binary_form(serialized: &[u8]) -> Result<Self> {
        let fields = SecretBuffer::from_slice(serialized).split_fixed_length_list(3)?;
        Ok(Self {
            ciphertext: fields[0].to_vec(),
            derivation_options_json: fields[1].to_utf8()?,
            unsealing_instructions: fields[2].to_utf8()?,
        })
    }
}
