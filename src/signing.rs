/// Seeded Ed25519 signing.
///
/// Derivation produces a 32-byte seed which is expanded to the 64-byte
/// secret key (seed ‖ public key). Serialization can store either the
/// seed alone (compact, re-expanded on load) or the full 64 bytes.
use ed25519_dalek::{
    Signature, Signer, SigningKey as Ed25519SigningKey, Verifier, VerifyingKey,
};
use serde::{Deserialize, Serialize};

use crate::derivation::generate_seed;
use crate::encoding;
use crate::error::{Result, SeedSealError};
use crate::options::KeyType;
use crate::sensitive::SecretBuffer;

pub const SEED_LEN: usize = 32;
pub const SECRET_KEY_LEN: usize = 64;
pub const VERIFICATION_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKey {
    /// The 64-byte Ed25519 secret key: seed followed by the public key.
    pub signing_key_bytes: SecretBuffer,
    pub derivation_options_json: String,
}

/// The public half; verifies detached signatures. `verify` is a predicate:
/// a bad signature yields `false`, never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureVerificationKey {
    pub key_bytes: Vec<u8>,
    pub derivation_options_json: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SigningKeyWire {
    signing_key_bytes: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    derivation_options_json: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    minimize_size_by_storing_only_seed_bytes: Option<bool>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureVerificationKeyWire {
    signature_verification_key_bytes: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    derivation_options_json: String,
}

fn expand_seed(seed_bytes: &[u8]) -> Result<SecretBuffer> {
    let seed: [u8; SEED_LEN] = seed_bytes
        .try_into()
        .map_err(|_| SeedSealError::InvalidKeyLength)?;
    let key = Ed25519SigningKey::from_bytes(&seed);
    Ok(SecretBuffer::from_slice(&key.to_keypair_bytes()))
}

impl SigningKey {
    /// Wrap stored key bytes: a 32-byte seed is re-expanded, a 64-byte
    /// secret key is validated and used as-is.
    pub fn from_key_bytes(key_bytes: SecretBuffer, derivation_options_json: &str) -> Result<Self> {
        let signing_key_bytes = match key_bytes.len() {
            SEED_LEN => expand_seed(key_bytes.as_bytes())?,
            SECRET_KEY_LEN => {
                let pair: [u8; SECRET_KEY_LEN] = key_bytes
                    .as_bytes()
                    .try_into()
                    .map_err(|_| SeedSealError::InvalidKeyLength)?;
                Ed25519SigningKey::from_keypair_bytes(&pair)
                    .map_err(|_| SeedSealError::InvalidKeyLength)?;
                key_bytes
            }
            _ => return Err(SeedSealError::InvalidKeyLength),
        };
        Ok(Self {
            signing_key_bytes,
            derivation_options_json: derivation_options_json.to_string(),
        })
    }

    /// Derive from a seed string (`type=SigningKey`, 32 seed bytes).
    pub fn derive_from_seed(seed: &str, derivation_options_json: &str) -> Result<Self> {
        let seed_bytes = generate_seed(
            seed,
            derivation_options_json,
            KeyType::SigningKey,
            SEED_LEN,
        )?;
        if seed_bytes.len() != SEED_LEN {
            return Err(SeedSealError::InvalidKeyLength);
        }
        Ok(Self {
            signing_key_bytes: expand_seed(seed_bytes.as_bytes())?,
            derivation_options_json: derivation_options_json.to_string(),
        })
    }

    fn to_ed25519(&self) -> Result<Ed25519SigningKey> {
        let pair: [u8; SECRET_KEY_LEN] = self
            .signing_key_bytes
            .as_bytes()
            .try_into()
            .map_err(|_| SeedSealError::InvalidKeyLength)?;
        Ed25519SigningKey::from_keypair_bytes(&pair)
            .map_err(|_| SeedSealError::InvalidKeyLength)
    }

    /// A 64-byte detached signature over the message.
    pub fn generate_signature(&self, message: &[u8]) -> Result<Vec<u8>> {
        Ok(self.to_ed25519()?.sign(message).to_bytes().to_vec())
    }

    /// The verification key (the trailing public half of the secret key).
    pub fn to_signature_verification_key(&self) -> SignatureVerificationKey {
        SignatureVerificationKey {
            key_bytes: self.signing_key_bytes.as_bytes()[SEED_LEN..].to_vec(),
            derivation_options_json: self.derivation_options_json.clone(),
        }
    }

    pub fn to_json(&self, minimize_size_by_storing_only_seed_bytes: bool) -> Result<String> {
        let stored = if minimize_size_by_storing_only_seed_bytes {
            &self.signing_key_bytes.as_bytes()[..SEED_LEN]
        } else {
            self.signing_key_bytes.as_bytes()
        };
        let wire = SigningKeyWire {
            signing_key_bytes: encoding::to_hex(stored),
            derivation_options_json: self.derivation_options_json.clone(),
            minimize_size_by_storing_only_seed_bytes: minimize_size_by_storing_only_seed_bytes
                .then_some(true),
        };
        serde_json::to_string(&wire).map_err(|e| SeedSealError::JsonParsing(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let wire: SigningKeyWire =
            serde_json::from_str(json).map_err(|e| SeedSealError::JsonParsing(e.to_string()))?;
        Self::from_key_bytes(
            SecretBuffer::from_hex(&wire.signing_key_bytes)?,
            &wire.derivation_options_json,
        )
    }

    /// Binary form: fixed-length list `[signingKeyBytes, derivationOptionsJson]`,
    /// with the key stored compact (seed only) or full.
    pub fn to_serialized_binary_form(
        &self,
        minimize_size_by_storing_only_seed_bytes: bool,
    ) -> SecretBuffer {
        let stored = if minimize_size_by_storing_only_seed_bytes {
            SecretBuffer::from_slice(&self.signing_key_bytes.as_bytes()[..SEED_LEN])
        } else {
            self.signing_key_bytes.clone()
        };
        SecretBuffer::combine_fixed_length_list(&[
            &stored,
            &SecretBuffer::from_utf8(&self.derivation_options_json),
        ])
    }

    pub fn from_serialized_binary_form(serialized: &[u8]) -> Result<Self> {
        let fields = SecretBuffer::from_slice(serialized).split_fixed_length_list(2)?;
        Self::from_key_bytes(fields[0].clone(), &fields[1].to_utf8()?)
    }
}

impl SignatureVerificationKey {
    pub fn from_key_bytes(key_bytes: Vec<u8>, derivation_options_json: &str) -> Result<Self> {
        if key_bytes.len() != VERIFICATION_KEY_LEN {
            return Err(SeedSealError::InvalidKeyLength);
        }
        Ok(Self {
            key_bytes,
            derivation_options_json: derivation_options_json.to_string(),
        })
    }

    /// Whether `signature` is a valid detached signature over `message`.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(key_array) = <[u8; VERIFICATION_KEY_LEN]>::try_from(self.key_bytes.as_slice())
        else {
            return false;
        };
        let Ok(verifying_key) = VerifyingKey::from_bytes(&key_array) else {
            return false;
        };
        let Ok(signature_array) = <[u8; SIGNATURE_LEN]>::try_from(signature) else {
            return false;
        };
        verifying_key
            .verify(message, &Signature::from_bytes(&signature_array))
            .is_ok()
    }

    pub fn to_json(&self) -> Result<String> {
        let wire = SignatureVerificationKeyWire {
            signature_verification_key_bytes: encoding::to_hex(&self.key_bytes),
            derivation_options_json: self.derivation_options_json.clone(),
        };
        serde_json::to_string(&wire).map_err(|e| SeedSealError::JsonParsing(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let wire: SignatureVerificationKeyWire =
            serde_json::from_str(json).map_err(|e| SeedSealError::JsonParsing(e.to_string()))?;
        Self::from_key_bytes(
            encoding::from_hex(&wire.signature_verification_key_bytes)?,
            &wire.derivation_options_json,
        )
    }

    /// Binary form: fixed-length list `[keyBytes, derivationOptionsJson]`.
    pub fn to_serialized_binary_form(&self) -> SecretBuffer {
        SecretBuffer::combine_fixed_length_list(&[
            &SecretBuffer::from_slice(&self.key_bytes),
            &SecretBuffer::from_utf8(&self.derivation_options_json),
        ])
    }

    pub fn from_serialized_binary_form(serialized: &[u8]) -> Result<Self> {
        let fields = SecretBuffer::from_slice(serialized).split_fixed_length_list(2)?;
        Self::from_key_bytes(fields[0].to_vec(), &fields[1].to_utf8()?)
    }
}
