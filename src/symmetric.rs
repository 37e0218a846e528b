/// Symmetric sealing with a deterministic nonce.
///
/// The secretbox construct leaves nonce management to the caller. Here the
/// nonce is derived — keyed BLAKE2b over the post-decryption instructions
/// and the message, keyed by the secret itself — so sealing is a pure
/// function: equal (key, message, instructions) triples produce equal
/// ciphertexts, and the nonce doubles as a binding of the instructions to
/// the ciphertext.
///
/// The composite ciphertext is `nonce(24) ‖ secretbox(message + 16)`:
/// 40 bytes longer than the message.
use blake2::digest::consts::U24;
use blake2::digest::Mac;
use blake2::Blake2bMac;
use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::{Nonce, XSalsa20Poly1305};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::derivation::generate_seed;
use crate::error::{Result, SeedSealError};
use crate::options::KeyType;
use crate::packaged::PackagedSealedMessage;
use crate::sensitive::SecretBuffer;

pub const NONCE_LEN: usize = 24;
pub const MAC_LEN: usize = 16;
pub const KEY_LEN: usize = 32;

/// Nonce = keyed BLAKE2b-24 over `instructions ‖ message` (instructions
/// skipped when empty), keyed by the 32-byte secret. This exact order and
/// keying is load-bearing: previously sealed data is unreadable under any
/// other construction.
fn derived_nonce(
    key_bytes: &[u8],
    post_decryption_instructions: &str,
    message: &[u8],
) -> Result<[u8; NONCE_LEN]> {
    let mut hasher = <Blake2bMac<U24> as Mac>::new_from_slice(key_bytes)
        .map_err(|_| SeedSealError::InvalidKeyLength)?;
    if !post_decryption_instructions.is_empty() {
        hasher.update(post_decryption_instructions.as_bytes());
    }
    hasher.update(message);
    let digest = hasher.finalize().into_bytes();
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&digest);
    Ok(nonce)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymmetricKey {
    pub key_bytes: SecretBuffer,
    pub derivation_options_json: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymmetricKeyWire {
    key_bytes: String,
    #[serde(
        default,
        alias = "keyDerivationOptionsJson",
        skip_serializing_if = "String::is_empty"
    )]
    derivation_options_json: String,
}

impl SymmetricKey {
    /// Wrap pre-existing key bytes; anything but 32 bytes fails.
    pub fn from_key_bytes(key_bytes: SecretBuffer, derivation_options_json: &str) -> Result<Self> {
        if key_bytes.len() != KEY_LEN {
            return Err(SeedSealError::InvalidKeyLength);
        }
        Ok(Self {
            key_bytes,
            derivation_options_json: derivation_options_json.to_string(),
        })
    }

    /// Derive from a seed string (`type=SymmetricKey`, 32 bytes).
    pub fn derive_from_seed(seed: &str, derivation_options_json: &str) -> Result<Self> {
        let key_bytes = generate_seed(
            seed,
            derivation_options_json,
            KeyType::SymmetricKey,
            KEY_LEN,
        )?;
        Self::from_key_bytes(key_bytes, derivation_options_json)
    }

    /// Seal a message into a composite ciphertext.
    ///
    /// Fully deterministic; no randomness is consumed.
    pub fn seal_to_ciphertext_only(
        &self,
        message: &[u8],
        post_decryption_instructions: &str,
    ) -> Result<Vec<u8>> {
        if message.is_empty() {
            return Err(SeedSealError::InvalidMessageLength);
        }
        let nonce = derived_nonce(
            self.key_bytes.as_bytes(),
            post_decryption_instructions,
            message,
        )?;
        let cipher = XSalsa20Poly1305::new_from_slice(self.key_bytes.as_bytes())
            .map_err(|_| SeedSealError::InvalidKeyLength)?;
        let boxed = cipher
            .encrypt(Nonce::from_slice(&nonce), message)
            .map_err(|e| SeedSealError::Encryption(e.to_string()))?;

        let mut ciphertext = Vec::with_capacity(NONCE_LEN + boxed.len());
        ciphertext.extend_from_slice(&nonce);
        ciphertext.extend_from_slice(&boxed);
        Ok(ciphertext)
    }

    /// Seal and package the result with everything needed to re-derive the
    /// key (except the seed).
    pub fn seal(
        &self,
        message: &[u8],
        post_decryption_instructions: &str,
    ) -> Result<PackagedSealedMessage> {
        Ok(PackagedSealedMessage::new(
            self.seal_to_ciphertext_only(message, post_decryption_instructions)?,
            &self.derivation_options_json,
            post_decryption_instructions,
        ))
    }

    /// Unseal a composite ciphertext.
    ///
    /// A bad MAC and a wrong set of post-decryption instructions are
    /// deliberately indistinguishable to the caller.
    pub fn unseal_ciphertext(
        &self,
        ciphertext: &[u8],
        post_decryption_instructions: &str,
    ) -> Result<SecretBuffer> {
        if ciphertext.len() <= NONCE_LEN + MAC_LEN {
            return Err(SeedSealError::InvalidMessageLength);
        }
        let (nonce, boxed) = ciphertext.split_at(NONCE_LEN);
        let cipher = XSalsa20Poly1305::new_from_slice(self.key_bytes.as_bytes())
            .map_err(|_| SeedSealError::InvalidKeyLength)?;
        let plaintext = Zeroizing::new(
            cipher
                .decrypt(Nonce::from_slice(nonce), boxed)
                .map_err(|_| SeedSealError::CryptographicVerificationFailure)?,
        );

        // The secretbox MAC binds the ciphertext to the nonce but not to
        // the instructions. Recomputing the nonce from the recovered
        // plaintext closes that gap.
        let recalculated = derived_nonce(
            self.key_bytes.as_bytes(),
            post_decryption_instructions,
            &plaintext,
        )?;
        if recalculated != nonce {
            return Err(SeedSealError::CryptographicVerificationFailure);
        }
        Ok(SecretBuffer::from_slice(&plaintext))
    }

    /// Unseal a packaged message with its embedded instructions.
    pub fn unseal(&self, packaged: &PackagedSealedMessage) -> Result<SecretBuffer> {
        self.unseal_ciphertext(&packaged.ciphertext, &packaged.unsealing_instructions)
    }

    /// Re-derive the key from the seed and the package's options document,
    /// then unseal.
    pub fn unseal_from_seed(
        packaged: &PackagedSealedMessage,
        seed: &str,
    ) -> Result<SecretBuffer> {
        Self::derive_from_seed(seed, &packaged.derivation_options_json)?.unseal(packaged)
    }

    pub fn to_json(&self) -> Result<String> {
        let wire = SymmetricKeyWire {
            key_bytes: self.key_bytes.to_hex(),
            derivation_options_json: self.derivation_options_json.clone(),
        };
        serde_json::to_string(&wire).map_err(|e| SeedSealError::JsonParsing(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let wire: SymmetricKeyWire =
            serde_json::from_str(json).map_err(|e| SeedSealError::JsonParsing(e.to_string()))?;
        Self::from_key_bytes(
            SecretBuffer::from_hex(&wire.key_bytes)?,
            &wire.derivation_options_json,
        )
    }

    /// Binary form: fixed-length list `[keyBytes, derivationOptionsJson]`.
    pub fn to_serialized_binary_form(&self) -> SecretBuffer {
        SecretBuffer::combine_fixed_length_list(&[
            &self.key_bytes,
            &SecretBuffer::from_utf8(&self.derivation_options_json),
        ])
    }

    pub fn from_serialized_binary_form(serialized: &[u8]) -> Result<Self> {
        let fields = SecretBuffer::from_slice(serialized).split_fixed_length_list(2)?;
        Self::from_key_bytes(fields[0].clone(), &fields[1].to_utf8()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str =
        "A1tB2rC3bD4lE5tF6bG1tH1tI1tJ1tK1tL1tM1tN1tO1tP1tR1tS1tT1tU1tV1tW1tX1tY1tZ1t";
    const OPTIONS: &str = r#"{
	"type": "SymmetricKey",
	"additionalSalt": "1"
}"#;
    const INSTRUCTIONS: &str = "{\"userMustAcknowledgeThisMessage\": \"yoto mofo\"}";

    fn test_key() -> SymmetricKey {
        SymmetricKey::derive_from_seed(SEED, OPTIONS).unwrap()
    }

    #[test]
    fn test_seal_unseal_roundtrip() {
        let key = test_key();
        let ciphertext = key.seal_to_ciphertext_only(b"yoto", INSTRUCTIONS).unwrap();
        assert_eq!(ciphertext.len(), NONCE_LEN + 4 + MAC_LEN);
        let plaintext = key.unseal_ciphertext(&ciphertext, INSTRUCTIONS).unwrap();
        assert_eq!(plaintext.as_bytes(), b"yoto");
    }

    #[test]
    fn test_seal_unseal_without_instructions() {
        let key = test_key();
        let ciphertext = key.seal_to_ciphertext_only(b"yoto", "").unwrap();
        let plaintext = key.unseal_ciphertext(&ciphertext, "").unwrap();
        assert_eq!(plaintext.as_bytes(), b"yoto");
    }

    #[test]
    fn test_seal_is_deterministic() {
        let key = test_key();
        let first = key.seal_to_ciphertext_only(b"yoto", INSTRUCTIONS).unwrap();
        let second = key.seal_to_ciphertext_only(b"yoto", INSTRUCTIONS).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_wrong_instructions_fail() {
        let key = test_key();
        let ciphertext = key.seal_to_ciphertext_only(b"yoto", INSTRUCTIONS).unwrap();
        assert!(matches!(
            key.unseal_ciphertext(&ciphertext, ""),
            Err(SeedSealError::CryptographicVerificationFailure)
        ));
        assert!(matches!(
            key.unseal_ciphertext(&ciphertext, "{}"),
            Err(SeedSealError::CryptographicVerificationFailure)
        ));
    }

    #[test]
    fn test_any_flipped_bit_fails() {
        let key = test_key();
        let ciphertext = key.seal_to_ciphertext_only(b"yoto", INSTRUCTIONS).unwrap();
        for byte_index in 0..ciphertext.len() {
            let mut tampered = ciphertext.clone();
            tampered[byte_index] ^= 0x01;
            assert!(matches!(
                key.unseal_ciphertext(&tampered, INSTRUCTIONS),
                Err(SeedSealError::CryptographicVerificationFailure)
            ));
        }
    }

    #[test]
    fn test_wrong_seed_fails() {
        let key = test_key();
        let ciphertext = key.seal_to_ciphertext_only(b"yoto", INSTRUCTIONS).unwrap();
        let other = SymmetricKey::derive_from_seed("a different seed", OPTIONS).unwrap();
        assert!(other.unseal_ciphertext(&ciphertext, INSTRUCTIONS).is_err());
    }

    #[test]
    fn test_packaged_roundtrip_rederives_key() {
        let key = test_key();
        let packaged = key.seal(b"yoto", INSTRUCTIONS).unwrap();
        assert_eq!(packaged.derivation_options_json, OPTIONS);
        assert_eq!(packaged.unsealing_instructions, INSTRUCTIONS);

        let plaintext = SymmetricKey::unseal_from_seed(&packaged, SEED).unwrap();
        assert_eq!(plaintext.as_bytes(), b"yoto");
    }

    #[test]
    fn test_packaged_unseals_without_rederiving() {
        let key = test_key();
        let packaged = key.seal(b"yoto", INSTRUCTIONS).unwrap();
        assert_eq!(key.unseal(&packaged).unwrap().as_bytes(), b"yoto");
    }

    #[test]
    fn test_message_length_limits() {
        let key = test_key();
        assert!(matches!(
            key.seal_to_ciphertext_only(b"", INSTRUCTIONS),
            Err(SeedSealError::InvalidMessageLength)
        ));
        assert!(matches!(
            key.unseal_ciphertext(&[0u8; NONCE_LEN + MAC_LEN], ""),
            Err(SeedSealError::InvalidMessageLength)
        ));
    }

    #[test]
    fn test_derived_key_must_be_32_bytes() {
        let result = SymmetricKey::derive_from_seed(
            SEED,
            r#"{"type": "SymmetricKey", "lengthInBytes": 64}"#,
        );
        assert!(matches!(result, Err(SeedSealError::InvalidKeyLength)));
    }

    #[test]
    fn test_json_roundtrip() {
        let key = test_key();
        let replica = SymmetricKey::from_json(&key.to_json().unwrap()).unwrap();
        assert_eq!(replica, key);
    }

    #[test]
    fn test_json_accepts_legacy_field_spelling() {
        let key = test_key();
        let json = key
            .to_json()
            .unwrap()
            .replace("derivationOptionsJson", "keyDerivationOptionsJson");
        let replica = SymmetricKey::from_json(&json).unwrap();
        assert_eq!(replica, key);
    }

    #[test]
    fn test_binary_roundtrip() {
        let key = test_key();
        let serialized = key.to_serialized_binary_form();
        let replica = SymmetricKey::from_serialized_binary_form(serialized.as_bytes()).unwrap();
        assert_eq!(replica, key);
    }
}
