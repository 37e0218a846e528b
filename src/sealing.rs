/// Public-key sealing: an X25519 pair derived from the seed, with an
/// anonymous (ephemeral-sender) box construction.
///
/// The box nonce is derived as BLAKE2b-24 over
/// `ephemeral_pk ‖ recipient_pk ‖ instructions` — with empty instructions
/// this is exactly the classic sealed-box nonce, and mixing the
/// instructions in means a wrong instructions string surfaces as a MAC
/// failure at unseal time. The ciphertext is
/// `ephemeral_pk(32) ‖ box(message + 16)`: 48 bytes longer than the
/// message. Sealing consumes randomness (the ephemeral key pair); the
/// construction is randomized by design, unlike the symmetric path.
use blake2::digest::{Update, VariableOutput};
use blake2::Blake2bVar;
use crypto_box::aead::{Aead, Nonce as AeadNonce};
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::derivation::generate_seed;
use crate::encoding;
use crate::error::{Result, SeedSealError};
use crate::options::KeyType;
use crate::packaged::PackagedSealedMessage;
use crate::sensitive::SecretBuffer;

pub const PUBLIC_KEY_LEN: usize = 32;
pub const PRIVATE_KEY_LEN: usize = 32;
pub const BOX_MAC_LEN: usize = 16;
/// Bytes a seal adds on top of the message: ephemeral public key plus MAC.
pub const SEAL_OVERHEAD: usize = PUBLIC_KEY_LEN + BOX_MAC_LEN;

const NONCE_LEN: usize = 24;

fn salted_box_nonce(
    ephemeral_pk: &[u8],
    recipient_pk: &[u8],
    post_decryption_instructions: &str,
) -> Result<[u8; NONCE_LEN]> {
    let mut hasher = Blake2bVar::new(NONCE_LEN).map_err(|_| SeedSealError::InvalidKeyLength)?;
    hasher.update(ephemeral_pk);
    hasher.update(recipient_pk);
    if !post_decryption_instructions.is_empty() {
        hasher.update(post_decryption_instructions.as_bytes());
    }
    let mut nonce = [0u8; NONCE_LEN];
    hasher
        .finalize_variable(&mut nonce)
        .map_err(|_| SeedSealError::InvalidKeyLength)?;
    Ok(nonce)
}

fn public_key_from_slice(bytes: &[u8]) -> Result<PublicKey> {
    let array: [u8; PUBLIC_KEY_LEN] = bytes
        .try_into()
        .map_err(|_| SeedSealError::InvalidKeyLength)?;
    Ok(PublicKey::from(array))
}

fn seal_to_public_key(
    message: &[u8],
    recipient_pk: &PublicKey,
    post_decryption_instructions: &str,
) -> Result<Vec<u8>> {
    if message.is_empty() {
        return Err(SeedSealError::InvalidMessageLength);
    }
    let ephemeral_secret = SecretKey::generate(&mut OsRng);
    let ephemeral_pk = ephemeral_secret.public_key();
    let nonce = salted_box_nonce(
        ephemeral_pk.as_bytes(),
        recipient_pk.as_bytes(),
        post_decryption_instructions,
    )?;
    let boxed = SalsaBox::new(recipient_pk, &ephemeral_secret)
        .encrypt(AeadNonce::<SalsaBox>::from_slice(&nonce), message)
        .map_err(|e| SeedSealError::Encryption(e.to_string()))?;

    let mut ciphertext = Vec::with_capacity(PUBLIC_KEY_LEN + boxed.len());
    ciphertext.extend_from_slice(ephemeral_pk.as_bytes());
    ciphertext.extend_from_slice(&boxed);
    Ok(ciphertext)
}

/// The private half: unseals messages sealed to its [`SealingKey`].
///
/// Carries a cached copy of the public half so handing out a `SealingKey`
/// never re-derives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsealingKey {
    pub unsealing_key_bytes: SecretBuffer,
    pub sealing_key_bytes: Vec<u8>,
    pub derivation_options_json: String,
}

/// The public half: seals messages only the matching [`UnsealingKey`] can
/// open. Public material throughout; safe to serialize and share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealingKey {
    pub sealing_key_bytes: Vec<u8>,
    pub derivation_options_json: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnsealingKeyWire {
    unsealing_key_bytes: String,
    sealing_key_bytes: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    derivation_options_json: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SealingKeyWire {
    sealing_key_bytes: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    derivation_options_json: String,
}

impl UnsealingKey {
    pub fn from_key_bytes(
        unsealing_key_bytes: SecretBuffer,
        sealing_key_bytes: Vec<u8>,
        derivation_options_json: &str,
    ) -> Result<Self> {
        if unsealing_key_bytes.len() != PRIVATE_KEY_LEN
            || sealing_key_bytes.len() != PUBLIC_KEY_LEN
        {
            return Err(SeedSealError::InvalidKeyLength);
        }
        Ok(Self {
            unsealing_key_bytes,
            sealing_key_bytes,
            derivation_options_json: derivation_options_json.to_string(),
        })
    }

    /// Derive the key pair from a seed string (`type=UnsealingKey`).
    ///
    /// The derived 32 bytes are the X25519 scalar (clamped on use); the
    /// public half is computed once and cached.
    pub fn derive_from_seed(seed: &str, derivation_options_json: &str) -> Result<Self> {
        let scalar = generate_seed(
            seed,
            derivation_options_json,
            KeyType::UnsealingKey,
            PRIVATE_KEY_LEN,
        )?;
        if scalar.len() != PRIVATE_KEY_LEN {
            return Err(SeedSealError::InvalidKeyLength);
        }
        let mut scalar_array = Zeroizing::new([0u8; PRIVATE_KEY_LEN]);
        scalar_array.copy_from_slice(scalar.as_bytes());
        let secret = SecretKey::from(*scalar_array);
        let sealing_key_bytes = secret.public_key().as_bytes().to_vec();
        Self::from_key_bytes(scalar, sealing_key_bytes, derivation_options_json)
    }

    /// The public half, sharing this key's options document.
    pub fn to_sealing_key(&self) -> SealingKey {
        SealingKey {
            sealing_key_bytes: self.sealing_key_bytes.clone(),
            derivation_options_json: self.derivation_options_json.clone(),
        }
    }

    /// Unseal a composite ciphertext produced by [`SealingKey`].
    pub fn unseal_ciphertext(
        &self,
        ciphertext: &[u8],
        post_decryption_instructions: &str,
    ) -> Result<SecretBuffer> {
        if ciphertext.len() <= SEAL_OVERHEAD {
            return Err(SeedSealError::InvalidMessageLength);
        }
        let (ephemeral_pk_bytes, boxed) = ciphertext.split_at(PUBLIC_KEY_LEN);
        let ephemeral_pk = public_key_from_slice(ephemeral_pk_bytes)?;
        let nonce = salted_box_nonce(
            ephemeral_pk_bytes,
            &self.sealing_key_bytes,
            post_decryption_instructions,
        )?;

        let mut scalar_array = Zeroizing::new([0u8; PRIVATE_KEY_LEN]);
        scalar_array.copy_from_slice(self.unsealing_key_bytes.as_bytes());
        let secret = SecretKey::from(*scalar_array);
        let plaintext = Zeroizing::new(
            SalsaBox::new(&ephemeral_pk, &secret)
                .decrypt(AeadNonce::<SalsaBox>::from_slice(&nonce), boxed)
                .map_err(|_| SeedSealError::CryptographicVerificationFailure)?,
        );
        Ok(SecretBuffer::from_slice(&plaintext))
    }

    /// Unseal a packaged message with its embedded instructions.
    pub fn unseal(&self, packaged: &PackagedSealedMessage) -> Result<SecretBuffer> {
        self.unseal_ciphertext(&packaged.ciphertext, &packaged.unsealing_instructions)
    }

    /// Re-derive the key pair from the seed and the package's options
    /// document, then unseal.
    pub fn unseal_from_seed(
        packaged: &PackagedSealedMessage,
        seed: &str,
    ) -> Result<SecretBuffer> {
        Self::derive_from_seed(seed, &packaged.derivation_options_json)?.unseal(packaged)
    }

    pub fn to_json(&self) -> Result<String> {
        let wire = UnsealingKeyWire {
            unsealing_key_bytes: self.unsealing_key_bytes.to_hex(),
            sealing_key_bytes: encoding::to_hex(&self.sealing_key_bytes),
            derivation_options_json: self.derivation_options_json.clone(),
        };
        serde_json::to_string(&wire).map_err(|e| SeedSealError::JsonParsing(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let wire: UnsealingKeyWire =
            serde_json::from_str(json).map_err(|e| SeedSealError::JsonParsing(e.to_string()))?;
        Self::from_key_bytes(
            SecretBuffer::from_hex(&wire.unsealing_key_bytes)?,
            encoding::from_hex(&wire.sealing_key_bytes)?,
            &wire.derivation_options_json,
        )
    }

    /// Binary form: fixed-length list
    /// `[unsealingKeyBytes, sealingKeyBytes, derivationOptionsJson]`.
    pub fn to_serialized_binary_form(&self) -> SecretBuffer {
        SecretBuffer::combine_fixed_length_list(&[
            &self.unsealing_key_bytes,
            &SecretBuffer::from_slice(&self.sealing_key_bytes),
            &SecretBuffer::from_utf8(&self.derivation_options_json),
        ])
    }

    pub fn from_serialized_binary_form(serialized: &[u8]) -> Result<Self> {
        let fields = SecretBuffer::from_slice(serialized).split_fixed_length_list(3)?;
        Self::from_key_bytes(fields[0].clone(), fields[1].to_vec(), &fields[2].to_utf8()?)
    }
}

impl SealingKey {
    pub fn from_key_bytes(
        sealing_key_bytes: Vec<u8>,
        derivation_options_json: &str,
    ) -> Result<Self> {
        if sealing_key_bytes.len() != PUBLIC_KEY_LEN {
            return Err(SeedSealError::InvalidKeyLength);
        }
        Ok(Self {
            sealing_key_bytes,
            derivation_options_json: derivation_options_json.to_string(),
        })
    }

    /// Seal a message to this public key; only the matching
    /// [`UnsealingKey`] (and the same instructions string) can open it.
    pub fn seal_to_ciphertext_only(
        &self,
        message: &[u8],
        post_decryption_instructions: &str,
    ) -> Result<Vec<u8>> {
        let recipient_pk = public_key_from_slice(&self.sealing_key_bytes)?;
        seal_to_public_key(message, &recipient_pk, post_decryption_instructions)
    }

    /// Seal and package with this key's options document.
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

    pub fn to_json(&self) -> Result<String> {
        let wire = SealingKeyWire {
            sealing_key_bytes: encoding::to_hex(&self.sealing_key_bytes),
            derivation_options_json: self.derivation_options_json.clone(),
        };
        serde_json::to_string(&wire).map_err(|e| SeedSealError::JsonParsing(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let wire: SealingKeyWire =
            serde_json::from_str(json).map_err(|e| SeedSealError::JsonParsing(e.to_string()))?;
        Self::from_key_bytes(
            encoding::from_hex(&wire.sealing_key_bytes)?,
            &wire.derivation_options_json,
        )
    }

    /// Binary form: fixed-length list `[sealingKeyBytes, derivationOptionsJson]`.
    pub fn to_serialized_binary_form(&self) -> SecretBuffer {
        SecretBuffer::combine_fixed_length_list(&[
            &SecretBuffer::from_slice(&self.sealing_key_bytes),
            &SecretBuffer::from_utf8(&self.derivation_options_json),
        ])
    }

    pub fn from_serialized_binary_form(serialized: &[u8]) -> Result<Self> {
        let fields = SecretBuffer::from_slice(serialized).split_fixed_length_list(2)?;
        Self::from_key_bytes(fields[0].to_vec(), &fields[1].to_utf8()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str =
        "A1tB2rC3bD4lE5tF6bG1tH1tI1tJ1tK1tL1tM1tN1tO1tP1tR1tS1tT1tU1tV1tW1tX1tY1tZ1t";
    const OPTIONS: &str = r#"{
	"type": "UnsealingKey",
	"additionalSalt": "1"
}"#;

    #[test]
    fn test_sealing_key_lengths() {
        let unsealing_key = UnsealingKey::derive_from_seed(SEED, OPTIONS).unwrap();
        let sealing_key = unsealing_key.to_sealing_key();
        assert_eq!(sealing_key.sealing_key_bytes.len(), 32);
    }

    #[test]
    fn test_sealing_key_from_empty_options() {
        let unsealing_key = UnsealingKey::derive_from_seed(SEED, "{}").unwrap();
        let sealing_key = unsealing_key.to_sealing_key();
        assert_eq!(encoding::to_hex(&sealing_key.sealing_key_bytes).len(), 64);
    }

    #[test]
    fn test_seal_unseal_roundtrip() {
        let unsealing_key = UnsealingKey::derive_from_seed(SEED, OPTIONS).unwrap();
        let sealing_key = unsealing_key.to_sealing_key();

        let ciphertext = sealing_key.seal_to_ciphertext_only(b"yoto", "{}").unwrap();
        assert_eq!(ciphertext.len(), 4 + SEAL_OVERHEAD);
        let plaintext = unsealing_key.unseal_ciphertext(&ciphertext, "{}").unwrap();
        assert_eq!(plaintext.as_bytes(), b"yoto");
    }

    #[test]
    fn test_packaged_roundtrip_rederives_key() {
        let unsealing_key = UnsealingKey::derive_from_seed(SEED, OPTIONS).unwrap();
        let packaged = unsealing_key.to_sealing_key().seal(b"yoto", "{}").unwrap();
        let plaintext = UnsealingKey::unseal_from_seed(&packaged, SEED).unwrap();
        assert_eq!(plaintext.as_bytes(), b"yoto");
    }

    #[test]
    fn test_wrong_instructions_fail() {
        let unsealing_key = UnsealingKey::derive_from_seed(SEED, OPTIONS).unwrap();
        let ciphertext = unsealing_key
            .to_sealing_key()
            .seal_to_ciphertext_only(b"yoto", "{\"a\": 1}")
            .unwrap();
        assert!(matches!(
            unsealing_key.unseal_ciphertext(&ciphertext, ""),
            Err(SeedSealError::CryptographicVerificationFailure)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let unsealing_key = UnsealingKey::derive_from_seed(SEED, OPTIONS).unwrap();
        let mut ciphertext = unsealing_key
            .to_sealing_key()
            .seal_to_ciphertext_only(b"yoto", "")
            .unwrap();
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0x01;
        assert!(unsealing_key.unseal_ciphertext(&ciphertext, "").is_err());
    }

    #[test]
    fn test_wrong_seed_fails() {
        let unsealing_key = UnsealingKey::derive_from_seed(SEED, OPTIONS).unwrap();
        let ciphertext = unsealing_key
            .to_sealing_key()
            .seal_to_ciphertext_only(b"yoto", "")
            .unwrap();
        let other = UnsealingKey::derive_from_seed("a different seed", OPTIONS).unwrap();
        assert!(other.unseal_ciphertext(&ciphertext, "").is_err());
    }

    #[test]
    fn test_unsealing_key_json_roundtrip() {
        let unsealing_key = UnsealingKey::derive_from_seed(SEED, OPTIONS).unwrap();
        let replica = UnsealingKey::from_json(&unsealing_key.to_json().unwrap()).unwrap();
        assert_eq!(replica, unsealing_key);
    }

    #[test]
    fn test_unsealing_key_binary_roundtrip() {
        let unsealing_key = UnsealingKey::derive_from_seed(SEED, OPTIONS).unwrap();
        let serialized = unsealing_key.to_serialized_binary_form();
        let replica =
            UnsealingKey::from_serialized_binary_form(serialized.as_bytes()).unwrap();
        assert_eq!(replica, unsealing_key);
    }

    #[test]
    fn test_sealing_key_json_roundtrip() {
        let sealing_key = UnsealingKey::derive_from_seed(SEED, OPTIONS)
            .unwrap()
            .to_sealing_key();
        let replica = SealingKey::from_json(&sealing_key.to_json().unwrap()).unwrap();
        assert_eq!(replica, sealing_key);
    }

    #[test]
    fn test_sealing_key_binary_roundtrip() {
        let sealing_key = UnsealingKey::derive_from_seed(SEED, OPTIONS)
            .unwrap()
            .to_sealing_key();
        let serialized = sealing_key.to_serialized_binary_form();
        let replica = SealingKey::from_serialized_binary_form(serialized.as_bytes()).unwrap();
        assert_eq!(replica, sealing_key);
    }

    #[test]
    fn test_empty_message_fails() {
        let sealing_key = UnsealingKey::derive_from_seed(SEED, OPTIONS)
            .unwrap()
            .to_sealing_key();
        assert!(matches!(
            sealing_key.seal_to_ciphertext_only(b"", ""),
            Err(SeedSealError::InvalidMessageLength)
        ));
    }
}
