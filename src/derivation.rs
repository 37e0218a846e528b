/// Seed-to-key derivation: hash a seed string together with its verbatim
/// options document into a fixed-width secret.
///
/// Everything here is a pure function of its inputs. Given the same seed,
/// options string, and requested type, every byte of the output is fixed
/// across invocations and hosts.
use argon2::{Algorithm, Argon2, Params, Version};
use blake2::digest::{Update, VariableOutput};
use blake2::Blake2bVar;
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{Result, SeedSealError};
use crate::options::{DerivationOptions, HashFunction, KeyType};
use crate::sensitive::SecretBuffer;

/// Argon2id wants a fixed-width salt; `additionalSalt` is truncated or
/// zero-padded to this many bytes.
const ARGON2_SALT_LEN: usize = 16;

/// Derive `length_in_bytes` (from the options document, else
/// `default_length_in_bytes`) secret bytes from a seed string.
///
/// The KDF input is `seed ‖ 0x00 ‖ options_json`; the null byte separates
/// the two so that shifting characters between seed and options always
/// changes the output.
pub fn generate_seed(
    seed: &str,
    derivation_options_json: &str,
    requested_type: KeyType,
    default_length_in_bytes: usize,
) -> Result<SecretBuffer> {
    let options = DerivationOptions::from_json(derivation_options_json, requested_type)?;
    let length_in_bytes = options.resolved_length(default_length_in_bytes);
    debug!(
        key_type = requested_type.as_str(),
        hash_function = ?options.hash_function,
        length_in_bytes,
        "deriving secret from seed"
    );

    let mut preimage = Zeroizing::new(Vec::with_capacity(
        seed.len() + 1 + derivation_options_json.len(),
    ));
    preimage.extend_from_slice(seed.as_bytes());
    preimage.push(0u8);
    preimage.extend_from_slice(derivation_options_json.as_bytes());

    match options.hash_function {
        HashFunction::Blake2b => blake2b(&preimage, length_in_bytes),
        HashFunction::Sha256 => Ok(sha256_chained(&preimage, length_in_bytes)),
        HashFunction::Argon2id => argon2id(&preimage, &options, length_in_bytes),
    }
}

/// Single-pass unkeyed BLAKE2b. The primitive only produces 1..=64 bytes;
/// longer secrets must ask for Argon2id or SHA256 instead.
fn blake2b(preimage: &[u8], length_in_bytes: usize) -> Result<SecretBuffer> {
    let mut hasher =
        Blake2bVar::new(length_in_bytes).map_err(|_| SeedSealError::InvalidKeyLength)?;
    hasher.update(preimage);
    let mut digest = Zeroizing::new(vec![0u8; length_in_bytes]);
    hasher
        .finalize_variable(&mut digest)
        .map_err(|_| SeedSealError::InvalidKeyLength)?;
    Ok(SecretBuffer::from_slice(&digest))
}

/// Counter-chained SHA-256: block i is `SHA256(preimage ‖ be32(i))`;
/// blocks are concatenated and truncated to the requested length.
fn sha256_chained(preimage: &[u8], length_in_bytes: usize) -> SecretBuffer {
    let mut output = Zeroizing::new(Vec::with_capacity(length_in_bytes + 32));
    let mut counter: u32 = 0;
    while output.len() < length_in_bytes {
        let mut hasher = Sha256::new();
        Digest::update(&mut hasher, preimage);
        Digest::update(&mut hasher, counter.to_be_bytes());
        output.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    SecretBuffer::from_slice(&output[..length_in_bytes])
}

/// Argon2id with the document's memory limit (bytes) and pass count.
/// Lanes are fixed at one, matching the pwhash this format grew out of.
fn argon2id(
    preimage: &[u8],
    options: &DerivationOptions,
    length_in_bytes: usize,
) -> Result<SecretBuffer> {
    let memory_kib = (options.memory_limit_in_bytes / 1024) as u32;
    let params = Params::new(memory_kib, options.memory_passes, 1, Some(length_in_bytes))
        .map_err(|e| SeedSealError::KeyDerivation(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut salt = [0u8; ARGON2_SALT_LEN];
    let salt_bytes = options.additional_salt.as_bytes();
    let copied = salt_bytes.len().min(ARGON2_SALT_LEN);
    salt[..copied].copy_from_slice(&salt_bytes[..copied]);

    let mut output = Zeroizing::new(vec![0u8; length_in_bytes]);
    argon2
        .hash_password_into(preimage, &salt, &mut output)
        .map_err(|e| SeedSealError::KeyDerivation(e.to_string()))?;
    Ok(SecretBuffer::from_slice(&output))
}
