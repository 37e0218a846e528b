/// The derivation-options document: a small JSON object that parameterizes
/// the KDF and declares what kind of key it derives.
///
/// The canonical form of the document is the verbatim input string — it is
/// hashed and compared as-is, never re-serialized — so this parser only
/// produces a resolved view and leaves the string alone. Unknown fields are
/// permitted.
use std::fmt;

use crate::encoding;
use crate::error::{Result, SeedSealError};

/// Default Argon2id memory limit, in bytes (libsodium's interactive limit).
pub const DEFAULT_MEMORY_LIMIT_IN_BYTES: u64 = 67_108_864;

/// Default Argon2id pass count (libsodium's interactive opslimit).
pub const DEFAULT_MEMORY_PASSES: u32 = 2;

/// The kind of key a derivation produces, as declared in the options
/// document's `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Secret,
    SymmetricKey,
    UnsealingKey,
    SigningKey,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Secret => "Secret",
            KeyType::SymmetricKey => "SymmetricKey",
            KeyType::UnsealingKey => "UnsealingKey",
            KeyType::SigningKey => "SigningKey",
        }
    }

    fn from_declared(name: &str) -> Result<Self> {
        match name {
            "Secret" => Ok(KeyType::Secret),
            "SymmetricKey" => Ok(KeyType::SymmetricKey),
            "UnsealingKey" => Ok(KeyType::UnsealingKey),
            "SigningKey" => Ok(KeyType::SigningKey),
            _ => Err(SeedSealError::InvalidDerivationOptionValueType("type")),
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which KDF turns the seed into key bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFunction {
    Blake2b,
    Sha256,
    Argon2id,
}

impl HashFunction {
    fn from_declared(name: &str) -> Result<Self> {
        match name {
            "BLAKE2b" => Ok(HashFunction::Blake2b),
            "SHA256" => Ok(HashFunction::Sha256),
            "Argon2id" => Ok(HashFunction::Argon2id),
            _ => Err(SeedSealError::InvalidDerivationOptionValueType(
                "hashFunction",
            )),
        }
    }
}

/// Resolved view of an options document, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationOptions {
    /// The document's declared key type, when present.
    pub key_type: Option<KeyType>,
    pub hash_function: HashFunction,
    /// Requested output length; callers fall back to a per-type default.
    pub length_in_bytes: Option<usize>,
    /// Argon2id memory parameter, in bytes.
    pub memory_limit_in_bytes: u64,
    /// Argon2id pass count.
    pub memory_passes: u32,
    /// Extra salt folded into the canonical input (and, for Argon2id, the
    /// pwhash salt).
    pub additional_salt: String,
}

impl DerivationOptions {
    /// Parse and validate an options document against the key type the
    /// caller is deriving. An empty document string means `"{}"`.
    pub fn from_json(options_json: &str, requested_type: KeyType) -> Result<Self> {
        let document = if options_json.is_empty() {
            "{}"
        } else {
            options_json
        };
        let object = encoding::parse_json_object(document)?;

        let key_type = encoding::optional_string_field(&object, "type")?
            .map(KeyType::from_declared)
            .transpose()?;
        if let Some(declared) = key_type {
            if declared != requested_type {
                return Err(SeedSealError::InvalidDerivationOptionType {
                    declared: declared.to_string(),
                    requested: requested_type.to_string(),
                });
            }
        }

        let hash_function = encoding::optional_string_field(&object, "hashFunction")?
            .map(HashFunction::from_declared)
            .transpose()?
            .unwrap_or(HashFunction::Blake2b);

        let length_in_bytes =
            encoding::optional_positive_integer_field(&object, "lengthInBytes")?
                .map(|v| v as usize);

        let memory_limit_in_bytes = encoding::optional_positive_integer_field(
            &object,
            "hashFunctionMemoryLimitInBytes",
        )?
        .unwrap_or(DEFAULT_MEMORY_LIMIT_IN_BYTES);

        let memory_passes =
            encoding::optional_positive_integer_field(&object, "hashFunctionMemoryPasses")?
                .map(|v| v as u32)
                .unwrap_or(DEFAULT_MEMORY_PASSES);

        let additional_salt = encoding::optional_string_field(&object, "additionalSalt")?
            .unwrap_or("")
            .to_string();

        Ok(Self {
            key_type,
            hash_function,
            length_in_bytes,
            memory_limit_in_bytes,
            memory_passes,
            additional_salt,
        })
    }

    /// The derived-secret length: the document's `lengthInBytes` when given,
    /// otherwise the caller's per-type default.
    pub fn resolved_length(&self, default_length_in_bytes: usize) -> usize {
        self.length_in_bytes.unwrap_or(default_length_in_bytes)
    }
}
