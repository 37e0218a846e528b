use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeedSealError {
    #[error("Could not parse non-hex character")]
    InvalidHexCharacter,

    #[error("JSON parsing failed: {0}")]
    JsonParsing(String),

    #[error("Derivation option `{0}` has an invalid value type")]
    InvalidDerivationOptionValueType(&'static str),

    #[error("Derivation options declare type {declared} but {requested} was requested")]
    InvalidDerivationOptionType {
        declared: String,
        requested: String,
    },

    #[error("Invalid key length")]
    InvalidKeyLength,

    #[error("Invalid message length")]
    InvalidMessageLength,

    #[error(
        "Cryptographic verification failed: the key or post-decryption instructions \
         differ from those used to seal the message, or the ciphertext was modified"
    )]
    CryptographicVerificationFailure,

    #[error("Malformed serialized data")]
    MalformedData,

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("Encryption failed: {0}")]
    Encryption(String),
}

pub type Result<T> = std::result::Result<T, SeedSealError>;
