pub mod derivation;
pub mod encoding;
pub mod error;
pub mod instructions;
pub mod options;
pub mod packaged;
pub mod sealing;
pub mod secret;
pub mod sensitive;
pub mod signing;
pub mod symmetric;

pub use derivation::generate_seed;
pub use error::{Result, SeedSealError};
pub use instructions::UnsealingInstructions;
pub use options::{DerivationOptions, HashFunction, KeyType};
pub use packaged::PackagedSealedMessage;
pub use sealing::{SealingKey, UnsealingKey};
pub use secret::Secret;
pub use sensitive::SecretBuffer;
pub use signing::{SignatureVerificationKey, SigningKey};
pub use symmetric::SymmetricKey;
