use clap::{Parser, Subcommand};

use seedseal::{
    PackagedSealedMessage, Secret, SignatureVerificationKey, SigningKey, SymmetricKey,
    UnsealingKey,
};

#[derive(Parser)]
#[command(name = "seedseal")]
#[command(about = "Deterministic seeded cryptography: derive, seal, unseal, sign, verify")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive a secret from a seed and print it as JSON
    Secret {
        seed: String,
        #[arg(default_value = "")]
        derivation_options_json: String,
    },
    /// Seal a message with a seed-derived symmetric key
    Seal {
        seed: String,
        message: String,
        #[arg(default_value = "")]
        derivation_options_json: String,
        #[arg(long, default_value = "")]
        instructions: String,
    },
    /// Unseal a packaged message (as printed by `seal`) with its seed
    Unseal {
        seed: String,
        packaged_message_json: String,
    },
    /// Seal a message to a seed-derived public sealing key
    SealAsymmetric {
        seed: String,
        message: String,
        #[arg(default_value = "")]
        derivation_options_json: String,
        #[arg(long, default_value = "")]
        instructions: String,
    },
    /// Unseal an asymmetric packaged message with its seed
    UnsealAsymmetric {
        seed: String,
        packaged_message_json: String,
    },
    /// Sign a message with a seed-derived signing key
    Sign {
        seed: String,
        message: String,
        #[arg(default_value = "")]
        derivation_options_json: String,
    },
    /// Verify a detached signature against a verification key (JSON)
    Verify {
        verification_key_json: String,
        message: String,
        signature_hex: String,
    },
}

fn run(command: Commands) -> seedseal::Result<()> {
    match command {
        Commands::Secret {
            seed,
            derivation_options_json,
        } => {
            let secret = Secret::derive_from_seed(&seed, &derivation_options_json)?;
            println!("{}", secret.to_json()?);
        }
        Commands::Seal {
            seed,
            message,
            derivation_options_json,
            instructions,
        } => {
            let key = SymmetricKey::derive_from_seed(&seed, &derivation_options_json)?;
            let packaged = key.seal(message.as_bytes(), &instructions)?;
            println!("{}", packaged.to_json()?);
        }
        Commands::Unseal {
            seed,
            packaged_message_json,
        } => {
            let packaged = PackagedSealedMessage::from_json(&packaged_message_json)?;
            let plaintext = SymmetricKey::unseal_from_seed(&packaged, &seed)?;
            println!("{}", plaintext.to_utf8()?);
        }
        Commands::SealAsymmetric {
            seed,
            message,
            derivation_options_json,
            instructions,
        } => {
            let sealing_key = UnsealingKey::derive_from_seed(&seed, &derivation_options_json)?
                .to_sealing_key();
            let packaged = sealing_key.seal(message.as_bytes(), &instructions)?;
            println!("{}", packaged.to_json()?);
        }
        Commands::UnsealAsymmetric {
            seed,
            packaged_message_json,
        } => {
            let packaged = PackagedSealedMessage::from_json(&packaged_message_json)?;
            let plaintext = UnsealingKey::unseal_from_seed(&packaged, &seed)?;
            println!("{}", plaintext.to_utf8()?);
        }
        Commands::Sign {
            seed,
            message,
            derivation_options_json,
        } => {
            let signing_key = SigningKey::derive_from_seed(&seed, &derivation_options_json)?;
            let signature = signing_key.generate_signature(message.as_bytes())?;
            println!("{}", seedseal::encoding::to_hex(&signature));
            println!(
                "{}",
                signing_key.to_signature_verification_key().to_json()?
            );
        }
        Commands::Verify {
            verification_key_json,
            message,
            signature_hex,
        } => {
            let verification_key = SignatureVerificationKey::from_json(&verification_key_json)?;
            let signature = seedseal::encoding::from_hex(&signature_hex)?;
            if verification_key.verify(message.as_bytes(), &signature) {
                println!("valid");
            } else {
                println!("INVALID");
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli.command) {
        eprintln!("seedseal: {error}");
        std::process::exit(1);
    }
}
