//! Standalone helper for the privddns key and tokens.
//!
//! Generates the key file, and encrypts or decrypts a short text (usually an
//! IP address) the same way the daemon does.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use privddns::crypto::{self, CryptoError, DEFAULT_KEY_FILE};

const DEFAULT_TEXT: &str = "123.123.123.123";

/// Compress + AES-GCM encrypt a short text (IP) for a DNS TXT record
#[derive(Parser)]
#[command(name = "privddns-crypt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the local AES key file
    #[arg(short, long, default_value = DEFAULT_KEY_FILE)]
    key_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new AES-256 key file
    GenerateKey {
        /// Overwrite an existing key file
        #[arg(long)]
        force: bool,
    },

    /// Encrypt the given text and print the token
    Encrypt {
        #[arg(default_value = DEFAULT_TEXT, allow_hyphen_values = true)]
        text: String,
    },

    /// Decrypt a base64 token and print the plaintext
    Decrypt {
        #[arg(allow_hyphen_values = true)]
        token: String,
    },
}

fn execute(cli: Cli) -> Result<String, CryptoError> {
    match cli.command {
        Commands::GenerateKey { force } => {
            crypto::generate_key(&cli.key_file, force)?;
            Ok(format!("Key generated and saved to {}", cli.key_file.display()))
        }

        Commands::Encrypt { text } => {
            let key = crypto::load_key(&cli.key_file)?;
            crypto::encrypt_text(&key, &text).map(String::from)
        }

        Commands::Decrypt { token } => {
            let key = crypto::load_key(&cli.key_file)?;
            crypto::decrypt_text(&key, &token)
        }
    }
}

fn main() -> ExitCode {
    privddns::init_logging();

    match execute(Cli::parse()) {
        Ok(line) => {
            println!("{}", line);
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
