//! enc CLI - Passphrase-based file encryption
//!
//! Command-line interface for encrypting and decrypting files using
//! AES-256-GCM keyed by the SHA-256 of a passphrase.

use clap::Parser;
use rand::rngs::OsRng;
use std::io;
use std::path::PathBuf;
use std::process;

use enc::container::EncodingVariant;
use enc::file_ops::{self, Operation};
use enc::logging;
use enc::output::Mode;
use enc::passphrase::PassphraseSource;

#[derive(Parser)]
#[command(name = "enc")]
#[command(version)]
#[command(
    about = "Passphrase-based file encryption.",
    long_about = "Passphrase-based file encryption.\n\n\
        The passphrase is read from the terminal without echo, or from stdin \
        when stdin is a pipe or a file."
)]
struct Cli {
    /// Path to the file to encrypt or decrypt
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Decrypt the file (default: encrypt)
    #[arg(short, long)]
    decrypt: bool,

    /// Use base64 encoding for the encrypted file
    #[arg(short = 'b', long)]
    base64: bool,

    /// Override the output path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print output to stdout (decrypted plaintext, or a base64 container)
    #[arg(short, long)]
    visual: bool,

    /// Log level used unless ENC_LOG is set
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

impl Cli {
    fn operation(&self) -> Operation {
        Operation {
            mode: if self.decrypt {
                Mode::Decrypt
            } else {
                Mode::Encrypt
            },
            input: self.file.clone(),
            output: self.output.clone(),
            variant: if self.base64 {
                EncodingVariant::Base64
            } else {
                EncodingVariant::Raw
            },
            print_to_stdout: self.visual,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let operation = cli.operation();
    let mut reader = PassphraseSource::detect().into_reader();
    let mut stdout = io::stdout().lock();

    match file_ops::run(&operation, &mut *reader, &mut OsRng, &mut stdout) {
        Ok(target) => {
            if let Some(path) = target.path() {
                tracing::info!(path = %path.display(), "done");
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e.chain_message());
            process::exit(1);
        }
    }
}
