//! Passphrase reading functionality

use crate::error::{EncError, ErrorCategory, ErrorKind, Result};
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Prompt written to stderr before reading from the terminal.
const PROMPT: &[u8] = b"enter passphrase: ";

/// Trait for reading passphrases from various sources
pub trait PassphraseReader {
    /// Read a passphrase as bytes.
    ///
    /// Returns the passphrase wrapped in `Zeroizing` to ensure it is securely
    /// wiped from memory when dropped.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Where the passphrase comes from, decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassphraseSource {
    /// stdin is a terminal: prompt and read without echo.
    Interactive,
    /// stdin is a file or pipe: drain it.
    Piped,
}

impl PassphraseSource {
    /// Picks the source matching the current process's stdin.
    pub fn detect() -> Self {
        if io::stdin().is_terminal() {
            Self::Interactive
        } else {
            Self::Piped
        }
    }

    pub fn into_reader(self) -> Box<dyn PassphraseReader> {
        match self {
            Self::Interactive => Box::new(TerminalPassphraseReader::new()),
            Self::Piped => Box::new(PipedPassphraseReader::new(io::stdin())),
        }
    }
}

/// Returns a fixed passphrase (for testing)
pub struct ConstantPassphraseReader {
    passphrase: Zeroizing<Vec<u8>>,
}

impl ConstantPassphraseReader {
    pub fn new(passphrase: Vec<u8>) -> Self {
        Self {
            passphrase: Zeroizing::new(passphrase),
        }
    }
}

impl PassphraseReader for ConstantPassphraseReader {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new((*self.passphrase).clone()))
    }
}

/// Reads the passphrase from a non-interactive stream.
///
/// The stream is consumed to end-of-file and decoded as text; invalid UTF-8
/// sequences become U+FFFD. Exactly one trailing `\n` is removed, so
/// `echo secret | enc ...` and `printf secret | enc ...` agree.
pub struct PipedPassphraseReader<R: Read> {
    reader: R,
}

impl<R: Read> PipedPassphraseReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> PassphraseReader for PipedPassphraseReader<R> {
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            EncError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("error reading passphrase: {}", e),
                e,
            )
        })?;

        let mut text = Zeroizing::new(String::from_utf8_lossy(&data).into_owned().into_bytes());
        if text.last() == Some(&b'\n') {
            text.pop();
        }
        Ok(text)
    }
}

/// Reads passphrase from terminal with no echo
pub struct TerminalPassphraseReader;

impl TerminalPassphraseReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TerminalPassphraseReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PassphraseReader for TerminalPassphraseReader {
    /// Read passphrase from terminal.
    ///
    /// Terminal input is limited to UTF-8 by rpassword. rpassword also drops
    /// the terminating newline.
    fn read_passphrase(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        if !io::stdin().is_terminal() {
            return Err(EncError::with_kind(
                ErrorCategory::User,
                ErrorKind::PassphraseUnavailable,
                "cannot read passphrase from terminal - stdin is not a terminal",
            ));
        }

        let mut stderr = io::stderr();
        stderr
            .write_all(PROMPT)
            .and_then(|()| stderr.flush())
            .map_err(|e| {
                EncError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::PassphraseUnavailable,
                    format!("failed to write prompt: {}", e),
                    e,
                )
            })?;

        // Read password *without echo*
        let passphrase = Zeroizing::new(rpassword::read_password().map_err(|e| {
            EncError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::PassphraseUnavailable,
                format!("cannot read passphrase from terminal: {}", e),
                e,
            )
        })?);

        Ok(Zeroizing::new(passphrase.as_bytes().to_vec()))
    }
}
