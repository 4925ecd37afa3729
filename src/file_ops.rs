//! File encryption/decryption operations
//!
//! This module ties the pipeline together: read the input, obtain the
//! passphrase, seal or open, encode or decode the container, and write the
//! result where [`output::resolve`] says it goes.

use crate::container::{self, EncodingVariant};
use crate::error::{EncError, ErrorCategory, ErrorKind, Result};
use crate::output::{self, Mode, OutputTarget};
use crate::passphrase::PassphraseReader;
use crate::secretcrypt;
use rand::{CryptoRng, RngCore};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Everything one invocation needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Operation {
    pub mode: Mode,
    pub input: PathBuf,
    /// Overrides the derived output path.
    pub output: Option<PathBuf>,
    pub variant: EncodingVariant,
    /// Send the result to stdout instead of a file.
    pub print_to_stdout: bool,
}

impl Operation {
    pub fn target(&self) -> OutputTarget {
        output::resolve(
            &self.input,
            self.mode,
            self.variant,
            self.output.as_deref(),
            self.print_to_stdout,
        )
    }
}

/// Run one operation end to end and report where the output went.
///
/// `stdout` receives the output when the resolved target is
/// [`OutputTarget::Stdout`].
pub fn run<R: RngCore + CryptoRng>(
    operation: &Operation,
    passphrase_reader: &mut dyn PassphraseReader,
    rng: &mut R,
    stdout: &mut dyn Write,
) -> Result<OutputTarget> {
    let target = operation.target();
    debug!(mode = ?operation.mode, variant = ?operation.variant, output = ?target, "resolved output");

    match operation.mode {
        Mode::Encrypt => encrypt_file(
            &operation.input,
            &target,
            operation.variant,
            passphrase_reader,
            rng,
            stdout,
        )
        .map_err(|e| e.with_context("encryption failed"))?,
        Mode::Decrypt => decrypt_file(
            &operation.input,
            &target,
            operation.variant,
            passphrase_reader,
            stdout,
        )
        .map_err(|e| e.with_context("decryption failed"))?,
    }
    Ok(target)
}

/// Encrypt a file with a passphrase
///
/// Reads plaintext from `input_path`, seals it under a fresh nonce drawn
/// from `rng`, and writes the encoded container to `target`.
pub fn encrypt_file<R: RngCore + CryptoRng>(
    input_path: &Path,
    target: &OutputTarget,
    variant: EncodingVariant,
    passphrase_reader: &mut dyn PassphraseReader,
    rng: &mut R,
    stdout: &mut dyn Write,
) -> Result<()> {
    let plaintext = Zeroizing::new(fs::read(input_path).map_err(|e| read_error(input_path, e))?);
    debug!(path = %input_path.display(), len = plaintext.len(), "read plaintext");

    let passphrase = passphrase_reader.read_passphrase()?;
    let (nonce, sealed) = secretcrypt::encrypt(&passphrase, &plaintext, rng)?;
    let (mut encoded, _suffix) = container::encode(&nonce, &sealed, variant);

    // Text containers echoed to a console get a terminating newline;
    // decoding ignores it.
    if *target == OutputTarget::Stdout && variant == EncodingVariant::Base64 {
        encoded.push(b'\n');
    }
    write_target(target, &encoded, stdout)?;
    info!(output = ?target, len = encoded.len(), "wrote encrypted container");
    Ok(())
}

/// Decrypt a file with a passphrase
///
/// Reads the container from `input_path`, opens it, and writes the
/// plaintext to `target`. Nothing is written unless authentication succeeds.
pub fn decrypt_file(
    input_path: &Path,
    target: &OutputTarget,
    variant: EncodingVariant,
    passphrase_reader: &mut dyn PassphraseReader,
    stdout: &mut dyn Write,
) -> Result<()> {
    let bytes = fs::read(input_path).map_err(|e| read_error(input_path, e))?;
    debug!(path = %input_path.display(), len = bytes.len(), "read container");

    let passphrase = passphrase_reader.read_passphrase()?;
    let container =
        container::decode(&bytes, variant).map_err(|e| e.with_context("failed to decode"))?;
    let plaintext = Zeroizing::new(
        secretcrypt::decrypt(&passphrase, &container.nonce, &container.sealed)
            .map_err(|e| e.with_context("failed to decrypt"))?,
    );

    write_target(target, &plaintext, stdout)?;
    info!(output = ?target, len = plaintext.len(), "wrote plaintext");
    Ok(())
}

fn write_target(target: &OutputTarget, contents: &[u8], stdout: &mut dyn Write) -> Result<()> {
    match target {
        OutputTarget::NamedFile(path) | OutputTarget::DerivedFile(path) => {
            write_file_atomic(path, contents)
                .map_err(|e| e.with_context(format!("failed to write to {}", path.display())))
        }
        OutputTarget::Stdout => stdout
            .write_all(contents)
            .and_then(|()| stdout.flush())
            .map_err(|e| {
                EncError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Output,
                    format!("failed to write to stdout: {}", e),
                    e,
                )
            }),
    }
}

/// Write `contents` to `path` all-or-nothing.
///
/// The data goes to a temporary file next to `path`, is flushed and
/// fsynced, and is then renamed over `path`. If anything fails, `path` is
/// left as it was. The file is created with mode 0o600 on Unix.
fn write_file_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
        output_error(format!("failed to create tempfile in {}", dir.display()), e)
    })?;

    temp_file
        .write_all(contents)
        .map_err(|e| output_error("failed to write to tempfile", e))?;
    // Flush and fsync() such that the rename later, if it succeeds, will
    // always point to a valid file.
    temp_file
        .flush()
        .map_err(|e| output_error("failed to flush tempfile", e))?;
    temp_file
        .as_file()
        .sync_all()
        .map_err(|e| output_error("failed to sync file prior to rename", e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = temp_file
            .as_file()
            .metadata()
            .map_err(|e| output_error("failed to get tempfile metadata", e))?
            .permissions();
        perms.set_mode(0o600);
        temp_file
            .as_file()
            .set_permissions(perms)
            .map_err(|e| output_error("failed to set tempfile permissions", e))?;
    }

    temp_file.persist(path).map_err(|e| {
        output_error(
            format!("failed to rename to target file {}", path.display()),
            e.error,
        )
    })?;
    Ok(())
}

fn output_error(msg: impl Into<String>, err: io::Error) -> EncError {
    let category = if err.kind() == io::ErrorKind::PermissionDenied {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    EncError::with_kind_and_source(category, ErrorKind::Output, msg, err)
}

fn read_error(path: &Path, err: io::Error) -> EncError {
    let category = if err.kind() == io::ErrorKind::NotFound {
        ErrorCategory::User
    } else {
        ErrorCategory::Internal
    };
    EncError::with_kind_and_source(
        category,
        ErrorKind::Input,
        format!("failed to read from {}", path.display()),
        err,
    )
}
