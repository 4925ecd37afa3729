//! Output path resolution
//!
//! Pure decisions about where a result goes. Nothing here touches the
//! filesystem.

use crate::container::EncodingVariant;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Suffix appended when decrypting a file whose name does not carry the
/// encrypted-file suffix, so the input is never overwritten.
pub const DECODED_SUFFIX: &str = ".dec";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Encrypt,
    Decrypt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Path given explicitly by the caller.
    NamedFile(PathBuf),
    /// Path derived from the input path.
    DerivedFile(PathBuf),
    Stdout,
}

impl OutputTarget {
    /// The destination path, if the target is a file.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NamedFile(path) | Self::DerivedFile(path) => Some(path.as_path()),
            Self::Stdout => None,
        }
    }
}

/// Decide where the output of an operation goes.
///
/// Encrypting writes to `explicit_output` if given. Otherwise a Base64
/// container may be echoed to stdout on request, and anything else goes to
/// the input path plus the variant's suffix.
///
/// Decrypting honors `print_to_stdout` first, then `explicit_output`, then
/// strips the variant's suffix from the input path, falling back to
/// appending [`DECODED_SUFFIX`] when there is nothing to strip.
pub fn resolve(
    input: &Path,
    mode: Mode,
    variant: EncodingVariant,
    explicit_output: Option<&Path>,
    print_to_stdout: bool,
) -> OutputTarget {
    match mode {
        Mode::Encrypt => {
            if let Some(path) = explicit_output {
                OutputTarget::NamedFile(path.to_path_buf())
            } else if print_to_stdout && variant == EncodingVariant::Base64 {
                OutputTarget::Stdout
            } else {
                OutputTarget::DerivedFile(append_suffix(input, variant.suffix()))
            }
        }
        Mode::Decrypt => {
            if print_to_stdout {
                OutputTarget::Stdout
            } else if let Some(path) = explicit_output {
                OutputTarget::NamedFile(path.to_path_buf())
            } else {
                let derived = strip_suffix(input, variant.suffix())
                    .unwrap_or_else(|| append_suffix(input, DECODED_SUFFIX));
                OutputTarget::DerivedFile(derived)
            }
        }
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Remove `suffix` from the final component of `path`. Returns `None` if
/// the file name does not end in `suffix` or would become empty.
fn strip_suffix(path: &Path, suffix: &str) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let stem = name.strip_suffix(suffix)?;
    if stem.is_empty() {
        return None;
    }
    Some(path.with_file_name(stem))
}
