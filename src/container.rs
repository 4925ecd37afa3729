//! On-disk container layout
//!
//! A container is the nonce followed by the sealed bytes:
//!
//! ```text
//! [12-byte nonce][ciphertext][16-byte tag]
//! ```
//!
//! There is no magic marker, version tag, or length prefix. The Base64
//! variant runs the same bytes through URL-safe base64 (with padding).
//! Which variant a file uses is never guessed from its contents.

use crate::error::{EncError, ErrorCategory, ErrorKind, Result};
use crate::secretcrypt::NONCE_LEN;
use base64::{Engine, engine::general_purpose::URL_SAFE};

/// File name suffix of raw containers.
pub const RAW_SUFFIX: &str = ".enc";

/// File name suffix of base64 containers.
pub const BASE64_SUFFIX: &str = ".b64.enc";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingVariant {
    #[default]
    Raw,
    Base64,
}

impl EncodingVariant {
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Raw => RAW_SUFFIX,
            Self::Base64 => BASE64_SUFFIX,
        }
    }
}

/// A decoded container: the nonce and the opaque sealed bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub nonce: [u8; NONCE_LEN],
    pub sealed: Vec<u8>,
}

impl Container {
    /// Raw container bytes: nonce followed by sealed bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_LEN + self.sealed.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.sealed);
        out
    }
}

/// Encode a nonce and sealed bytes, returning the bytes to write and the
/// file name suffix for the variant.
pub fn encode(
    nonce: &[u8; NONCE_LEN],
    sealed: &[u8],
    variant: EncodingVariant,
) -> (Vec<u8>, &'static str) {
    let mut raw = Vec::with_capacity(NONCE_LEN + sealed.len());
    raw.extend_from_slice(nonce);
    raw.extend_from_slice(sealed);

    let bytes = match variant {
        EncodingVariant::Raw => raw,
        EncodingVariant::Base64 => URL_SAFE.encode(&raw).into_bytes(),
    };
    (bytes, variant.suffix())
}

/// Decode container bytes read from disk.
pub fn decode(bytes: &[u8], variant: EncodingVariant) -> Result<Container> {
    let raw = match variant {
        EncodingVariant::Raw => bytes.to_vec(),
        EncodingVariant::Base64 => {
            // Line breaks are not part of the payload; console output and
            // editors tend to add them.
            let text: Vec<u8> = bytes
                .iter()
                .copied()
                .filter(|b| *b != b'\n' && *b != b'\r')
                .collect();
            URL_SAFE.decode(&text).map_err(|e| {
                EncError::with_kind_and_source(
                    ErrorCategory::User,
                    ErrorKind::Decoding,
                    format!("base64 decoding failed: {}", e),
                    e,
                )
            })?
        }
    };

    if raw.len() < NONCE_LEN {
        return Err(EncError::with_kind(
            ErrorCategory::User,
            ErrorKind::TruncatedContainer,
            format!(
                "input is {} bytes, smaller than the {}-byte nonce; likely truncated",
                raw.len(),
                NONCE_LEN
            ),
        ));
    }

    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&raw[..NONCE_LEN]);
    Ok(Container {
        nonce,
        sealed: raw[NONCE_LEN..].to_vec(),
    })
}
