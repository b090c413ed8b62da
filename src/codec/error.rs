// Credvault — Codec error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid key length: {0} bytes (expected 16, 24 or 32)")]
    InvalidKeyLength(usize),

    #[error("Invalid ciphertext encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("Decrypted field is not valid UTF-8")]
    InvalidUtf8,
}
