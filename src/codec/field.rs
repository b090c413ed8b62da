// Credvault — Field Encryption
//
// AES in full-block CFB mode, base64 (standard alphabet) output so the
// ciphertext fits a TEXT column. The key length picks AES-128/192/256.
//
// SECURITY: the IV is fixed and shared by every encryption under a key. This
// keeps existing stored ciphertext readable, but identical plaintexts produce
// identical ciphertexts. A per-field random IV would need a storage format
// change and a re-encryption pass.

use std::fmt;

use aes::{Aes128, Aes192, Aes256};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use cfb_mode::{Decryptor, Encryptor};
use zeroize::Zeroizing;

use super::CodecError;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Initialization vector used for every field. Not secret.
const FIELD_IV: [u8; 16] = [35, 46, 57, 24, 85, 35, 24, 74, 87, 35, 88, 98, 66, 32, 14, 5];

#[derive(Clone, Copy)]
enum Direction {
    Encrypt,
    Decrypt,
}

// ─── Codec ───────────────────────────────────────────────────────────────────

/// A field codec bound to one static key.
///
/// The key is validated once at construction and zeroized on drop.
#[derive(Clone)]
pub struct FieldCodec {
    key: Zeroizing<Vec<u8>>,
}

impl FieldCodec {
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, CodecError> {
        let key = key.as_ref();
        check_key(key)?;
        Ok(Self {
            key: Zeroizing::new(key.to_vec()),
        })
    }

    /// Encrypt a single UTF-8 field and return it base64-encoded.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CodecError> {
        let mut buf = plaintext.as_bytes().to_vec();
        apply_keystream(&self.key, &mut buf, Direction::Encrypt)?;
        Ok(BASE64.encode(buf))
    }

    /// Decode and decrypt a single field produced by [`FieldCodec::encrypt`].
    pub fn decrypt(&self, ciphertext: &str) -> Result<String, CodecError> {
        let mut buf = BASE64.decode(ciphertext)?;
        apply_keystream(&self.key, &mut buf, Direction::Decrypt)?;
        String::from_utf8(buf).map_err(|_| CodecError::InvalidUtf8)
    }
}

impl fmt::Debug for FieldCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCodec")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Encrypt `plaintext` under `key` without keeping a codec around.
pub fn encrypt(plaintext: &str, key: &str) -> Result<String, CodecError> {
    FieldCodec::new(key)?.encrypt(plaintext)
}

/// Decrypt `ciphertext` under `key` without keeping a codec around.
pub fn decrypt(ciphertext: &str, key: &str) -> Result<String, CodecError> {
    FieldCodec::new(key)?.decrypt(ciphertext)
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn check_key(key: &[u8]) -> Result<(), CodecError> {
    match key.len() {
        16 | 24 | 32 => Ok(()),
        n => Err(CodecError::InvalidKeyLength(n)),
    }
}

fn apply_keystream(key: &[u8], buf: &mut [u8], direction: Direction) -> Result<(), CodecError> {
    let invalid = |_| CodecError::InvalidKeyLength(key.len());

    match (key.len(), direction) {
        (16, Direction::Encrypt) => Encryptor::<Aes128>::new_from_slices(key, &FIELD_IV)
            .map_err(invalid)?
            .encrypt(buf),
        (16, Direction::Decrypt) => Decryptor::<Aes128>::new_from_slices(key, &FIELD_IV)
            .map_err(invalid)?
            .decrypt(buf),
        (24, Direction::Encrypt) => Encryptor::<Aes192>::new_from_slices(key, &FIELD_IV)
            .map_err(invalid)?
            .encrypt(buf),
        (24, Direction::Decrypt) => Decryptor::<Aes192>::new_from_slices(key, &FIELD_IV)
            .map_err(invalid)?
            .decrypt(buf),
        (32, Direction::Encrypt) => Encryptor::<Aes256>::new_from_slices(key, &FIELD_IV)
            .map_err(invalid)?
            .encrypt(buf),
        (32, Direction::Decrypt) => Decryptor::<Aes256>::new_from_slices(key, &FIELD_IV)
            .map_err(invalid)?
            .decrypt(buf),
        (n, _) => return Err(CodecError::InvalidKeyLength(n)),
    }

    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
