//! Master and content keys, content-key unwrapping, entry decryption

use base64::{engine::general_purpose::STANDARD, Engine};
use zeroize::Zeroize;

use crate::block::{decrypt_ecb, encrypt_ecb};
use crate::error::{CryptoError, CryptoResult};
use crate::padding::unpad;
use crate::KEY_SIZE;

/// A 128-bit device/user master key. Zeroized on drop.
#[derive(Clone)]
pub struct MasterKey {
    bytes: [u8; KEY_SIZE],
}

impl MasterKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Lowercase hex rendering, for explicit display only
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl Drop for MasterKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// A per-entry 128-bit content key. Zeroized on drop.
#[derive(Clone)]
pub struct ContentKey {
    bytes: [u8; KEY_SIZE],
}

impl ContentKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for ContentKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Decode and decrypt a base64 content key under the master key.
///
/// The decrypted key is used as-is (no padding is stripped) and must be exactly 16 bytes.
pub fn unwrap_content_key(encrypted_b64: &str, master: &MasterKey) -> CryptoResult<ContentKey> {
    let encrypted = STANDARD
        .decode(encrypted_b64.trim())
        .map_err(|e| CryptoError::InvalidBase64(e.to_string()))?;

    let mut plain = decrypt_ecb(&encrypted, master.as_bytes())?;
    if plain.len() != KEY_SIZE {
        let len = plain.len();
        plain.zeroize();
        return Err(CryptoError::InvalidKeyLength { len });
    }

    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&plain);
    plain.zeroize();
    Ok(ContentKey::from_bytes(bytes))
}

/// Encrypt a content key under the master key and encode it as base64.
///
/// Inverse of [`unwrap_content_key`]; used to build fixtures.
pub fn wrap_content_key(content: &ContentKey, master: &MasterKey) -> CryptoResult<String> {
    let encrypted = encrypt_ecb(content.as_bytes(), master.as_bytes())?;
    Ok(STANDARD.encode(encrypted))
}

/// Decrypt an entry payload under its content key and strip the padding.
pub fn decrypt_entry(ciphertext: &[u8], key: &ContentKey) -> CryptoResult<Vec<u8>> {
    let mut plain = decrypt_ecb(ciphertext, key.as_bytes())?;
    let keep = unpad(&plain)?.len();
    plain.truncate(keep);
    Ok(plain)
}
