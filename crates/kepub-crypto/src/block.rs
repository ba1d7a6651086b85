//! AES-128 in electronic-codebook mode: every 16-byte block is transformed
//! independently with the same key, no IV, no chaining.
//!
//! The same primitive decrypts both content keys (under the master key) and
//! entry payloads (under a content key).

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;

use crate::error::{CryptoError, CryptoResult};
use crate::{BLOCK_SIZE, KEY_SIZE};

/// Decrypt `ciphertext` under `key`.
///
/// The ciphertext length must be a positive multiple of the block size.
pub fn decrypt_ecb(ciphertext: &[u8], key: &[u8; KEY_SIZE]) -> CryptoResult<Vec<u8>> {
    check_length(ciphertext.len())?;
    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut buf = ciphertext.to_vec();
    for block in buf.chunks_mut(BLOCK_SIZE) {
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
    }
    Ok(buf)
}

/// Encrypt block-aligned `plaintext` under `key`.
///
/// The books are only ever decrypted; this exists to build fixtures and to
/// re-wrap keys in tests. Callers pad first (see [`crate::pad`]).
pub fn encrypt_ecb(plaintext: &[u8], key: &[u8; KEY_SIZE]) -> CryptoResult<Vec<u8>> {
    check_length(plaintext.len())?;
    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut buf = plaintext.to_vec();
    for block in buf.chunks_mut(BLOCK_SIZE) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }
    Ok(buf)
}

fn check_length(len: usize) -> CryptoResult<()> {
    if len == 0 || len % BLOCK_SIZE != 0 {
        return Err(CryptoError::InvalidCiphertextLength { len });
    }
    Ok(())
}
