//! Trailing byte-count padding (the PKCS#7 layout).
//!
//! Removal reads only the final byte; the padding bytes before it are not
//! checked.

use crate::error::{CryptoError, CryptoResult};

/// Pad `data` to a multiple of `block_size` by appending N bytes of value N.
///
/// Always appends at least one byte, so already-aligned input grows by a full block.
pub fn pad(data: &[u8], block_size: usize) -> Vec<u8> {
    assert!(
        (1..=255).contains(&block_size),
        "block size must fit in a padding byte"
    );
    let n = block_size - data.len() % block_size;
    let mut out = Vec::with_capacity(data.len() + n);
    out.extend_from_slice(data);
    out.resize(data.len() + n, n as u8);
    out
}

/// Strip the number of trailing bytes named by the last byte.
pub fn unpad(data: &[u8]) -> CryptoResult<&[u8]> {
    let Some(&last) = data.last() else {
        return Err(CryptoError::InvalidCiphertextLength { len: 0 });
    };
    let n = last as usize;
    if n > data.len() {
        return Err(CryptoError::Padding {
            pad: n,
            len: data.len(),
        });
    }
    Ok(&data[..data.len() - n])
}
