use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Failures of a single decryption attempt.
///
/// All of these are expected when a candidate key is wrong or an entry is
/// damaged; callers treat them as "try the next candidate" or "pass the entry
/// through", never as fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("encrypted key is not valid base64: {0}")]
    InvalidBase64(String),

    #[error("ciphertext length {len} is not a positive multiple of the block size")]
    InvalidCiphertextLength { len: usize },

    #[error("key has wrong size: {len} bytes (expected 16)")]
    InvalidKeyLength { len: usize },

    #[error("padding count {pad} exceeds buffer length {len}")]
    Padding { pad: usize, len: usize },
}
