//! kepub-crypto: key recovery primitives for reader-encrypted books
//!
//! Key hierarchy:
//! ```text
//! Seed constant + device serial + user id
//!   └── Master Key (128-bit, SHA-256 ∘ SHA-256, second half of the hex digest)
//!       └── Content Key (per entry, AES-128-ECB encrypted, base64 in the reader database)
//!           └── Entry payload: AES-128-ECB, trailing byte-count padding
//! ```
//!
//! Nothing here touches the archive or the database; every function is a
//! pure function of its inputs.

pub mod block;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod padding;
pub mod signature;

pub use block::{decrypt_ecb, encrypt_ecb};
pub use error::{CryptoError, CryptoResult};
pub use kdf::derive_master_key;
pub use keys::{decrypt_entry, unwrap_content_key, wrap_content_key, ContentKey, MasterKey};
pub use padding::{pad, unpad};
pub use signature::{detect_signature, Signature};

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Size of master and content keys in bytes (128-bit)
pub const KEY_SIZE: usize = 16;
