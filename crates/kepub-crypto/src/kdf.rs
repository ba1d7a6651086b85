//! Master-key derivation: seed constant + device serial + user id → 128-bit key
//!
//! ```text
//! device_digest = hex(SHA-256(seed || serial))
//! user_digest   = hex(SHA-256(device_digest || user_id))
//! master_key    = unhex(user_digest[32..64])
//! ```
//!
//! Both intermediate digests are hashed as their lowercase hex rendering,
//! not as raw bytes.

use sha2::{Digest, Sha256};

use crate::keys::MasterKey;
use crate::KEY_SIZE;

/// Derive the master key for one (seed, serial, user id) candidate.
///
/// Empty inputs are accepted and still produce a deterministic key.
pub fn derive_master_key(seed: &str, serial: &str, user_id: &str) -> MasterKey {
    let device_digest = hex::encode(sha256(&[seed.as_bytes(), serial.as_bytes()]));
    let user_digest = sha256(&[device_digest.as_bytes(), user_id.as_bytes()]);

    // Hex characters 32..64 of the digest are raw bytes 16..32
    let mut bytes = [0u8; KEY_SIZE];
    bytes.copy_from_slice(&user_digest[KEY_SIZE..]);
    MasterKey::from_bytes(bytes)
}

fn sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}
