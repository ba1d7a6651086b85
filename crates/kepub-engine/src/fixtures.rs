//! Encrypted book fixtures for unit tests

use kepub_archive::MemoryArchive;
use kepub_core::ContentKeyTable;
use kepub_crypto::{encrypt_ecb, pad, wrap_content_key, ContentKey, MasterKey, BLOCK_SIZE};

pub const SERIAL: &str = "N905B12345";
pub const USER_ID: &str = "abc123";

/// Build a book whose `encrypted` entries are protected under `master`.
///
/// Each encrypted entry gets its own content key; entries are added in the given order.
pub fn build_book(
    master: &MasterKey,
    entries: &[(&str, &[u8], bool)],
) -> (MemoryArchive, ContentKeyTable) {
    let mut archive = MemoryArchive::new();
    let mut keys = ContentKeyTable::new();
    for (i, (name, plaintext, encrypted)) in entries.iter().enumerate() {
        if *encrypted {
            let content = ContentKey::from_bytes([i as u8 + 1; 16]);
            let ciphertext = encrypt_ecb(&pad(plaintext, BLOCK_SIZE), content.as_bytes()).unwrap();
            keys.insert(name.replace('\\', "/"), wrap_content_key(&content, master).unwrap());
            archive.push(*name, ciphertext);
        } else {
            archive.push(*name, plaintext.to_vec());
        }
    }
    (archive, keys)
}
