//! Shared fixtures: an encrypted book built the way the reader stores it.

#![allow(dead_code)]

use kepub_archive::{ArchiveWriter, EntryMeta, MemoryArchive};
use kepub_core::ContentKeyTable;
use kepub_crypto::{encrypt_ecb, pad, wrap_content_key, ContentKey, MasterKey, BLOCK_SIZE};

pub const SERIAL: &str = "N905B12345";
pub const USER_ID: &str = "abc123";
pub const VOLUME_ID: &str = "48f6ea8d-bb42-499b-944a-ff211dce3379";

pub const CHAPTER1: &[u8] = b"<html xmlns=\"http://www.w3.org/1999/xhtml\"><body><p>Chapter one.</p></body></html>";
pub const CHAPTER2: &[u8] = b"<html xmlns=\"http://www.w3.org/1999/xhtml\"><body><p>Chapter two.</p></body></html>";
pub const COVER: &[u8] = b"\xff\xd8\xff\xe0\x00\x10JFIF\x00\x01\x01\x00\x00\x01\x00\x01\x00\x00";
pub const CONTAINER: &[u8] = b"<?xml version=\"1.0\"?><container version=\"1.0\"/>";

/// One entry of a fixture book
pub struct Entry<'a> {
    pub name: &'a str,
    pub plaintext: &'a [u8],
    pub encrypted: bool,
}

pub fn entry<'a>(name: &'a str, plaintext: &'a [u8], encrypted: bool) -> Entry<'a> {
    Entry {
        name,
        plaintext,
        encrypted,
    }
}

/// A six-entry book: two plaintext, four encrypted.
pub fn sample_entries() -> Vec<Entry<'static>> {
    vec![
        entry("mimetype", b"application/epub+zip", false),
        entry("META-INF/container.xml", CONTAINER, false),
        entry("OEBPS/chapter1.html", CHAPTER1, true),
        entry("OEBPS/chapter2.html", CHAPTER2, true),
        entry("OEBPS/images/cover.jpg", COVER, true),
        entry("OEBPS/style.css", b"body { font-family: serif; }", true),
    ]
}

/// Encrypt `entries` under `master` into any archive writer.
///
/// Content key of entry `i` is `[0x40 + i; 16]`.
pub fn write_book<W: ArchiveWriter>(master: &MasterKey, entries: &[Entry<'_>], dest: &mut W) -> ContentKeyTable {
    let mut keys = ContentKeyTable::new();
    for (i, e) in entries.iter().enumerate() {
        let meta = EntryMeta::file(i, e.name);
        if e.encrypted {
            let content = ContentKey::from_bytes([0x40 + i as u8; 16]);
            let ciphertext = encrypt_ecb(&pad(e.plaintext, BLOCK_SIZE), content.as_bytes()).unwrap();
            keys.insert(e.name.replace('\\', "/"), wrap_content_key(&content, master).unwrap());
            dest.write_entry(&meta, &ciphertext).unwrap();
        } else {
            dest.write_entry(&meta, e.plaintext).unwrap();
        }
    }
    keys
}

pub fn memory_book(master: &MasterKey, entries: &[Entry<'_>]) -> (MemoryArchive, ContentKeyTable) {
    let mut archive = MemoryArchive::new();
    let keys = write_book(master, entries, &mut archive);
    (archive, keys)
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
