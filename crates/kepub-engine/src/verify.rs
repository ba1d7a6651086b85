//! Candidate verification: does this (seed, serial) pair open the book?
//!
//! The check decrypts one probe entry end to end (content key, payload,
//! padding) and accepts the candidate only when the result carries a known
//! plaintext signature. Decryption failures reject the candidate; archive
//! failures are returned to the caller.

use kepub_archive::{ArchiveReader, EntryMeta};
use kepub_core::types::normalize_entry_id;
use kepub_core::{ContentKeyTable, KepubResult};
use kepub_crypto::{
    decrypt_entry, derive_master_key, detect_signature, unwrap_content_key, CryptoResult,
    MasterKey,
};
use tracing::debug;

/// Extensions of entries that usually decrypt to a recognized signature
const PROBE_EXTENSIONS: [&str; 8] = ["html", "xhtml", "htm", "xml", "opf", "ncx", "jpg", "jpeg"];

/// One point of the search space
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub seed: String,
    pub serial: String,
}

impl Candidate {
    pub fn new(seed: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            serial: serial.into(),
        }
    }
}

/// The entry used to test candidates, with its encrypted content key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeEntry {
    pub entry: EntryMeta,
    pub encrypted_key: String,
}

/// Pick the probe entry from the archive listing.
///
/// Prefers the first keyed entry (in stored order) whose extension suggests a
/// recognizable plaintext; otherwise the first keyed entry at all.
pub fn select_probe_entry(entries: &[EntryMeta], keys: &ContentKeyTable) -> Option<ProbeEntry> {
    let keyed = || {
        entries.iter().filter(|e| !e.is_dir).filter_map(|e| {
            keys.get(&normalize_entry_id(&e.name))
                .map(|k| ProbeEntry {
                    entry: e.clone(),
                    encrypted_key: k.clone(),
                })
        })
    };

    keyed()
        .find(|p| has_probe_extension(&p.entry.name))
        .or_else(|| keyed().next())
}

fn has_probe_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| {
            PROBE_EXTENSIONS
                .iter()
                .any(|p| p.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

/// Test one candidate against an already-read probe payload.
pub fn verify_payload(
    candidate: &Candidate,
    user_id: &str,
    encrypted_key_b64: &str,
    payload: &[u8],
) -> Option<MasterKey> {
    let master = derive_master_key(&candidate.seed, &candidate.serial, user_id);

    match open_payload(&master, encrypted_key_b64, payload) {
        Ok(plain) => match detect_signature(&plain) {
            Some(signature) => {
                debug!(seed = %candidate.seed, serial = %candidate.serial, %signature, "candidate accepted");
                Some(master)
            }
            None => {
                debug!(seed = %candidate.seed, serial = %candidate.serial, "candidate rejected: no signature");
                None
            }
        },
        Err(e) => {
            debug!(seed = %candidate.seed, serial = %candidate.serial, error = %e, "candidate rejected");
            None
        }
    }
}

/// Test one candidate, reading the probe entry `entry_id` from the archive.
pub fn verify<R: ArchiveReader + ?Sized>(
    seed: &str,
    serial: &str,
    user_id: &str,
    entry_id: &str,
    encrypted_key_b64: &str,
    archive: &mut R,
) -> KepubResult<Option<MasterKey>> {
    let payload = archive.read_entry_by_name(entry_id)?;
    Ok(verify_payload(
        &Candidate::new(seed, serial),
        user_id,
        encrypted_key_b64,
        &payload,
    ))
}

fn open_payload(master: &MasterKey, encrypted_key_b64: &str, payload: &[u8]) -> CryptoResult<Vec<u8>> {
    let content_key = unwrap_content_key(encrypted_key_b64, master)?;
    decrypt_entry(payload, &content_key)
}
