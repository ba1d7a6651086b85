//! Book transcoding: decrypt keyed entries, copy the rest
//!
//! Entries are visited in stored order and written under their original name
//! and metadata. A keyed entry that fails to decrypt is copied as-is and
//! recorded in the report; it never aborts the pass. Archive read and write
//! failures do.

use kepub_archive::{ArchiveReader, ArchiveWriter, EntryMeta};
use kepub_core::types::normalize_entry_id;
use kepub_core::{ContentKeyTable, KepubResult, TranscodeEvent, TranscodeReport};
use kepub_crypto::{decrypt_entry, unwrap_content_key, CryptoResult, MasterKey};
use tracing::{debug, info, warn};

/// Per-entry progress callback
pub type ProgressFn = Box<dyn Fn(&TranscodeEvent) + Send + Sync>;

/// Rewrite `source` into `dest`, decrypting every entry that has a content key.
pub fn transcode<R, W>(
    source: &mut R,
    dest: &mut W,
    master: &MasterKey,
    keys: &ContentKeyTable,
    progress: Option<&ProgressFn>,
) -> KepubResult<TranscodeReport>
where
    R: ArchiveReader + ?Sized,
    W: ArchiveWriter + ?Sized,
{
    let entries = source.list_entries();
    let total = entries.len();
    let mut report = TranscodeReport::default();

    for (index, meta) in entries.iter().enumerate() {
        let raw = source.read_entry(meta)?;

        let encrypted_key = if meta.is_dir {
            None
        } else {
            keys.get(&normalize_entry_id(&meta.name))
        };

        let (data, event) = match encrypted_key {
            None => {
                report.copied += 1;
                let event = TranscodeEvent::Copied {
                    index,
                    total,
                    name: meta.name.clone(),
                };
                (raw, event)
            }
            Some(key_b64) => match decrypt_one(meta, key_b64, master, &raw) {
                Ok(plain) => {
                    report.decrypted += 1;
                    let event = TranscodeEvent::Decrypted {
                        index,
                        total,
                        name: meta.name.clone(),
                    };
                    (plain, event)
                }
                Err(e) => {
                    warn!(entry = %meta.name, error = %e, "decryption failed, copying entry unchanged");
                    report.failed += 1;
                    report.failed_entries.push(meta.name.clone());
                    let event = TranscodeEvent::Failed {
                        index,
                        total,
                        name: meta.name.clone(),
                        reason: e.to_string(),
                    };
                    (raw, event)
                }
            },
        };

        dest.write_entry(meta, &data)?;
        if let Some(cb) = progress {
            cb(&event);
        }
    }

    info!(
        decrypted = report.decrypted,
        copied = report.copied,
        failed = report.failed,
        "transcode complete"
    );
    Ok(report)
}

fn decrypt_one(
    meta: &EntryMeta,
    key_b64: &str,
    master: &MasterKey,
    ciphertext: &[u8],
) -> CryptoResult<Vec<u8>> {
    let content_key = unwrap_content_key(key_b64, master)?;
    let plain = decrypt_entry(ciphertext, &content_key)?;
    debug!(entry = %meta.name, bytes = plain.len(), "decrypted entry");
    Ok(plain)
}
