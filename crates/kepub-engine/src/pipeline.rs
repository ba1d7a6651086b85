//! One volume end to end: pick a probe entry, search, transcode.

use kepub_archive::{ArchiveReader, ArchiveWriter, EntryMeta};
use kepub_core::types::normalize_entry_id;
use kepub_core::{ContentKeyTable, KepubError, KepubResult, TranscodeReport};
use tracing::info;

use crate::search::{find_master_key, KeyMatch};
use crate::transcode::{transcode, ProgressFn};
use crate::verify::{select_probe_entry, ProbeEntry};

/// Inputs for decrypting one volume
#[derive(Debug, Clone)]
pub struct VolumeJob<'a> {
    pub volume_id: &'a str,
    pub user_id: &'a str,
    /// Descriptor serial first, then any extras
    pub serials: &'a [String],
    pub seeds: &'a [String],
    pub keys: &'a ContentKeyTable,
    /// Entry to verify candidates against, instead of the automatic choice
    pub probe_entry: Option<&'a str>,
}

#[derive(Debug)]
pub struct VolumeOutcome {
    pub key: KeyMatch,
    pub probe_entry: String,
    pub report: TranscodeReport,
}

/// Recover the master key for `job` and transcode `source` into `dest`.
///
/// Nothing is written to `dest` unless the key search succeeds.
pub fn decrypt_volume<R, W>(
    job: &VolumeJob<'_>,
    source: &mut R,
    dest: &mut W,
    progress: Option<&ProgressFn>,
) -> KepubResult<VolumeOutcome>
where
    R: ArchiveReader + ?Sized,
    W: ArchiveWriter + ?Sized,
{
    if job.keys.is_empty() {
        return Err(KepubError::NoContentKeys(job.volume_id.to_string()));
    }

    let entries = source.list_entries();
    let probe = match job.probe_entry {
        Some(name) => pinned_probe(&entries, job.keys, name)?,
        None => select_probe_entry(&entries, job.keys)
            .ok_or_else(|| KepubError::NoVerifiableEntry(job.volume_id.to_string()))?,
    };
    info!(
        volume = job.volume_id,
        entry = %probe.entry.name,
        candidates = job.serials.len() * job.seeds.len(),
        "searching for master key"
    );

    let key = find_master_key(
        job.serials,
        job.user_id,
        &probe.entry.name,
        &probe.encrypted_key,
        job.seeds,
        source,
    )?;

    let report = transcode(source, dest, &key.master_key, job.keys, progress)?;
    Ok(VolumeOutcome {
        key,
        probe_entry: probe.entry.name,
        report,
    })
}

fn pinned_probe(entries: &[EntryMeta], keys: &ContentKeyTable, name: &str) -> KepubResult<ProbeEntry> {
    let wanted = normalize_entry_id(name);
    let entry = entries
        .iter()
        .find(|e| !e.is_dir && normalize_entry_id(&e.name) == wanted)
        .ok_or_else(|| KepubError::Config(format!("probe entry not in archive: {name}")))?;
    let encrypted_key = keys
        .get(&wanted)
        .ok_or_else(|| KepubError::Config(format!("probe entry has no content key: {name}")))?;
    Ok(ProbeEntry {
        entry: entry.clone(),
        encrypted_key: encrypted_key.clone(),
    })
}
