//! kepub-engine: recover the master key by trial, then rewrite the book
//!
//! Pipeline:
//! ```text
//! serials × seeds → derive master key → verify against one probe entry   (search, verify)
//!   └── first accepted key → every keyed entry: unwrap content key →
//!       decrypt → unpad → write; all other entries copied unchanged      (transcode)
//! ```
//!
//! The two phases never overlap and the master key is immutable once found.
//! Entries are processed strictly in stored order so the output is
//! reproducible.

pub mod pipeline;
pub mod search;
pub mod transcode;
pub mod verify;

#[cfg(test)]
mod fixtures;

pub use pipeline::{decrypt_volume, VolumeJob, VolumeOutcome};
pub use search::{candidates, find_master_key, search, KeyMatch};
pub use transcode::{transcode, ProgressFn};
pub use verify::{select_probe_entry, verify, verify_payload, Candidate, ProbeEntry};
