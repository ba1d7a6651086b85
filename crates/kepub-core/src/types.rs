use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entry name → base64-encoded encrypted content key, for one volume.
pub type ContentKeyTable = BTreeMap<String, String>;

/// Normalize an archive entry name for content-key lookup.
///
/// Only used for the lookup; entries are always written under their original name.
pub fn normalize_entry_id(name: &str) -> String {
    name.replace('\\', "/")
}

/// Outcome counts of one transcoding pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeReport {
    /// Entries decrypted and written as plaintext
    pub decrypted: usize,
    /// Entries without a content key, copied unchanged
    pub copied: usize,
    /// Keyed entries that failed to decrypt and were copied unchanged
    pub failed: usize,
    /// Names of the entries counted in `failed`, in archive order
    #[serde(default)]
    pub failed_entries: Vec<String>,
}

impl TranscodeReport {
    pub fn total(&self) -> usize {
        self.decrypted + self.copied + self.failed
    }

    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// What happened to a single entry during transcoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscodeEvent {
    Decrypted {
        index: usize,
        total: usize,
        name: String,
    },
    Copied {
        index: usize,
        total: usize,
        name: String,
    },
    Failed {
        index: usize,
        total: usize,
        name: String,
        reason: String,
    },
}

impl TranscodeEvent {
    /// Zero-based position of the entry in the source archive
    pub fn index(&self) -> usize {
        match self {
            Self::Decrypted { index, .. } | Self::Copied { index, .. } | Self::Failed { index, .. } => {
                *index
            }
        }
    }

    pub fn total(&self) -> usize {
        match self {
            Self::Decrypted { total, .. } | Self::Copied { total, .. } | Self::Failed { total, .. } => {
                *total
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Decrypted { name, .. } | Self::Copied { name, .. } | Self::Failed { name, .. } => {
                name
            }
        }
    }
}
