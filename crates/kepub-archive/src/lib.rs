//! kepub-archive: flat entry-name → bytes view of a book container
//!
//! Readers list entries in stored order and hand out raw (decompressed)
//! bytes; writers append entries in the order they are given and must be
//! finished to produce a valid container.
//!
//! - `zipfile`: ZIP/EPUB containers on disk or in any `Read + Seek`
//! - `memory`: in-memory container, used for fixtures and tests

pub mod error;
pub mod memory;
pub mod zipfile;

pub use error::{ArchiveError, ArchiveResult};
pub use memory::MemoryArchive;
pub use zipfile::{ZipArchiveReader, ZipArchiveWriter};

/// Compression applied to an entry when it is written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    Stored,
    Deflated,
}

/// Metadata of one archive entry, carried unchanged from reader to writer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    /// Position in the source archive
    pub index: usize,
    /// Entry name exactly as stored
    pub name: String,
    pub is_dir: bool,
    pub compression: Compression,
    pub modified: Option<zip::DateTime>,
    pub unix_mode: Option<u32>,
}

impl EntryMeta {
    /// A stored file entry with no timestamp or mode
    pub fn file(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            is_dir: false,
            compression: Compression::Stored,
            modified: None,
            unix_mode: None,
        }
    }
}

/// Ordered, random-access view of a source container
pub trait ArchiveReader {
    /// All entries in stored order
    fn list_entries(&self) -> Vec<EntryMeta>;

    /// Raw bytes of one entry
    fn read_entry(&mut self, entry: &EntryMeta) -> ArchiveResult<Vec<u8>>;

    /// Raw bytes of the first entry stored under `name`
    fn read_entry_by_name(&mut self, name: &str) -> ArchiveResult<Vec<u8>> {
        let entry = self
            .list_entries()
            .into_iter()
            .find(|e| e.name == name)
            .ok_or_else(|| ArchiveError::EntryNotFound(name.to_string()))?;
        self.read_entry(&entry)
    }
}

/// Append-only destination container
pub trait ArchiveWriter {
    /// Append one entry; entries must arrive in source order
    fn write_entry(&mut self, entry: &EntryMeta, data: &[u8]) -> ArchiveResult<()>;
}
