//! In-memory container: an ordered list of (metadata, bytes)

use crate::error::{ArchiveError, ArchiveResult};
use crate::{ArchiveReader, ArchiveWriter, EntryMeta};

#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    entries: Vec<(EntryMeta, Vec<u8>)>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stored file entry
    pub fn push(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        let meta = EntryMeta::file(self.entries.len(), name);
        self.entries.push((meta, data.into()));
    }

    /// Builder form of [`MemoryArchive::push`]
    pub fn with_entry(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.push(name, data);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in stored order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(m, _)| m.name.as_str()).collect()
    }

    /// Bytes of the first entry named `name`
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(m, _)| m.name == name)
            .map(|(_, data)| data.as_slice())
    }

    pub fn entries(&self) -> &[(EntryMeta, Vec<u8>)] {
        &self.entries
    }
}

impl ArchiveReader for MemoryArchive {
    fn list_entries(&self) -> Vec<EntryMeta> {
        self.entries.iter().map(|(m, _)| m.clone()).collect()
    }

    fn read_entry(&mut self, entry: &EntryMeta) -> ArchiveResult<Vec<u8>> {
        self.entries
            .get(entry.index)
            .filter(|(m, _)| m.name == entry.name)
            .map(|(_, data)| data.clone())
            .ok_or_else(|| ArchiveError::EntryNotFound(entry.name.clone()))
    }
}

impl ArchiveWriter for MemoryArchive {
    fn write_entry(&mut self, entry: &EntryMeta, data: &[u8]) -> ArchiveResult<()> {
        let mut meta = entry.clone();
        meta.index = self.entries.len();
        self.entries.push((meta, data.to_vec()));
        Ok(())
    }
}
