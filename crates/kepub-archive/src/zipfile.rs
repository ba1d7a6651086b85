//! ZIP-backed reader and writer (EPUB/KEPUB books are ZIP containers)

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{ArchiveError, ArchiveResult};
use crate::{ArchiveReader, ArchiveWriter, Compression, EntryMeta};

/// Reads entries of a ZIP container in central-directory order.
///
/// Containers holding two entries with the same name are rejected with
/// [`ArchiveError::DuplicateEntries`].
pub struct ZipArchiveReader<R: Read + Seek> {
    archive: ZipArchive<R>,
    entries: Vec<EntryMeta>,
}

impl ZipArchiveReader<BufReader<File>> {
    pub fn open(path: &Path) -> ArchiveResult<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> ZipArchiveReader<R> {
    pub fn new(mut reader: R) -> ArchiveResult<Self> {
        let records = central_directory_records(&mut reader)?;
        let mut archive = ZipArchive::new(reader)?;
        if let Some(records) = records {
            if records != archive.len() as u64 {
                return Err(ArchiveError::DuplicateEntries {
                    records,
                    unique: archive.len(),
                });
            }
        }
        let mut entries = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            // Raw access: metadata only, no decompression
            let file = archive.by_index_raw(index)?;
            entries.push(EntryMeta {
                index,
                name: file.name().to_string(),
                is_dir: file.is_dir(),
                compression: match file.compression() {
                    CompressionMethod::Stored => Compression::Stored,
                    _ => Compression::Deflated,
                },
                modified: file.last_modified(),
                unix_mode: file.unix_mode(),
            });
        }
        tracing::debug!(entries = entries.len(), "opened zip archive");
        Ok(Self { archive, entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<R: Read + Seek> ArchiveReader for ZipArchiveReader<R> {
    fn list_entries(&self) -> Vec<EntryMeta> {
        self.entries.clone()
    }

    fn read_entry(&mut self, entry: &EntryMeta) -> ArchiveResult<Vec<u8>> {
        let mut file = self.archive.by_index(entry.index)?;
        // Do not trust the advertised size for allocation
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// Entry count from the end-of-central-directory record, rewinding the reader.
///
/// `None` when the record is missing or defers to ZIP64.
fn central_directory_records<R: Read + Seek>(reader: &mut R) -> ArchiveResult<Option<u64>> {
    const SIGNATURE: [u8; 4] = [0x50, 0x4b, 0x05, 0x06];
    const RECORD_LEN: u64 = 22;

    let len = reader.seek(SeekFrom::End(0))?;
    let tail_len = len.min(RECORD_LEN + u64::from(u16::MAX));
    reader.seek(SeekFrom::Start(len - tail_len))?;
    let mut tail = vec![0u8; tail_len as usize];
    reader.read_exact(&mut tail)?;
    reader.seek(SeekFrom::Start(0))?;

    let Some(pos) = tail.windows(4).rposition(|w| w == SIGNATURE) else {
        return Ok(None);
    };
    // total entries: u16 at offset 10
    let Some(&[lo, hi]) = tail.get(pos + 10..pos + 12) else {
        return Ok(None);
    };
    let total = u16::from_le_bytes([lo, hi]);
    Ok((total != u16::MAX).then_some(u64::from(total)))
}

/// Writes entries to a new ZIP container, preserving per-entry metadata.
pub struct ZipArchiveWriter<W: Write + Seek> {
    inner: ZipWriter<W>,
    written: usize,
}

impl ZipArchiveWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> ArchiveResult<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Seek> ZipArchiveWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: ZipWriter::new(writer),
            written: 0,
        }
    }

    /// Number of entries appended so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Write the central directory and return the underlying writer.
    pub fn finish(self) -> ArchiveResult<W> {
        let written = self.written;
        let zip = self.inner;
        let mut inner = zip.finish()?;
        inner.flush()?;
        tracing::debug!(entries = written, "finalized zip archive");
        Ok(inner)
    }
}

impl<W: Write + Seek> ArchiveWriter for ZipArchiveWriter<W> {
    fn write_entry(&mut self, entry: &EntryMeta, data: &[u8]) -> ArchiveResult<()> {
        let options = entry_options(entry);
        if entry.is_dir {
            self.inner.add_directory(entry.name.clone(), options)?;
        } else {
            self.inner.start_file(entry.name.clone(), options)?;
            self.inner.write_all(data)?;
        }
        self.written += 1;
        Ok(())
    }
}

fn entry_options(entry: &EntryMeta) -> SimpleFileOptions {
    let method = match entry.compression {
        Compression::Stored => CompressionMethod::Stored,
        Compression::Deflated => CompressionMethod::Deflated,
    };
    let mut options = SimpleFileOptions::default().compression_method(method);
    if let Some(modified) = entry.modified {
        options = options.last_modified_time(modified);
    }
    if let Some(mode) = entry.unix_mode {
        options = options.unix_permissions(mode);
    }
    options
}
