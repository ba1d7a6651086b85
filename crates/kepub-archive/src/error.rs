use thiserror::Error;

pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Container I/O failures. Always fatal to the run.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("entry not found in archive: {0}")]
    EntryNotFound(String),

    #[error("archive has {records} entries but only {unique} distinct names")]
    DuplicateEntries { records: u64, unique: usize },
}

impl From<ArchiveError> for kepub_core::KepubError {
    fn from(e: ArchiveError) -> Self {
        match e {
            ArchiveError::Io(io) => kepub_core::KepubError::Io(io),
            other => kepub_core::KepubError::Archive(other.to_string()),
        }
    }
}
