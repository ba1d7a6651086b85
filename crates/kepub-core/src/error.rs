use std::path::PathBuf;

use thiserror::Error;

pub type KepubResult<T> = Result<T, KepubError>;

#[derive(Debug, Error)]
pub enum KepubError {
    #[error("device descriptor not found: {}", .0.display())]
    MissingDescriptor(PathBuf),

    #[error("device descriptor has no fields: {}", .0.display())]
    MalformedDescriptor(PathBuf),

    #[error("no user credentials found in the reader database")]
    NoCredentials,

    #[error("no content keys found for volume {0}")]
    NoContentKeys(String),

    #[error("none of the content-keyed entries of volume {0} are present in the archive")]
    NoVerifiableEntry(String),

    #[error("could not derive a working master key ({tried} candidates tried)")]
    KeySearchExhausted { tried: usize },

    #[error("archive error: {0}")]
    Archive(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KepubError {
    /// Errors caused by the environment rather than by the archive contents.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::MissingDescriptor(_)
                | Self::MalformedDescriptor(_)
                | Self::NoCredentials
                | Self::NoContentKeys(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_classification() {
        assert!(KepubError::NoCredentials.is_input_error());
        assert!(KepubError::NoContentKeys("vol".into()).is_input_error());
        assert!(KepubError::MissingDescriptor(PathBuf::from("/x/version")).is_input_error());
        assert!(!KepubError::KeySearchExhausted { tried: 4 }.is_input_error());
        assert!(!KepubError::Archive("truncated".into()).is_input_error());
    }

    #[test]
    fn test_exhausted_message_mentions_count() {
        let msg = KepubError::KeySearchExhausted { tried: 8 }.to_string();
        assert!(msg.contains("8 candidates"), "got: {msg}");
    }
}
