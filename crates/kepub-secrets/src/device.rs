//! Device descriptor: a single line of comma-separated fields.
//!
//! ```text
//! N905B12345,4.38.21908,4.38.21908,4.38.21908,4.38.21908,00000000-0000-0000-0000-000000000387
//! serial     firmware versions ...                        platform id
//! ```
//!
//! Only the first field (the serial) feeds key derivation.

use std::path::Path;

use kepub_core::{KepubError, KepubResult};

/// Parsed device descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    pub serial: String,
    /// All descriptor fields, serial included
    pub fields: Vec<String>,
}

impl VersionInfo {
    /// Read and parse the descriptor file at `path`.
    pub fn load(path: &Path) -> KepubResult<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KepubError::MissingDescriptor(path.to_path_buf()));
            }
            Err(e) => return Err(KepubError::Io(e)),
        };
        let info = Self::parse(&content)
            .ok_or_else(|| KepubError::MalformedDescriptor(path.to_path_buf()))?;
        tracing::debug!(
            path = %path.display(),
            fields = info.fields.len(),
            platform = info.platform_id().unwrap_or("-"),
            "read device descriptor"
        );
        Ok(info)
    }

    /// Parse descriptor text; `None` when the first line has no serial field.
    pub fn parse(content: &str) -> Option<Self> {
        let line = content.trim().lines().next()?.trim();
        let fields: Vec<String> = line.split(',').map(|f| f.trim().to_string()).collect();
        let serial = fields.first().filter(|s| !s.is_empty())?.clone();
        Some(Self { serial, fields })
    }

    /// Trailing platform identifier, when the descriptor has more than the serial
    pub fn platform_id(&self) -> Option<&str> {
        if self.fields.len() > 1 {
            self.fields.last().map(String::as_str)
        } else {
            None
        }
    }
}

/// Read only the device serial from the descriptor at `path`.
pub fn read_serial(path: &Path) -> KepubResult<String> {
    VersionInfo::load(path).map(|info| info.serial)
}
