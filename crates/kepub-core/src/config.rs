use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{KepubError, KepubResult};

/// Seed constants used by the reader firmware for master-key derivation,
/// in search order.
pub const DEFAULT_SEEDS: [&str; 4] = ["88b3a2e13", "XzUhGYdFp", "NoCanLook", "QJhwzAtXL"];

/// Top-level configuration (loaded from kepub.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KepubConfig {
    pub device: DeviceConfig,
    pub search: SearchConfig,
    pub output: OutputConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Root of the reader's data directory (default: ~/.kobo)
    pub kobo_dir: PathBuf,
    /// Device descriptor file (default: <kobo_dir>/version)
    pub version_file: Option<PathBuf>,
    /// Reader database (default: <kobo_dir>/KoboReader.sqlite)
    pub database: Option<PathBuf>,
    /// Directory holding encrypted books by volume id (default: <kobo_dir>/kepub)
    pub kepub_dir: Option<PathBuf>,
    /// Extra serials tried after the descriptor's own serial
    pub serials: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Seed constants, tried in order
    pub seeds: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination directory for decrypted books
    pub dir: PathBuf,
    /// File extension of decrypted books
    pub extension: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            kobo_dir: PathBuf::from("~/.kobo"),
            version_file: None,
            database: None,
            kepub_dir: None,
            serials: Vec::new(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            seeds: DEFAULT_SEEDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            extension: "epub".into(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl KepubConfig {
    /// Parse a kepub.toml file. Missing sections take their defaults.
    pub fn from_file(path: &Path) -> KepubResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| KepubError::Config(format!("parsing {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

impl DeviceConfig {
    pub fn kobo_dir(&self) -> PathBuf {
        expand_tilde(&self.kobo_dir)
    }

    pub fn version_file_path(&self) -> PathBuf {
        match &self.version_file {
            Some(p) => expand_tilde(p),
            None => self.kobo_dir().join("version"),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        match &self.database {
            Some(p) => expand_tilde(p),
            None => self.kobo_dir().join("KoboReader.sqlite"),
        }
    }

    /// Location of the encrypted book for a volume id
    pub fn book_path(&self, volume_id: &str) -> PathBuf {
        let dir = match &self.kepub_dir {
            Some(p) => expand_tilde(p),
            None => self.kobo_dir().join("kepub"),
        };
        dir.join(volume_id)
    }
}

impl OutputConfig {
    /// Default destination for a decrypted volume
    pub fn book_path(&self, volume_id: &str) -> PathBuf {
        expand_tilde(&self.dir).join(format!("{volume_id}.{}", self.extension))
    }
}

/// Expand `~` in path to the user's home directory
pub fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_default();
        PathBuf::from(home).join(rest)
    } else if s == "~" {
        PathBuf::from(std::env::var("HOME").unwrap_or_default())
    } else {
        path.to_path_buf()
    }
}
