//! Credential store: account user id and per-volume content keys

use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension};

use kepub_core::{ContentKeyTable, KepubError, KepubResult};

/// A volume that has content keys in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSummary {
    pub volume_id: String,
    pub keys: usize,
}

/// Read-only query contract over the reader's credentials
pub trait CredentialStore {
    /// The account user id; `NoCredentials` when there is no user row.
    fn user_id(&self) -> KepubResult<String>;

    /// Entry name → base64 encrypted content key for one volume. May be empty.
    fn content_keys(&self, volume_id: &str) -> KepubResult<ContentKeyTable>;

    /// Every volume with at least one content key, ordered by id
    fn volumes(&self) -> KepubResult<Vec<VolumeSummary>>;
}

/// The reader's SQLite database (`KoboReader.sqlite`), opened read-only
pub struct KoboDatabase {
    conn: Connection,
}

impl KoboDatabase {
    pub fn open(path: &Path) -> KepubResult<Self> {
        if !path.exists() {
            return Err(KepubError::Database(format!(
                "reader database not found: {}",
                path.display()
            )));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(db_err)?;
        tracing::debug!(path = %path.display(), "opened reader database");
        Ok(Self { conn })
    }

    /// Wrap an existing connection
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl CredentialStore for KoboDatabase {
    fn user_id(&self) -> KepubResult<String> {
        let user: Option<Option<String>> = self
            .conn
            .query_row("SELECT UserID FROM user", [], |r| r.get(0))
            .optional()
            .map_err(db_err)?;

        // An empty id is returned as-is; it still derives a key
        user.flatten().ok_or(KepubError::NoCredentials)
    }

    fn content_keys(&self, volume_id: &str) -> KepubResult<ContentKeyTable> {
        let mut stmt = self
            .conn
            .prepare("SELECT elementId, elementKey FROM content_keys WHERE volumeId = ?1")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![volume_id], |r| {
                Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
            })
            .map_err(db_err)?;

        let mut table = BTreeMap::new();
        for row in rows {
            let (element_id, element_key) = row.map_err(db_err)?;
            table.insert(element_id, element_key);
        }
        tracing::debug!(volume = volume_id, keys = table.len(), "loaded content keys");
        Ok(table)
    }

    fn volumes(&self) -> KepubResult<Vec<VolumeSummary>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT volumeId, COUNT(*) FROM content_keys GROUP BY volumeId ORDER BY volumeId",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |r| {
                Ok(VolumeSummary {
                    volume_id: r.get(0)?,
                    keys: r.get::<_, i64>(1)? as usize,
                })
            })
            .map_err(db_err)?;

        let mut volumes = Vec::new();
        for row in rows {
            volumes.push(row.map_err(db_err)?);
        }
        Ok(volumes)
    }
}

fn db_err(e: rusqlite::Error) -> KepubError {
    KepubError::Database(e.to_string())
}

/// Fixed credentials held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    pub user_id: Option<String>,
    pub volumes: BTreeMap<String, ContentKeyTable>,
}

impl StaticCredentials {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            volumes: BTreeMap::new(),
        }
    }

    pub fn with_volume(mut self, volume_id: impl Into<String>, keys: ContentKeyTable) -> Self {
        self.volumes.insert(volume_id.into(), keys);
        self
    }
}

impl CredentialStore for StaticCredentials {
    fn user_id(&self) -> KepubResult<String> {
        self.user_id.clone().ok_or(KepubError::NoCredentials)
    }

    fn content_keys(&self, volume_id: &str) -> KepubResult<ContentKeyTable> {
        Ok(self.volumes.get(volume_id).cloned().unwrap_or_default())
    }

    fn volumes(&self) -> KepubResult<Vec<VolumeSummary>> {
        Ok(self
            .volumes
            .iter()
            .filter(|(_, keys)| !keys.is_empty())
            .map(|(id, keys)| VolumeSummary {
                volume_id: id.clone(),
                keys: keys.len(),
            })
            .collect())
    }
}
