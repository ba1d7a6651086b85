//! kepub-secrets: the two external inputs of key recovery
//!
//! - `device`: the device serial, read from the reader's `version` descriptor
//! - `store`: the account user id and per-volume content keys, read from the
//!   reader's SQLite database
//!
//! Both are read once per run and never written.

pub mod device;
pub mod store;

pub use device::{read_serial, VersionInfo};
pub use store::{CredentialStore, KoboDatabase, StaticCredentials, VolumeSummary};
