pub mod config;
pub mod error;
pub mod types;

pub use error::{KepubError, KepubResult};
pub use types::{ContentKeyTable, TranscodeEvent, TranscodeReport};
