//! Fatal outcomes of import and export.

use std::io;

use thiserror::Error;

use crate::{import::ImportTally, persist::StoreError};

/// Errors that end an import or export. Per-record rejections and
/// duplicates are counted, never raised.
#[derive(Debug, Error)]
pub enum Error {
    /// The source or sink failed.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    /// The store failed outside of a write in progress.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// The store failed mid-import; `committed` counts what was already saved.
    #[error("store failed after {} new records: {source}", .committed.new)]
    StoreFailure {
        /// Underlying failure.
        source: StoreError,
        /// Tally at the moment of failure.
        committed: ImportTally,
    },
    /// Configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Tally committed before a mid-import store failure.
    pub fn committed(&self) -> Option<&ImportTally> {
        match self {
            Self::StoreFailure { committed, .. } => Some(committed),
            _ => None,
        }
    }
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, Error>;
