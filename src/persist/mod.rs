//! Store abstraction shared by the in-memory and SQLite stores.

/// SQLite-backed store.
pub mod sqlite;

use thiserror::Error;

use crate::{
    qso::{QsoRecord, StoredQso},
    types::{LogId, QsoId},
};

/// Store failures, plus the duplicate rejection.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Same call, band, and mode within the duplicate window of `existing`.
    #[error("the QSO is already in this log (matches QSO {existing})")]
    DuplicateQso {
        /// Id of the record already stored.
        existing: QsoId,
    },
    /// Update or delete of an id that is not stored.
    #[error("QSO {0} not found")]
    MissingQso(QsoId),
    /// SQLite failure.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The `extra` column could not be encoded or decoded.
    #[error("payload encoding error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Any other failure.
    #[error("{0}")]
    Message(String),
}

impl StoreError {
    /// True for the countable duplicate outcome; false for genuine failures.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateQso { .. })
    }
}

/// Store result alias.
pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence collaborator. Every insert and update passes the duplicate
/// gate: within one log, no two records share call, band, and mode with
/// timestamps less than five minutes apart.
pub trait QsoStore: Send {
    /// Inserts `qso` into `log_id` under a fresh id.
    fn create(&mut self, log_id: LogId, qso: QsoRecord) -> StoreResult<StoredQso>;
    /// Replaces the body of `id`; the record itself is excluded from the gate.
    fn update(&mut self, id: QsoId, qso: QsoRecord) -> StoreResult<StoredQso>;
    /// Record `id`, if stored.
    fn get(&self, id: QsoId) -> StoreResult<Option<StoredQso>>;
    /// Removes `id`.
    fn delete(&mut self, id: QsoId) -> StoreResult<()>;
    /// Records of `log_id` in insertion order.
    fn list_log(&self, log_id: LogId) -> StoreResult<Vec<StoredQso>>;
}

impl<S: QsoStore + ?Sized> QsoStore for Box<S> {
    fn create(&mut self, log_id: LogId, qso: QsoRecord) -> StoreResult<StoredQso> {
        (**self).create(log_id, qso)
    }

    fn update(&mut self, id: QsoId, qso: QsoRecord) -> StoreResult<StoredQso> {
        (**self).update(id, qso)
    }

    fn get(&self, id: QsoId) -> StoreResult<Option<StoredQso>> {
        (**self).get(id)
    }

    fn delete(&mut self, id: QsoId) -> StoreResult<()> {
        (**self).delete(id)
    }

    fn list_log(&self, log_id: LogId) -> StoreResult<Vec<StoredQso>> {
        (**self).list_log(log_id)
    }
}
