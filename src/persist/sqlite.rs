//! SQLite-backed QSO store with the duplicate gate checked inside each
//! write transaction.

use std::{io, path::Path};

use chrono::DateTime;
use rusqlite::{Connection, OptionalExtension, Row, params, types::Type};

use crate::{
    adif::encoder::{EncoderOptions, write_adif},
    core::dupe::DUPE_WINDOW_SECS,
    qso::{ExtraFields, QsoRecord, StoredQso},
    types::{Band, Callsign, Frequency, LogId, Mode, QsoId},
};

use super::{QsoStore, StoreError, StoreResult};

const SELECT_COLUMNS: &str = "SELECT id, log_id, callsign, station_callsign, qso_ts_ms, band, \
     freq_hz, qso_mode, rst_sent, rst_rcvd, extra FROM qso";

const WINDOW_MS: i64 = DUPE_WINDOW_SECS * 1_000;

/// SQLite implementation of [`crate::persist::QsoStore`].
pub struct SqliteQsoStore {
    conn: Connection,
}

impl SqliteQsoStore {
    /// Opens or creates a SQLite-backed store at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory SQLite store.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    /// Streams `log_id` as an exchange file into `writer`, reading rows
    /// lazily. Returns the record count.
    pub fn export_log<W: io::Write>(
        &self,
        log_id: LogId,
        options: &EncoderOptions,
        writer: W,
    ) -> crate::Result<usize> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} WHERE log_id = ?1 ORDER BY id ASC"))
            .map_err(StoreError::from)?;
        let rows = stmt
            .query_map(params![log_id as i64], row_to_stored)
            .map_err(StoreError::from)?;

        let mut failure = None;
        let records = rows.map_while(|row| match row {
            Ok(stored) => Some(stored.qso),
            Err(err) => {
                failure = Some(err);
                None
            }
        });
        let count = write_adif(records, options, writer)?;

        match failure {
            Some(err) => Err(StoreError::from(err).into()),
            None => Ok(count),
        }
    }
}

impl QsoStore for SqliteQsoStore {
    fn create(&mut self, log_id: LogId, qso: QsoRecord) -> StoreResult<StoredQso> {
        let tx = self.conn.transaction()?;
        if let Some(existing) = find_duplicate(&tx, log_id, &qso, None)? {
            return Err(StoreError::DuplicateQso { existing });
        }

        let extra = serde_json::to_string(&qso.extra)?;
        tx.execute(
            "INSERT INTO qso(log_id, callsign, station_callsign, qso_ts_ms, band, freq_hz, \
             qso_mode, rst_sent, rst_rcvd, extra) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                log_id as i64,
                qso.callsign.as_str(),
                qso.station_callsign.as_str(),
                qso.timestamp.timestamp_millis(),
                qso.band.as_str(),
                qso.frequency.hz() as i64,
                qso.mode.as_str(),
                qso.rst_sent,
                qso.rst_received,
                extra,
            ],
        )?;
        let id = tx.last_insert_rowid() as QsoId;
        tx.commit()?;

        Ok(StoredQso { id, log_id, qso })
    }

    fn update(&mut self, id: QsoId, qso: QsoRecord) -> StoreResult<StoredQso> {
        let tx = self.conn.transaction()?;
        let log_id: Option<i64> = tx
            .query_row("SELECT log_id FROM qso WHERE id = ?1", params![id as i64], |row| {
                row.get(0)
            })
            .optional()?;
        let log_id = log_id.ok_or(StoreError::MissingQso(id))? as LogId;

        if let Some(existing) = find_duplicate(&tx, log_id, &qso, Some(id))? {
            return Err(StoreError::DuplicateQso { existing });
        }

        let extra = serde_json::to_string(&qso.extra)?;
        tx.execute(
            "UPDATE qso SET callsign = ?2, station_callsign = ?3, qso_ts_ms = ?4, band = ?5, \
             freq_hz = ?6, qso_mode = ?7, rst_sent = ?8, rst_rcvd = ?9, extra = ?10 \
             WHERE id = ?1",
            params![
                id as i64,
                qso.callsign.as_str(),
                qso.station_callsign.as_str(),
                qso.timestamp.timestamp_millis(),
                qso.band.as_str(),
                qso.frequency.hz() as i64,
                qso.mode.as_str(),
                qso.rst_sent,
                qso.rst_received,
                extra,
            ],
        )?;
        tx.commit()?;

        Ok(StoredQso { id, log_id, qso })
    }

    fn get(&self, id: QsoId) -> StoreResult<Option<StoredQso>> {
        let stored = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id as i64],
                row_to_stored,
            )
            .optional()?;
        Ok(stored)
    }

    fn delete(&mut self, id: QsoId) -> StoreResult<()> {
        let count = self
            .conn
            .execute("DELETE FROM qso WHERE id = ?1", params![id as i64])?;
        if count == 0 {
            return Err(StoreError::MissingQso(id));
        }
        Ok(())
    }

    fn list_log(&self, log_id: LogId) -> StoreResult<Vec<StoredQso>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} WHERE log_id = ?1 ORDER BY id ASC"))?;
        let rows = stmt.query_map(params![log_id as i64], row_to_stored)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn find_duplicate(
    conn: &Connection,
    log_id: LogId,
    qso: &QsoRecord,
    exclude: Option<QsoId>,
) -> StoreResult<Option<QsoId>> {
    let ts = qso.timestamp.timestamp_millis();
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM qso \
             WHERE log_id = ?1 AND callsign = ?2 AND band = ?3 AND qso_mode = ?4 \
               AND id <> ?5 AND qso_ts_ms > ?6 AND qso_ts_ms < ?7 \
             LIMIT 1",
            params![
                log_id as i64,
                qso.callsign.as_str(),
                qso.band.as_str(),
                qso.mode.as_str(),
                exclude.map(|id| id as i64).unwrap_or(-1),
                ts - WINDOW_MS,
                ts + WINDOW_MS,
            ],
            |row| row.get(0),
        )
        .optional()?;
    Ok(existing.map(|id| id as QsoId))
}

fn row_to_stored(row: &Row<'_>) -> rusqlite::Result<StoredQso> {
    let id: i64 = row.get(0)?;
    let log_id: i64 = row.get(1)?;
    let callsign: String = row.get(2)?;
    let station_callsign: String = row.get(3)?;
    let ts_ms: i64 = row.get(4)?;
    let band: String = row.get(5)?;
    let freq_hz: i64 = row.get(6)?;
    let mode: String = row.get(7)?;
    let extra: String = row.get(10)?;

    let qso = QsoRecord {
        callsign: Callsign::parse(&callsign).map_err(|e| conversion_error(2, e))?,
        station_callsign: Callsign::parse(&station_callsign)
            .map_err(|e| conversion_error(3, e))?,
        timestamp: DateTime::from_timestamp_millis(ts_ms)
            .ok_or_else(|| conversion_error(4, io::Error::other("timestamp out of range")))?,
        band: band.parse::<Band>().map_err(|e| conversion_error(5, e))?,
        frequency: Frequency::from_hz(freq_hz.max(0) as u64)
            .ok_or_else(|| conversion_error(6, io::Error::other("non-positive frequency")))?,
        mode: mode.parse::<Mode>().map_err(|e| conversion_error(7, e))?,
        rst_sent: row.get(8)?,
        rst_received: row.get(9)?,
        extra: serde_json::from_str::<ExtraFields>(&extra).map_err(|e| conversion_error(10, e))?,
    };

    Ok(StoredQso {
        id: id as QsoId,
        log_id: log_id as LogId,
        qso,
    })
}

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}
