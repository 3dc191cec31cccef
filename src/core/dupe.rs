use chrono::{DateTime, TimeDelta, Utc};

use crate::{
    qso::QsoRecord,
    types::{Band, Callsign, LogId, Mode},
};

/// Half-width of the duplicate window in seconds. The window is open at both ends.
pub const DUPE_WINDOW_SECS: i64 = 300;

/// Records sharing a key are duplicates when their times fall inside the
/// window of each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DupeKey {
    /// Owning log.
    pub log_id: LogId,
    /// Worked station.
    pub call: Callsign,
    /// Band worked.
    pub band: Band,
    /// Mode worked.
    pub mode: Mode,
}

impl DupeKey {
    /// Key of `qso` within `log_id`.
    pub fn of(log_id: LogId, qso: &QsoRecord) -> Self {
        Self {
            log_id,
            call: qso.callsign.clone(),
            band: qso.band,
            mode: qso.mode,
        }
    }
}

/// [`DUPE_WINDOW_SECS`] as a duration.
pub fn dupe_window() -> TimeDelta {
    TimeDelta::seconds(DUPE_WINDOW_SECS)
}

/// True when `a` and `b` are strictly less than [`DUPE_WINDOW_SECS`] apart.
pub fn is_within_window(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    (a - b).abs() < dupe_window()
}
