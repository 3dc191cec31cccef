//! Validation and derivation from raw field maps to [`QsoRecord`]s.
//!
//! Every raw record yields exactly one [`ImportItem`]: an accepted record or
//! a rejection carrying the first failed check. A rejection never stops the
//! sequence.

use std::{fmt, io};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    adif::tags::{
        self, BAND, CALL, FREQ, MODE, OPERATOR, QSO_DATE, RST_RCVD, RST_SENT, STATION_CALLSIGN,
        SUBMODE, TIME_OFF, TIME_ON,
    },
    adif::RawRecord,
    bandplan::BandPlan,
    qso::{ExtraFields, QsoRecord},
    types::{Band, Callsign, Frequency, Mode},
};

/// Per-log values used when a record leaves them out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogDefaults {
    /// Station callsign for records without `STATION_CALLSIGN`.
    pub station_callsign: Callsign,
}

/// Normalizer tuning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NormalizerOptions {
    /// Reject records whose band must be inferred from a frequency above the
    /// band plan instead of classifying them into the top band.
    pub reject_out_of_range_frequency: bool,
}

/// Field check that rejected a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldError {
    /// `CALL` missing or not a callsign.
    Call,
    /// Neither `TIME_ON` nor `TIME_OFF` present.
    Time,
    /// Date and time do not form a real timestamp.
    QsoDate,
    /// `MODE` not in the mode enumeration.
    Mode,
    /// No usable band and no usable frequency.
    BandFreq,
}

impl FieldError {
    /// Field names reported for this failure.
    pub fn fields(self) -> &'static str {
        match self {
            FieldError::Call => "CALL",
            FieldError::Time => "TIME_ON, TIME_OFF",
            FieldError::QsoDate => "QSO_DATE",
            FieldError::Mode => "MODE",
            FieldError::BandFreq => "BAND, FREQ",
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Missing or invalid field ({})", self.fields())
    }
}

/// A rejected record: the reason and the raw text it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{reason}: {raw}")]
pub struct ImportError {
    /// Failed check.
    pub reason: FieldError,
    /// Source text of the record.
    pub raw: String,
}

/// Outcome of normalizing one raw record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportItem {
    /// Valid record, ready for the store.
    Accepted(QsoRecord),
    /// Invalid record, for the caller's error sink.
    Rejected(ImportError),
}

impl From<Result<QsoRecord, ImportError>> for ImportItem {
    fn from(value: Result<QsoRecord, ImportError>) -> Self {
        match value {
            Ok(qso) => Self::Accepted(qso),
            Err(err) => Self::Rejected(err),
        }
    }
}

/// Applies validation and band/frequency derivation.
#[derive(Debug, Clone)]
pub struct Normalizer {
    plan: &'static BandPlan,
    defaults: LogDefaults,
    options: NormalizerOptions,
}

impl Normalizer {
    /// Normalizer backed by the global band plan.
    pub fn new(defaults: LogDefaults, options: NormalizerOptions) -> Self {
        Self {
            plan: BandPlan::global(),
            defaults,
            options,
        }
    }

    /// Log defaults in use.
    pub fn defaults(&self) -> &LogDefaults {
        &self.defaults
    }

    /// Normalizes one raw record.
    pub fn normalize(&self, raw: &RawRecord) -> Result<QsoRecord, ImportError> {
        self.try_normalize(raw).map_err(|reason| {
            debug!(%reason, "record rejected");
            ImportError {
                reason,
                raw: raw.text().to_string(),
            }
        })
    }

    /// Lazily normalizes a decoded sequence, preserving its order.
    pub fn normalize_all<I>(&self, records: I) -> Normalized<'_, I>
    where
        I: Iterator<Item = io::Result<RawRecord>>,
    {
        Normalized {
            normalizer: self,
            records,
        }
    }

    fn try_normalize(&self, raw: &RawRecord) -> Result<QsoRecord, FieldError> {
        let callsign = raw
            .get(CALL)
            .and_then(|call| Callsign::parse(call).ok())
            .ok_or(FieldError::Call)?;

        let time = raw
            .get(TIME_ON)
            .or_else(|| raw.get(TIME_OFF))
            .ok_or(FieldError::Time)?;
        let timestamp = parse_timestamp(raw.get(QSO_DATE), time).ok_or(FieldError::QsoDate)?;

        let station_callsign = [STATION_CALLSIGN, OPERATOR]
            .into_iter()
            .filter_map(|tag| raw.get(tag))
            .find_map(|call| Callsign::parse(call).ok())
            .unwrap_or_else(|| self.defaults.station_callsign.clone());

        let mode = raw
            .get(SUBMODE)
            .and_then(|m| m.parse::<Mode>().ok())
            .or_else(|| raw.get(MODE).and_then(|m| m.parse::<Mode>().ok()))
            .ok_or(FieldError::Mode)?;

        let band = raw.get(BAND).and_then(|b| b.parse::<Band>().ok());
        let frequency = raw.get(FREQ).and_then(Frequency::from_mhz_str);
        let (band, frequency) = self.derive_band_and_frequency(band, frequency, mode)?;

        let extra: ExtraFields = raw
            .fields()
            .iter()
            .filter(|f| !tags::is_recognized(&f.name))
            .map(|f| (f.name.as_str(), f.value.as_str()))
            .collect();

        Ok(QsoRecord {
            callsign,
            station_callsign,
            timestamp,
            band,
            frequency,
            mode,
            rst_sent: parse_signal_report(raw.get(RST_SENT)),
            rst_received: parse_signal_report(raw.get(RST_RCVD)),
            extra,
        })
    }

    fn derive_band_and_frequency(
        &self,
        band: Option<Band>,
        frequency: Option<Frequency>,
        mode: Mode,
    ) -> Result<(Band, Frequency), FieldError> {
        match (band, frequency) {
            (Some(band), Some(freq)) => {
                if self.plan.classify_strict(freq) != Some(band) {
                    debug!(%band, hz = freq.hz(), "frequency outside the declared band");
                }
                Ok((band, freq))
            }
            (Some(band), None) => Ok((band, self.plan.default_frequency(band, mode))),
            (None, Some(freq)) => match self.plan.classify_strict(freq) {
                Some(band) => Ok((band, freq)),
                None if self.options.reject_out_of_range_frequency => Err(FieldError::BandFreq),
                None => {
                    let band = self.plan.classify(freq);
                    debug!(hz = freq.hz(), %band, "frequency above band plan; using top band");
                    Ok((band, freq))
                }
            },
            (None, None) => Err(FieldError::BandFreq),
        }
    }
}

/// Normalized view over a decoded record sequence.
pub struct Normalized<'n, I> {
    normalizer: &'n Normalizer,
    records: I,
}

impl<I> Iterator for Normalized<'_, I>
where
    I: Iterator<Item = io::Result<RawRecord>>,
{
    type Item = io::Result<ImportItem>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = match self.records.next()? {
            Ok(raw) => raw,
            Err(err) => return Some(Err(err)),
        };
        Some(Ok(self.normalizer.normalize(&raw).into()))
    }
}

/// Parses a signal report or signed serial.
///
/// A leading `-` sets the sign; leading zeros and `+` are dropped; anything
/// after the leading digit run is ignored. Missing or digit-less input is 0.
pub fn parse_signal_report(raw: Option<&str>) -> i32 {
    let Some(text) = raw.map(str::trim) else {
        return 0;
    };
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let rest = rest.trim_start_matches(['0', '+']);
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let value = rest[..end].parse::<i32>().unwrap_or(0);
    if negative { -value } else { value }
}

/// Builds a UTC timestamp from `YYYYMMDD` and `HHMM`/`HHMMSS`.
pub fn parse_timestamp(date: Option<&str>, time: &str) -> Option<DateTime<Utc>> {
    let date = date?.trim();
    let time = time.trim();
    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !matches!(time.len(), 4 | 6) || !time.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let num = |s: &str| s.parse::<u32>().ok();
    let day = NaiveDate::from_ymd_opt(
        date[..4].parse::<i32>().ok()?,
        num(&date[4..6])?,
        num(&date[6..8])?,
    )?;
    let second = if time.len() == 6 { num(&time[4..6])? } else { 0 };
    let clock = NaiveTime::from_hms_opt(num(&time[..2])?, num(&time[2..4])?, second)?;
    Some(day.and_time(clock).and_utc())
}
