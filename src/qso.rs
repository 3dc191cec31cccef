//! QSO domain record, open extra-field map, and stored wrapper.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Band, Callsign, Frequency, LogId, Mode, QsoId};

/// Normalized contact record exchanged between decoder, store, and encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QsoRecord {
    /// Worked station.
    pub callsign: Callsign,
    /// Station that made the contact.
    pub station_callsign: Callsign,
    /// Start of the contact, UTC.
    pub timestamp: DateTime<Utc>,
    /// Band of operation.
    pub band: Band,
    /// Operating frequency.
    pub frequency: Frequency,
    /// Emission mode.
    pub mode: Mode,
    /// Report sent, or a signed contest serial.
    pub rst_sent: i32,
    /// Report received, or a signed contest serial.
    pub rst_received: i32,
    /// Every field outside the recognized set.
    pub extra: ExtraFields,
}

/// Open, string-keyed map of fields the record does not model directly.
///
/// Keys are canonical uppercase tag names. Any key is allowed;
/// [`WellKnownExtra`] only names the common ones.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraFields(BTreeMap<String, String>);

impl ExtraFields {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value` under the uppercase form of `key`. Empty values are ignored.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) -> Option<String> {
        let value = value.into();
        if value.is_empty() {
            return None;
        }
        self.0.insert(key.as_ref().to_ascii_uppercase(), value)
    }

    /// Value stored under `key`, matched case-insensitively.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&key.to_ascii_uppercase()).map(String::as_str)
    }

    /// Value of a well-known field.
    pub fn known(&self, field: WellKnownExtra) -> Option<&str> {
        self.0.get(field.tag()).map(String::as_str)
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(&key.to_ascii_uppercase())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for ExtraFields {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut out = Self::new();
        for (k, v) in iter {
            out.insert(k, v);
        }
        out
    }
}

/// Extra fields commonly seen in logs. Documentation and lookup only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownExtra {
    /// Operator name of the worked station.
    Name,
    /// Location of the worked station.
    Qth,
    /// Maidenhead locator of the worked station.
    Gridsquare,
    /// Free-form comment.
    Comment,
    /// Longer free-form notes.
    Notes,
    /// Contest serial received.
    Srx,
    /// Contest serial sent.
    Stx,
    /// Contest exchange received.
    SrxString,
    /// Contest exchange sent.
    StxString,
    /// Contest identifier.
    ContestId,
    /// Transmit power.
    TxPwr,
    /// Operator of the logging station.
    Operator,
    /// Maidenhead locator of the logging station.
    MyGridsquare,
    /// DXCC entity name.
    Country,
    /// DXCC entity code.
    Dxcc,
    /// CQ zone.
    Cqz,
    /// ITU zone.
    Ituz,
}

impl WellKnownExtra {
    /// Every well-known field.
    pub const ALL: [WellKnownExtra; 17] = [
        WellKnownExtra::Name,
        WellKnownExtra::Qth,
        WellKnownExtra::Gridsquare,
        WellKnownExtra::Comment,
        WellKnownExtra::Notes,
        WellKnownExtra::Srx,
        WellKnownExtra::Stx,
        WellKnownExtra::SrxString,
        WellKnownExtra::StxString,
        WellKnownExtra::ContestId,
        WellKnownExtra::TxPwr,
        WellKnownExtra::Operator,
        WellKnownExtra::MyGridsquare,
        WellKnownExtra::Country,
        WellKnownExtra::Dxcc,
        WellKnownExtra::Cqz,
        WellKnownExtra::Ituz,
    ];

    /// ADIF tag name.
    pub fn tag(self) -> &'static str {
        match self {
            WellKnownExtra::Name => "NAME",
            WellKnownExtra::Qth => "QTH",
            WellKnownExtra::Gridsquare => "GRIDSQUARE",
            WellKnownExtra::Comment => "COMMENT",
            WellKnownExtra::Notes => "NOTES",
            WellKnownExtra::Srx => "SRX",
            WellKnownExtra::Stx => "STX",
            WellKnownExtra::SrxString => "SRX_STRING",
            WellKnownExtra::StxString => "STX_STRING",
            WellKnownExtra::ContestId => "CONTEST_ID",
            WellKnownExtra::TxPwr => "TX_PWR",
            WellKnownExtra::Operator => "OPERATOR",
            WellKnownExtra::MyGridsquare => "MY_GRIDSQUARE",
            WellKnownExtra::Country => "COUNTRY",
            WellKnownExtra::Dxcc => "DXCC",
            WellKnownExtra::Cqz => "CQZ",
            WellKnownExtra::Ituz => "ITUZ",
        }
    }

    /// Looks up a tag name, case-insensitively.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.tag().eq_ignore_ascii_case(tag))
    }
}

/// A record as held by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredQso {
    /// Store-assigned identifier.
    pub id: QsoId,
    /// Owning log.
    pub log_id: LogId,
    /// Record body.
    pub qso: QsoRecord,
}
