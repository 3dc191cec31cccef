//! Streaming encoder from [`QsoRecord`]s to exchange-format text.

use std::{borrow::Borrow, fmt::Write as _, io};

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{qso::QsoRecord, types::LogId};

use super::tags::{
    BAND, CALL, EOH, EOR, FREQ, MODE, QSO_DATE, RST_RCVD, RST_SENT, STATION_CALLSIGN, TIME_OFF,
    TIME_ON,
};

/// Media type of exported logs.
pub const ADIF_CONTENT_TYPE: &str = "text/adi";
/// Format version announced in the export header.
pub const ADIF_VERSION: &str = "3.1.4";

/// Suggested download name for an exported log.
pub fn export_filename(log_id: LogId) -> String {
    format!("{log_id}.adi")
}

/// Header contents.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EncoderOptions {
    /// Program name written to the banner and `PROGRAMID`.
    pub program_id: String,
    /// Export time; the current time when unset.
    #[serde(skip)]
    pub generated_at: Option<DateTime<Utc>>,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            program_id: env!("CARGO_PKG_NAME").to_string(),
            generated_at: None,
        }
    }
}

/// Lazy sequence of text chunks: one header chunk, then one chunk per record
/// in input order.
pub struct Encoder<I> {
    records: I,
    header: Option<String>,
}

impl<I, T> Encoder<I>
where
    I: Iterator<Item = T>,
    T: Borrow<QsoRecord>,
{
    /// Wraps `records`.
    pub fn new(records: impl IntoIterator<IntoIter = I>, options: &EncoderOptions) -> Self {
        Self {
            records: records.into_iter(),
            header: Some(header(options)),
        }
    }
}

impl<I, T> Iterator for Encoder<I>
where
    I: Iterator<Item = T>,
    T: Borrow<QsoRecord>,
{
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(header) = self.header.take() {
            return Some(header);
        }
        self.records.next().map(|qso| encode_record(qso.borrow()))
    }
}

/// Banner, export time, and header fields, terminated by `<EOH>`.
pub fn header(options: &EncoderOptions) -> String {
    let at = options.generated_at.unwrap_or_else(Utc::now);
    let mut out = String::new();
    let _ = writeln!(out, "ADIF export from {}", options.program_id);
    let _ = writeln!(out, "Logs generated @ {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
    push_field(&mut out, "ADIF_VER", ADIF_VERSION);
    push_field(&mut out, "PROGRAMID", &options.program_id);
    push_field(&mut out, "CREATED_TIMESTAMP", &at.format("%Y%m%d %H%M%S").to_string());
    out.push_str(EOH);
    out.push('\n');
    out
}

/// Fixed-order fields, then extras, then `<EOR>`.
pub fn encode_record(qso: &QsoRecord) -> String {
    let date = qso.timestamp.format("%Y%m%d").to_string();
    let time = qso.timestamp.format("%H%M%S").to_string();

    let mut out = String::with_capacity(256);
    push_field(&mut out, CALL, qso.callsign.as_str());
    push_field(&mut out, QSO_DATE, &date);
    push_field(&mut out, TIME_ON, &time);
    push_field(&mut out, TIME_OFF, &time);
    push_field(&mut out, BAND, qso.band.as_str());
    push_field(&mut out, STATION_CALLSIGN, qso.station_callsign.as_str());
    push_field(&mut out, FREQ, &qso.frequency.to_mhz_string());
    push_field(&mut out, MODE, qso.mode.as_str());
    push_field(&mut out, RST_RCVD, &qso.rst_received.to_string());
    push_field(&mut out, RST_SENT, &qso.rst_sent.to_string());
    for (name, value) in qso.extra.iter() {
        push_field(&mut out, name, value);
    }
    out.push_str(EOR);
    out.push('\n');
    out
}

/// Streams a full export of `records` into `writer`; returns the record count.
pub fn write_adif<W, T>(
    records: impl IntoIterator<Item = T>,
    options: &EncoderOptions,
    mut writer: W,
) -> io::Result<usize>
where
    W: io::Write,
    T: Borrow<QsoRecord>,
{
    writer.write_all(header(options).as_bytes())?;
    let mut count = 0usize;
    for record in records {
        writer.write_all(encode_record(record.borrow()).as_bytes())?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

fn push_field(out: &mut String, name: &str, value: &str) {
    let _ = write!(out, "<{}:{}>{} ", name, value.chars().count(), value);
}
