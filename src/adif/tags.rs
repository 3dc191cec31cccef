//! Tag grammar: `<NAME:LENGTH[:TYPE]>VALUE`.

/// Worked station callsign.
pub const CALL: &str = "CALL";
/// Contact date, `YYYYMMDD`.
pub const QSO_DATE: &str = "QSO_DATE";
/// End date, `YYYYMMDD`.
pub const QSO_DATE_OFF: &str = "QSO_DATE_OFF";
/// Start time, `HHMM` or `HHMMSS`.
pub const TIME_ON: &str = "TIME_ON";
/// End time, `HHMM` or `HHMMSS`.
pub const TIME_OFF: &str = "TIME_OFF";
/// Band name.
pub const BAND: &str = "BAND";
/// Frequency in MHz.
pub const FREQ: &str = "FREQ";
/// Mode name.
pub const MODE: &str = "MODE";
/// Sub-mode name, e.g. FT4 under MFSK.
pub const SUBMODE: &str = "SUBMODE";
/// Logging station callsign.
pub const STATION_CALLSIGN: &str = "STATION_CALLSIGN";
/// Logging operator callsign.
pub const OPERATOR: &str = "OPERATOR";
/// Report sent.
pub const RST_SENT: &str = "RST_SENT";
/// Report received.
pub const RST_RCVD: &str = "RST_RCVD";
/// Header terminator.
pub const EOH: &str = "<EOH>";
/// Record terminator.
pub const EOR: &str = "<EOR>";

/// Tags consumed by normalization and never copied into `extra`.
pub const RECOGNIZED: [&str; 12] = [
    CALL,
    QSO_DATE,
    QSO_DATE_OFF,
    TIME_ON,
    TIME_OFF,
    BAND,
    FREQ,
    MODE,
    SUBMODE,
    STATION_CALLSIGN,
    RST_SENT,
    RST_RCVD,
];

/// True when `name` is in [`RECOGNIZED`].
pub fn is_recognized(name: &str) -> bool {
    RECOGNIZED.iter().any(|tag| tag.eq_ignore_ascii_case(name))
}

/// One decoded `<NAME:LEN>VALUE` occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    /// Canonical uppercase tag name.
    pub name: String,
    /// Length declared in the tag.
    pub declared_len: usize,
    /// Value text; shorter than `declared_len` only if the chunk was truncated.
    pub value: String,
}

/// Field set of one logical record plus the text it was scanned from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawRecord {
    fields: Vec<RawField>,
    text: String,
}

impl RawRecord {
    /// Scans a record chunk. Returns `None` when it holds no field tags.
    ///
    /// Fields declared with length zero are present-but-empty and dropped.
    pub fn from_chunk(text: &str) -> Option<Self> {
        let scanned = scan_fields(text);
        if scanned.is_empty() {
            return None;
        }
        Some(Self {
            fields: scanned.into_iter().filter(|f| !f.value.is_empty()).collect(),
            text: text.trim().to_string(),
        })
    }

    /// Value of `name`, matched case-insensitively. A repeated tag yields its
    /// last occurrence.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .rev()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_str())
    }

    /// Fields in scan order.
    pub fn fields(&self) -> &[RawField] {
        &self.fields
    }

    /// Trimmed source text of the record.
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Scans every field tag in `text`, zero-length ones included.
///
/// Tags without a length (`<EOR>`, `<EOH>`, stray markup) are skipped. The
/// value is the `LENGTH` characters directly after the closing `>`.
pub fn scan_fields(text: &str) -> Vec<RawField> {
    let mut out = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find('<') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('>') else {
            break;
        };
        let spec = &after[..close];
        if let Some(inner) = spec.rfind('<') {
            // A stray '<' in free text; restart at the nearer marker.
            rest = &after[inner..];
            continue;
        }
        let body = &after[close + 1..];

        let mut parts = spec.splitn(3, ':');
        let name = parts.next().unwrap_or_default().trim();
        let declared = parts.next().and_then(|len| len.trim().parse::<usize>().ok());
        let Some(declared_len) = declared.filter(|_| is_field_name(name)) else {
            rest = body;
            continue;
        };

        let value_end = body
            .char_indices()
            .nth(declared_len)
            .map(|(idx, _)| idx)
            .unwrap_or(body.len());
        out.push(RawField {
            name: name.to_ascii_uppercase(),
            declared_len,
            value: body[..value_end].to_string(),
        });
        rest = &body[value_end..];
    }

    out
}

fn is_field_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
