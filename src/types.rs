//! Shared primitive IDs, band/mode enumerations, frequencies, and callsigns.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Store-assigned QSO identifier.
pub type QsoId = u64;
/// Identifier of the log a QSO belongs to.
pub type LogId = u64;

/// Amateur band allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Band {
    /// 160 meters.
    #[serde(rename = "160M")]
    B160m,
    /// 80 meters.
    #[serde(rename = "80M")]
    B80m,
    /// 60 meters.
    #[serde(rename = "60M")]
    B60m,
    /// 40 meters.
    #[serde(rename = "40M")]
    B40m,
    /// 30 meters.
    #[serde(rename = "30M")]
    B30m,
    /// 20 meters.
    #[serde(rename = "20M")]
    B20m,
    /// 17 meters.
    #[serde(rename = "17M")]
    B17m,
    /// 15 meters.
    #[serde(rename = "15M")]
    B15m,
    /// 12 meters.
    #[serde(rename = "12M")]
    B12m,
    /// 10 meters.
    #[serde(rename = "10M")]
    B10m,
}

impl Band {
    /// Every band, lowest frequency first.
    pub const ALL: [Band; 10] = [
        Band::B160m,
        Band::B80m,
        Band::B60m,
        Band::B40m,
        Band::B30m,
        Band::B20m,
        Band::B17m,
        Band::B15m,
        Band::B12m,
        Band::B10m,
    ];

    /// ADIF band name, e.g. `20M`.
    pub fn as_str(self) -> &'static str {
        match self {
            Band::B160m => "160M",
            Band::B80m => "80M",
            Band::B60m => "60M",
            Band::B40m => "40M",
            Band::B30m => "30M",
            Band::B20m => "20M",
            Band::B17m => "17M",
            Band::B15m => "15M",
            Band::B12m => "12M",
            Band::B10m => "10M",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text did not name a known band.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown band: {0:?}")]
pub struct UnknownBand(pub String);

impl FromStr for Band {
    type Err = UnknownBand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Band::ALL
            .into_iter()
            .find(|band| band.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownBand(s.to_string()))
    }
}

/// Emission mode.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mode {
    /// Continuous Wave.
    CW,
    /// Single side-band phone.
    SSB,
    /// Amplitude modulation.
    AM,
    /// Frequency modulation.
    FM,
    /// Radioteletype.
    RTTY,
    /// PSK without a rate qualifier.
    PSK,
    /// BPSK at 31.25 baud.
    PSK31,
    /// BPSK at 62.5 baud.
    PSK63,
    /// BPSK at 125 baud.
    PSK125,
    /// FT4.
    FT4,
    /// FT8.
    FT8,
    /// JT9.
    JT9,
    /// JT65.
    JT65,
    /// Generic MFSK.
    MFSK,
    /// Olivia.
    OLIVIA,
    /// Slow-scan television.
    SSTV,
    /// Unspecified digital mode.
    DIGI,
}

impl Mode {
    /// Every mode in declaration order.
    pub const ALL: [Mode; 17] = [
        Mode::CW,
        Mode::SSB,
        Mode::AM,
        Mode::FM,
        Mode::RTTY,
        Mode::PSK,
        Mode::PSK31,
        Mode::PSK63,
        Mode::PSK125,
        Mode::FT4,
        Mode::FT8,
        Mode::JT9,
        Mode::JT65,
        Mode::MFSK,
        Mode::OLIVIA,
        Mode::SSTV,
        Mode::DIGI,
    ];

    /// Name written to the `MODE` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::CW => "CW",
            Mode::SSB => "SSB",
            Mode::AM => "AM",
            Mode::FM => "FM",
            Mode::RTTY => "RTTY",
            Mode::PSK => "PSK",
            Mode::PSK31 => "PSK31",
            Mode::PSK63 => "PSK63",
            Mode::PSK125 => "PSK125",
            Mode::FT4 => "FT4",
            Mode::FT8 => "FT8",
            Mode::JT9 => "JT9",
            Mode::JT65 => "JT65",
            Mode::MFSK => "MFSK",
            Mode::OLIVIA => "OLIVIA",
            Mode::SSTV => "SSTV",
            Mode::DIGI => "DIGI",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text did not name a known mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mode: {0:?}")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        let alias = match wanted.as_str() {
            "USB" | "LSB" => Some(Mode::SSB),
            "DATA" | "DIGITAL" => Some(Mode::DIGI),
            "BPSK31" => Some(Mode::PSK31),
            "BPSK63" => Some(Mode::PSK63),
            "BPSK125" => Some(Mode::PSK125),
            _ => None,
        };
        alias
            .or_else(|| Mode::ALL.into_iter().find(|m| m.as_str() == wanted))
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

/// Radio frequency in integer hertz.
///
/// Exchange files carry MHz with three decimals and the band plan works in
/// kHz, so frequencies read from text are held at whole kilohertz. That keeps
/// an exported record equal to itself when read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frequency(u64);

impl Frequency {
    /// Builds a frequency from hertz. Returns `None` for zero.
    pub fn from_hz(hz: u64) -> Option<Self> {
        (hz > 0).then_some(Self(hz))
    }

    pub(crate) const fn from_hz_const(hz: u64) -> Self {
        Self(hz)
    }

    /// Builds a frequency from whole kilohertz.
    pub const fn from_khz(khz: u64) -> Self {
        Self(khz * 1_000)
    }

    /// Parses a decimal MHz string such as `14.074` or `7,0305`, rounded to
    /// the nearest kHz (half up).
    ///
    /// Digits finer than 1 Hz are ignored before rounding. Malformed input,
    /// or input that rounds to zero, yields `None`.
    pub fn from_mhz_str(s: &str) -> Option<Self> {
        let s = s.trim();
        let (int_part, frac_part) = match s.find(['.', ',']) {
            Some(pos) => (&s[..pos], &s[pos + 1..]),
            None => (s, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let mhz: u64 = if int_part.is_empty() { 0 } else { int_part.parse().ok()? };
        let mut sub_hz: u64 = 0;
        for (idx, digit) in frac_part.bytes().take(6).enumerate() {
            sub_hz += u64::from(digit - b'0') * 10u64.pow(5 - idx as u32);
        }

        let hz = mhz.checked_mul(1_000_000)?.checked_add(sub_hz)?;
        Self::from_hz(hz.checked_add(500)? / 1_000 * 1_000)
    }

    /// Frequency in hertz.
    pub fn hz(self) -> u64 {
        self.0
    }

    /// Frequency in kilohertz.
    pub fn khz(self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    /// MHz rendering with three decimals, rounded to the nearest kHz.
    pub fn to_mhz_string(self) -> String {
        let khz = (self.0 + 500) / 1_000;
        format!("{}.{:03}", khz / 1_000, khz % 1_000)
    }
}

/// Text failed the callsign grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid callsign: {0:?}")]
pub struct InvalidCallsign(pub String);

/// Validated, upper-cased station callsign.
///
/// Accepts `/`-separated alphanumeric groups (portable prefixes and suffixes
/// such as `VE3/W1ABC/P`) where at least one group has both a letter and a
/// digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Callsign(String);

impl Callsign {
    /// Upper bound on the full callsign length, separators included.
    pub const MAX_LEN: usize = 20;

    /// Validates and normalizes `raw`.
    pub fn parse(raw: &str) -> Result<Self, InvalidCallsign> {
        let norm = raw.trim().to_ascii_uppercase();
        if norm.len() < 3 || norm.len() > Self::MAX_LEN {
            return Err(InvalidCallsign(raw.to_string()));
        }

        let mut has_core = false;
        for part in norm.split('/') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_alphanumeric()) {
                return Err(InvalidCallsign(raw.to_string()));
            }
            let letters = part.bytes().any(|b| b.is_ascii_alphabetic());
            let digits = part.bytes().any(|b| b.is_ascii_digit());
            has_core |= letters && digits;
        }

        if has_core {
            Ok(Self(norm))
        } else {
            Err(InvalidCallsign(raw.to_string()))
        }
    }

    /// Normalized text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Callsign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Callsign {
    type Err = InvalidCallsign;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Callsign {
    type Error = InvalidCallsign;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Callsign> for String {
    fn from(value: Callsign) -> Self {
        value.0
    }
}
