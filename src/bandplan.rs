//! Band/frequency reference table.
//!
//! Maps `(band, mode)` to a conventional operating frequency and classifies an
//! arbitrary frequency into a band using ascending upper boundaries. The
//! table is built once and shared read-only by every import and export.

use std::{ops::RangeInclusive, sync::LazyLock};

use hashbrown::HashMap;

use crate::types::{Band, Frequency, Mode};

struct PlanRow {
    band: Band,
    upper_khz: u64,
    fallback_hz: u64,
    modes: &'static [(Mode, u64)],
}

// Upper boundaries ascend; each band owns (previous upper, upper].
// Default frequencies are whole kHz, the resolution written on export.
const PLAN: [PlanRow; 10] = [
    PlanRow {
        band: Band::B160m,
        upper_khz: 2_000,
        fallback_hz: 1_830_000,
        modes: &[
            (Mode::CW, 1_810_000),
            (Mode::SSB, 1_850_000),
            (Mode::FT8, 1_840_000),
            (Mode::FT4, 1_840_000),
        ],
    },
    PlanRow {
        band: Band::B80m,
        upper_khz: 4_000,
        fallback_hz: 3_600_000,
        modes: &[
            (Mode::CW, 3_530_000),
            (Mode::SSB, 3_750_000),
            (Mode::RTTY, 3_580_000),
            (Mode::PSK31, 3_580_000),
            (Mode::FT8, 3_573_000),
            (Mode::FT4, 3_575_000),
            (Mode::JT65, 3_570_000),
        ],
    },
    PlanRow {
        band: Band::B60m,
        upper_khz: 5_450,
        fallback_hz: 5_357_000,
        modes: &[(Mode::CW, 5_352_000), (Mode::FT8, 5_357_000)],
    },
    PlanRow {
        band: Band::B40m,
        upper_khz: 7_300,
        fallback_hz: 7_100_000,
        modes: &[
            (Mode::CW, 7_030_000),
            (Mode::SSB, 7_150_000),
            (Mode::RTTY, 7_040_000),
            (Mode::PSK31, 7_070_000),
            (Mode::FT8, 7_074_000),
            (Mode::FT4, 7_048_000),
            (Mode::JT9, 7_078_000),
            (Mode::JT65, 7_076_000),
        ],
    },
    PlanRow {
        band: Band::B30m,
        upper_khz: 10_150,
        fallback_hz: 10_120_000,
        modes: &[
            (Mode::CW, 10_110_000),
            (Mode::FT8, 10_136_000),
            (Mode::FT4, 10_140_000),
            (Mode::JT65, 10_138_000),
            (Mode::JT9, 10_140_000),
            (Mode::PSK31, 10_142_000),
        ],
    },
    PlanRow {
        band: Band::B20m,
        upper_khz: 14_350,
        fallback_hz: 14_100_000,
        modes: &[
            (Mode::CW, 14_030_000),
            (Mode::SSB, 14_200_000),
            (Mode::RTTY, 14_080_000),
            (Mode::PSK31, 14_070_000),
            (Mode::PSK63, 14_070_000),
            (Mode::FT8, 14_074_000),
            (Mode::FT4, 14_080_000),
            (Mode::JT65, 14_076_000),
            (Mode::JT9, 14_078_000),
            (Mode::SSTV, 14_230_000),
        ],
    },
    PlanRow {
        band: Band::B17m,
        upper_khz: 18_168,
        fallback_hz: 18_100_000,
        modes: &[
            (Mode::CW, 18_080_000),
            (Mode::SSB, 18_130_000),
            (Mode::FT8, 18_100_000),
            (Mode::FT4, 18_104_000),
            (Mode::PSK31, 18_100_000),
        ],
    },
    PlanRow {
        band: Band::B15m,
        upper_khz: 21_450,
        fallback_hz: 21_200_000,
        modes: &[
            (Mode::CW, 21_030_000),
            (Mode::SSB, 21_300_000),
            (Mode::RTTY, 21_080_000),
            (Mode::PSK31, 21_070_000),
            (Mode::FT8, 21_074_000),
            (Mode::FT4, 21_140_000),
            (Mode::SSTV, 21_340_000),
        ],
    },
    PlanRow {
        band: Band::B12m,
        upper_khz: 24_990,
        fallback_hz: 24_940_000,
        modes: &[
            (Mode::CW, 24_900_000),
            (Mode::SSB, 24_950_000),
            (Mode::FT8, 24_915_000),
            (Mode::FT4, 24_919_000),
        ],
    },
    PlanRow {
        band: Band::B10m,
        upper_khz: 29_700,
        fallback_hz: 28_500_000,
        modes: &[
            (Mode::CW, 28_030_000),
            (Mode::SSB, 28_500_000),
            (Mode::AM, 29_000_000),
            (Mode::FM, 29_600_000),
            (Mode::RTTY, 28_080_000),
            (Mode::PSK31, 28_120_000),
            (Mode::FT8, 28_074_000),
            (Mode::FT4, 28_180_000),
        ],
    },
];

static GLOBAL: LazyLock<BandPlan> = LazyLock::new(BandPlan::standard);

#[derive(Debug, Clone)]
struct BandDefaults {
    fallback: Frequency,
    by_mode: HashMap<Mode, Frequency>,
}

/// Immutable bidirectional band/frequency lookup.
#[derive(Debug, Clone)]
pub struct BandPlan {
    // Indexed by `Band as usize`, same order as `Band::ALL`.
    defaults: Vec<BandDefaults>,
    bounds: Vec<(Frequency, Band)>,
}

impl BandPlan {
    /// Process-wide table, built on first use.
    pub fn global() -> &'static BandPlan {
        &GLOBAL
    }

    /// Builds the standard HF table.
    pub fn standard() -> Self {
        let mut defaults = Vec::with_capacity(PLAN.len());
        let mut bounds = Vec::with_capacity(PLAN.len());

        for row in &PLAN {
            debug_assert_eq!(row.band as usize, defaults.len());
            let by_mode = row
                .modes
                .iter()
                .map(|&(mode, hz)| (mode, Frequency::from_hz_const(hz)))
                .collect();
            defaults.push(BandDefaults {
                fallback: Frequency::from_hz_const(row.fallback_hz),
                by_mode,
            });
            bounds.push((Frequency::from_khz(row.upper_khz), row.band));
        }

        Self { defaults, bounds }
    }

    /// Conventional frequency for `mode` on `band`, or the band's generic
    /// frequency when the mode has no entry.
    pub fn default_frequency(&self, band: Band, mode: Mode) -> Frequency {
        let entry = &self.defaults[band as usize];
        entry.by_mode.get(&mode).copied().unwrap_or(entry.fallback)
    }

    /// Band whose range contains `freq`.
    ///
    /// Frequencies above the highest boundary classify into the top band;
    /// use [`BandPlan::classify_strict`] to detect that case.
    pub fn classify(&self, freq: Frequency) -> Band {
        self.classify_strict(freq).unwrap_or(self.top_band())
    }

    /// Band whose range contains `freq`, or `None` above the highest boundary.
    pub fn classify_strict(&self, freq: Frequency) -> Option<Band> {
        self.bounds
            .iter()
            .find(|(upper, _)| freq <= *upper)
            .map(|&(_, band)| band)
    }

    /// Inclusive hertz range classified into `band`.
    pub fn range(&self, band: Band) -> RangeInclusive<u64> {
        let idx = band as usize;
        let lower = match idx {
            0 => 1,
            _ => self.bounds[idx - 1].0.hz() + 1,
        };
        lower..=self.bounds[idx].0.hz()
    }

    /// Highest configured boundary.
    pub fn upper_limit(&self) -> Frequency {
        self.bounds[self.bounds.len() - 1].0
    }

    /// Modes with an explicit entry on `band`.
    pub fn modes_on(&self, band: Band) -> impl Iterator<Item = Mode> + '_ {
        self.defaults[band as usize].by_mode.keys().copied()
    }

    fn top_band(&self) -> Band {
        self.bounds[self.bounds.len() - 1].1
    }
}
