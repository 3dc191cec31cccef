//! Import orchestration: decode, normalize, and store one file in order.
//!
//! Rejected records are collected and counted. Duplicates reported by the
//! store are counted and skipped. Any other store failure ends the import;
//! records already created stay in the store.

use std::{
    fs::File,
    io::Read,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    adif::{Decoder, DecoderOptions},
    error::{Error, Result},
    normalize::{ImportError, ImportItem, LogDefaults, Normalizer, NormalizerOptions},
    persist::QsoStore,
    types::LogId,
};

/// Per-run counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportTally {
    /// Records created in the store.
    pub new: usize,
    /// Records the store refused as duplicates.
    pub duplicates: usize,
    /// Records rejected by validation.
    pub invalid: usize,
}

impl ImportTally {
    /// Items processed so far.
    pub fn total(&self) -> usize {
        self.new + self.duplicates + self.invalid
    }
}

/// Result of a finished or cancelled import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Counters; `invalid == errors.len()`.
    pub tally: ImportTally,
    /// Rejected records in file order.
    pub errors: Vec<ImportError>,
    /// True when the run stopped early on request.
    pub cancelled: bool,
}

/// Shared flag that stops an import before its next record.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Import pipeline for one log's defaults and options.
#[derive(Debug, Clone)]
pub struct Importer {
    normalizer: Normalizer,
    decoder: DecoderOptions,
    cancel: CancelToken,
}

impl Importer {
    /// Importer with default options.
    pub fn new(defaults: LogDefaults) -> Self {
        Self::with_options(defaults, DecoderOptions::default(), NormalizerOptions::default())
    }

    /// Importer with explicit decoder and normalizer options.
    pub fn with_options(
        defaults: LogDefaults,
        decoder: DecoderOptions,
        normalizer: NormalizerOptions,
    ) -> Self {
        Self {
            normalizer: Normalizer::new(defaults, normalizer),
            decoder,
            cancel: CancelToken::new(),
        }
    }

    /// Replaces the cancel token, so a caller can share one across jobs.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token observed by this importer.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Imports the file at `path` into `log_id`. The file is closed on
    /// every exit path.
    pub fn import_file<S>(&self, path: impl AsRef<Path>, store: &mut S, log_id: LogId) -> Result<ImportReport>
    where
        S: QsoStore + ?Sized,
    {
        let path = path.as_ref();
        debug!(path = %path.display(), log_id, "opening import file");
        let file = File::open(path)?;
        self.import_reader(file, store, log_id)
    }

    /// Imports every record from `reader` into `log_id`, in source order.
    pub fn import_reader<R, S>(&self, reader: R, store: &mut S, log_id: LogId) -> Result<ImportReport>
    where
        R: Read,
        S: QsoStore + ?Sized,
    {
        let decoder = Decoder::with_options(reader, self.decoder.clone())?;
        info!(log_id, encoding = decoder.encoding().name(), "import started");

        let mut report = ImportReport::default();
        let mut items = self.normalizer.normalize_all(decoder);

        loop {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let Some(item) = items.next() else {
                break;
            };

            match item? {
                ImportItem::Rejected(err) => {
                    report.tally.invalid += 1;
                    report.errors.push(err);
                }
                ImportItem::Accepted(qso) => match store.create(log_id, qso) {
                    Ok(_) => report.tally.new += 1,
                    Err(err) if err.is_duplicate() => report.tally.duplicates += 1,
                    Err(source) => {
                        warn!(log_id, error = %source, committed = report.tally.new, "import aborted by store failure");
                        return Err(Error::StoreFailure {
                            source,
                            committed: report.tally,
                        });
                    }
                },
            }
        }

        info!(
            log_id,
            new = report.tally.new,
            duplicates = report.tally.duplicates,
            invalid = report.tally.invalid,
            cancelled = report.cancelled,
            "import finished"
        );
        Ok(report)
    }
}

/// Imports `reader` with default options.
pub fn import_reader<R, S>(reader: R, store: &mut S, log_id: LogId, defaults: LogDefaults) -> Result<ImportTally>
where
    R: Read,
    S: QsoStore + ?Sized,
{
    Importer::new(defaults)
        .import_reader(reader, store, log_id)
        .map(|report| report.tally)
}

/// Imports the file at `path` with default options.
pub fn import_file<S>(path: impl AsRef<Path>, store: &mut S, log_id: LogId, defaults: LogDefaults) -> Result<ImportTally>
where
    S: QsoStore + ?Sized,
{
    Importer::new(defaults)
        .import_file(path, store, log_id)
        .map(|report| report.tally)
}
