//! TOML configuration for the decoder, normalizer, encoder, and job runner.
//!
//! Every field has a default, so an empty document is a valid configuration:
//!
//! ```toml
//! [decoder]
//! preserve_value_case = true
//! sniff_bytes = 1024
//!
//! [normalizer]
//! reject_out_of_range_frequency = false
//!
//! [encoder]
//! program_id = "adiflog"
//!
//! [runtime]
//! job_queue_bound = 64
//! event_capacity = 256
//! finished_retention = 1024
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::{
    adif::{DecoderOptions, EncoderOptions},
    error::{Error, Result},
    import::Importer,
    normalize::{LogDefaults, NormalizerOptions},
    runtime::handle::RuntimeConfig,
};

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdifConfig {
    /// `[decoder]` table.
    pub decoder: DecoderOptions,
    /// `[normalizer]` table.
    pub normalizer: NormalizerOptions,
    /// `[encoder]` table.
    pub encoder: EncoderOptions,
    /// `[runtime]` table.
    pub runtime: RuntimeConfig,
}

impl AdifConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reads and parses the TOML file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Importer for one log using this configuration.
    pub fn importer(&self, defaults: LogDefaults) -> Importer {
        Importer::with_options(defaults, self.decoder.clone(), self.normalizer.clone())
    }
}
