//! Amateur-radio log exchange: decode ADIF files into validated QSO records,
//! encode records back, and gate duplicates at the store.
//!
//! # Examples
//!
//! Importing into the in-memory store:
//! ```
//! use adiflog::{
//!     core::store::MemoryQsoStore,
//!     import::import_reader,
//!     normalize::LogDefaults,
//!     types::Callsign,
//! };
//!
//! let text = "<CALL:5>K1ABC <QSO_DATE:8>20240115 <TIME_ON:4>1430 \
//!             <MODE:2>CW <FREQ:6>14.025 <EOR>\n\
//!             <CALL:5>W1XYZ <QSO_DATE:8>20240115 <TIME_ON:4>1435 <MODE:2>CW <EOR>\n";
//! let defaults = LogDefaults {
//!     station_callsign: Callsign::parse("N0CALL").expect("valid call"),
//! };
//!
//! let mut store = MemoryQsoStore::new();
//! let tally = import_reader(text.as_bytes(), &mut store, 1, defaults).expect("import");
//! assert_eq!((tally.new, tally.duplicates, tally.invalid), (1, 0, 1));
//! ```
//!
//! Background jobs with a SQLite store:
//! ```no_run
//! use adiflog::{
//!     normalize::LogDefaults,
//!     persist::sqlite::SqliteQsoStore,
//!     runtime::handle::{shared_store, spawn_importer, ImportRequest, RuntimeConfig},
//!     types::Callsign,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = SqliteQsoStore::open("log.db").expect("open sqlite");
//! let handle = spawn_importer(shared_store(store), RuntimeConfig::default());
//! let defaults = LogDefaults {
//!     station_callsign: Callsign::parse("N0CALL").expect("valid call"),
//! };
//! let job = handle
//!     .submit(ImportRequest::new("contest.adi", 1, defaults))
//!     .await
//!     .expect("submit");
//! let status = handle.wait(job).await.expect("wait");
//! println!("{status:?}");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Exchange-format tags, decoder, and encoder.
pub mod adif;
/// Band boundaries and per-mode default frequencies.
pub mod bandplan;
/// TOML configuration.
pub mod config;
/// In-memory store and duplicate gate.
pub mod core;
/// Crate-level error type.
pub mod error;
/// Import orchestration and tallies.
pub mod import;
/// Record validation and derivation.
pub mod normalize;
/// Store abstraction and SQLite implementation.
pub mod persist;
/// QSO domain records.
pub mod qso;
/// Background import runner and events.
pub mod runtime;
/// Shared primitive types and enums.
pub mod types;

pub use error::{Error, Result};
