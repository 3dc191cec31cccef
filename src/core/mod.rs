//! In-memory store, duplicate gate, and index helpers.

/// Duplicate key and time-window predicate.
pub mod dupe;
/// Helper index aliases.
pub mod indices;
/// In-memory store enforcing the duplicate gate.
pub mod store;
