//! Background import job runner and its event stream.

/// Event stream types emitted by the runner.
pub mod events;
/// Handle and command loop implementation.
pub mod handle;
