//! Runtime event stream payloads.

use serde::Serialize;

use crate::types::LogId;

use super::handle::{JobId, JobStatus};

/// Events emitted by the job runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum JobEvent {
    /// A job was accepted and queued.
    Queued {
        /// Job id.
        job: JobId,
        /// Target log.
        log_id: LogId,
    },
    /// A job began reading its file.
    Started {
        /// Job id.
        job: JobId,
    },
    /// A job reached a terminal status.
    Finished {
        /// Job id.
        job: JobId,
        /// Terminal status.
        status: JobStatus,
    },
}
