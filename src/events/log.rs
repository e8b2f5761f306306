//! Execution-log records.
//!
//! The ordered sequence of [`LogEntry`] values is the audit trail a run
//! leaves behind. Entries are appended in execution order to the run's own
//! state and simultaneously published on the engine channel, so dashboards
//! can consume them incrementally while the run progresses.

use serde::{Deserialize, Serialize};

use crate::{common::Vars, stream::NexusId};

/// Outcome recorded by a log entry.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LogStatus {
    Success,
    Error,
}

/// Immutable execution-log record for one nexus visit.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LogEntry {
    /// Unique entry id.
    pub id: String,
    /// Run this entry belongs to.
    pub run_id: String,
    /// Entry timestamp in milliseconds.
    pub timestamp: i64,
    /// Nexus this entry describes.
    pub nexus_id: NexusId,
    /// Outcome of the visit.
    pub status: LogStatus,
    /// Human-readable summary.
    pub message: String,
    /// Wall-clock duration from invocation to settle.
    pub duration_ms: i64,
    /// Output produced by the nexus, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_data: Option<Vars>,
}
