use serde::{Deserialize, Serialize};

use crate::stream::{NexusKind, NexusSubtype};

/// Canvas coordinate of a nexus. Presentation-only; the engine carries it
/// through untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NexusModel {
    pub id: String,
    pub kind: NexusKind,
    pub subtype: NexusSubtype,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub position: Position,
    /// Opaque capability config; interpreted only by the dispatched capability.
    #[serde(default)]
    pub config: serde_json::Value,
    /// Named output ports. Empty means the single "default" port.
    #[serde(default)]
    pub output_handles: Vec<String>,
    /// Per-node execution timeout in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}
