//! Synapse definitions for connecting nexuses.
//!
//! A synapse drains exactly one named output port of its source nexus and
//! feeds the target. Endpoints are held by id, not ownership; the graph
//! resolves them defensively at build time.

use serde::{Deserialize, Serialize};

use crate::{model::SynapseModel, stream::nexus::NexusId};

/// Unique identifier for a synapse within a stream.
pub type SynapseId = String;

/// Name of the implicit single output port.
pub const DEFAULT_HANDLE: &str = "default";

/// Runtime synapse representation connecting two nexuses.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Synapse {
    /// Unique synapse identifier.
    pub id: SynapseId,
    /// ID of the source nexus.
    pub source: NexusId,
    /// ID of the target nexus.
    pub target: NexusId,
    /// Which output port this synapse drains.
    pub source_handle: String,
}

impl Synapse {
    pub fn new(model: &SynapseModel) -> Self {
        Self {
            id: model.id.clone(),
            source: model.source.clone(),
            target: model.target.clone(),
            source_handle: model.source_handle.clone().unwrap_or_else(|| DEFAULT_HANDLE.to_string()),
        }
    }
}
