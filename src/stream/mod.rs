mod graph;
mod nexus;
mod synapse;

pub use graph::StreamGraph;
pub use nexus::{Nexus, NexusId, NexusKind, NexusStatus, NexusSubtype};
pub use synapse::{DEFAULT_HANDLE, Synapse, SynapseId};
