mod nexus;
mod stream;
mod synapse;

pub use nexus::{NexusModel, Position};
pub use stream::StreamModel;
pub use synapse::SynapseModel;
