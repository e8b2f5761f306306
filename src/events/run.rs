use crate::stream::NexusId;

#[derive(Debug, Clone)]
pub enum RunEvent {
    Start(RunStartEvent),
    Succeeded,
    Failed(RunFailedEvent),
    Aborted(RunAbortedEvent),
}

impl RunEvent {
    pub fn str(&self) -> &str {
        match self {
            RunEvent::Start(_) => "Running",
            RunEvent::Succeeded => "Succeeded",
            RunEvent::Failed(_) => "Failed",
            RunEvent::Aborted(_) => "Aborted",
        }
    }
}

/// Event emitted when a run starts
#[derive(Debug, Clone)]
pub struct RunStartEvent {
    /// All nexus IDs in the stream for batch initialization
    pub node_ids: Vec<NexusId>,
}

/// Event emitted when a run fails outside any single node's scope.
#[derive(Debug, Clone)]
pub struct RunFailedEvent {
    pub error: String,
}

#[derive(Debug, Clone)]
pub struct RunAbortedEvent {
    pub reason: String,
}
