//! Event types for stream execution.
//!
//! Events are emitted during a run to notify subscribers about status
//! transitions, completions, errors, and execution-log entries. Transition
//! events are published in the exact order the scheduler performs them;
//! observers rely on `Running` being visible before `Succeeded`/`Error`.

mod log;
mod nexus;
mod run;

pub use log::*;
pub use nexus::*;
pub use run::*;

use crate::{runtime::RunId, stream::NexusId};

/// Generic event wrapper.
#[derive(Debug, Clone)]
pub struct Event<T> {
    inner: T,
}

/// Top-level event type for stream graph events.
#[derive(Debug, Clone)]
pub enum GraphEvent {
    /// Run-level events (start, succeeded, failed, aborted).
    Run(RunEvent),
    /// Nexus-level events (running, succeeded, error).
    Nexus(NexusEvent),
}

/// Event message containing run and nexus context.
#[derive(Debug, Clone)]
pub struct Message {
    /// Run ID that generated this event.
    pub rid: RunId,
    /// Nexus ID that generated this event (empty for run events).
    pub nid: NexusId,
    /// The actual event data.
    pub event: GraphEvent,
}

impl<T> std::ops::Deref for Event<T>
where
    T: std::fmt::Debug + Clone,
{
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> Event<T>
where
    T: std::fmt::Debug + Clone,
{
    pub fn new(inner: &T) -> Self {
        Self {
            inner: inner.clone(),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

impl GraphEvent {
    pub fn is_complete(&self) -> bool {
        matches!(self, GraphEvent::Run(RunEvent::Succeeded))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, GraphEvent::Run(RunEvent::Failed(_)))
    }
}
