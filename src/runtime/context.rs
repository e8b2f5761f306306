//! Per-run execution context.
//!
//! The context owns the flow context (the accumulated mapping from nexus id
//! to that nexus' output within the current run) plus the event channel and
//! the run's completion signal. It is created fresh per run and discarded
//! (or retained for inspection) when the run ends.

use std::{collections::HashMap, sync::Arc};

use crate::{
    common::{MemCache, Shutdown, Vars},
    runtime::{Channel, RunId},
    stream::NexusId,
};

const FLOW_CONTEXT_CAPACITY: usize = 1024;

/// Stable copy of everything produced so far, handed to capabilities.
///
/// A snapshot never observes mutations made after it was taken, keeping a
/// node's execution deterministic with respect to the context it received.
pub type FlowSnapshot = HashMap<NexusId, Vars>;

#[derive(Clone)]
pub struct Context {
    rid: RunId,
    outputs: Arc<MemCache<NexusId, Vars>>,
    channel: Arc<Channel>,

    shutdown: Arc<Shutdown>,
}

impl Context {
    pub fn new(
        rid: RunId,
        channel: Arc<Channel>,
    ) -> Self {
        Self {
            rid,
            outputs: Arc::new(MemCache::new(FLOW_CONTEXT_CAPACITY)),
            channel,
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    /// record a nexus output into the flow context (write-once-per-visit)
    pub fn add_output(
        &self,
        nid: NexusId,
        outputs: Vars,
    ) {
        self.outputs.set(nid, outputs);
    }

    /// get a single nexus output
    pub fn get_output(
        &self,
        nid: &NexusId,
    ) -> Option<Vars> {
        self.outputs.get(nid)
    }

    /// take a stable snapshot of all outputs produced so far
    pub fn snapshot_all(&self) -> FlowSnapshot {
        self.outputs.iter().map(|(nid, vars)| (nid.as_ref().clone(), vars)).collect()
    }

    pub fn channel(&self) -> Arc<Channel> {
        self.channel.clone()
    }

    pub fn rid(&self) -> RunId {
        self.rid.to_owned()
    }

    pub fn done(&self) {
        self.shutdown.shutdown();
    }

    pub fn is_done(&self) -> bool {
        self.shutdown.is_terminated()
    }

    pub fn wait_shutdown(&self) -> impl Future<Output = ()> + Send + 'static {
        self.shutdown.wait()
    }
}
