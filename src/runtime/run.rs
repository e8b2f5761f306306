//! A single run of a stream.
//!
//! A `Run` owns everything that is per-invocation: the graph snapshot, the
//! flow context, the per-nexus status records and the execution log. Node
//! status never lives on the graph itself, so a finished run stays
//! inspectable and two runs of the same stream can never corrupt each
//! other's observable state.

use std::{collections::HashMap, sync::Arc};

use serde_json::Value;
use tokio::runtime::Runtime;

use crate::{
    Result, ShareLock,
    capability::CapabilityRegistry,
    common::{Queue, Vars},
    events::LogEntry,
    model::StreamModel,
    runtime::{Channel, Context},
    scheduler::Scheduler,
    stream::{NexusId, NexusStatus, StreamGraph},
    utils,
};

const COMMAND_QUEUE_SIZE: usize = 100;

pub type RunId = String;

#[derive(Debug, Clone)]
pub enum RunCommand {
    Start,
    Abort,
}

/// Per-run record of one nexus' observable state.
#[derive(Debug, Clone, Default)]
pub struct NexusRecord {
    /// Current status, transitions `Idle -> Running -> {Success | Error}`.
    pub status: NexusStatus,
    /// Most recent output, or the error message after a failed visit.
    pub last_output: Option<Value>,
}

/// Mutable run-scoped state: status records plus the append-only log.
#[derive(Default)]
pub struct RunState {
    records: HashMap<NexusId, NexusRecord>,
    log: Vec<LogEntry>,
}

impl RunState {
    pub fn new(node_ids: Vec<NexusId>) -> Self {
        Self {
            records: node_ids.into_iter().map(|nid| (nid, NexusRecord::default())).collect(),
            log: Vec::new(),
        }
    }

    pub fn mark_running(
        &mut self,
        nid: &NexusId,
    ) {
        self.records.entry(nid.clone()).or_default().status = NexusStatus::Running;
    }

    pub fn mark_success(
        &mut self,
        nid: &NexusId,
        output: Vars,
    ) {
        let record = self.records.entry(nid.clone()).or_default();
        record.status = NexusStatus::Success;
        record.last_output = Some(output.into());
    }

    pub fn mark_error(
        &mut self,
        nid: &NexusId,
        message: String,
    ) {
        let record = self.records.entry(nid.clone()).or_default();
        record.status = NexusStatus::Error;
        record.last_output = Some(Value::String(message));
    }

    pub fn append_log(
        &mut self,
        entry: LogEntry,
    ) {
        self.log.push(entry);
    }

    pub fn record(
        &self,
        nid: &NexusId,
    ) -> Option<&NexusRecord> {
        self.records.get(nid)
    }

    pub fn records(&self) -> HashMap<NexusId, NexusRecord> {
        self.records.clone()
    }

    pub fn log(&self) -> Vec<LogEntry> {
        self.log.clone()
    }
}

#[derive(Clone)]
pub struct Run {
    id: RunId,
    sid: String,
    ctx: Arc<Context>,
    state: ShareLock<RunState>,
    scheduler: Arc<Scheduler>,
    command_queue: Arc<Queue<RunCommand>>,
}

impl std::fmt::Debug for Run {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Run")
            .field("id", &self.id)
            .field("sid", &self.sid)
            .finish_non_exhaustive()
    }
}

impl Run {
    pub fn new(
        model: &StreamModel,
        registry: Arc<CapabilityRegistry>,
        default_timeout_ms: Option<u64>,
        channel: Arc<Channel>,
        runtime: Arc<Runtime>,
    ) -> Result<Arc<Run>> {
        let rid = utils::longid();

        // Snapshot the graph at run creation; editor mutations made after
        // this point cannot affect this run's traversal.
        let graph = Arc::new(StreamGraph::try_from(model)?);

        let ctx = Arc::new(Context::new(rid.to_owned(), channel.clone()));
        let state = ShareLock::new(RunState::new(graph.node_ids()).into());

        let command_queue = Queue::new(COMMAND_QUEUE_SIZE);

        let scheduler = Arc::new(Scheduler::new(
            ctx.clone(),
            graph,
            registry,
            state.clone(),
            command_queue.clone(),
            runtime.clone(),
            default_timeout_ms,
        ));

        Ok(Arc::new(Run {
            id: rid,
            sid: model.id.clone(),
            ctx,
            state,
            scheduler,
            command_queue,
        }))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn start(&self) {
        self.scheduler.start();

        // Kick off the traversal
        let _ = self.command_queue.send(RunCommand::Start);
    }

    pub fn abort(&self) {
        let _ = self.command_queue.send(RunCommand::Abort);
    }

    pub fn is_complete(&self) -> bool {
        self.scheduler.is_complete()
    }

    /// Per-nexus `{status, last_output}` map, readable during and after the run.
    pub fn records(&self) -> HashMap<NexusId, NexusRecord> {
        self.state.read().unwrap().records()
    }

    /// The execution log accumulated so far, in execution order.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.state.read().unwrap().log()
    }

    /// All nexus outputs collected into a single map.
    pub fn outputs(&self) -> Vars {
        let mut result = Vars::new();
        for (nid, vars) in self.ctx.snapshot_all() {
            result.set(nid.as_str(), vars);
        }
        result
    }
}
