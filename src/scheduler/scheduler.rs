//! Stream scheduler: per-trigger breadth-first traversal.
//!
//! The scheduler is responsible for:
//! - Seeding a FIFO work queue from each trigger's outgoing synapses
//! - Executing every reachable nexus exactly once per run (visited-set
//!   deduplication, which also makes cyclic graphs safe)
//! - Serializing status transitions so observers always see `running`
//!   before `success`/`error`
//! - Terminating a branch on first failure while already-enqueued siblings
//!   continue
//!
//! One run is one cooperative control flow: node executions are awaited one
//! at a time, so flow-context reads never race writes.

use std::{
    collections::{HashSet, VecDeque},
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::runtime::Runtime;
use tracing::{debug, warn};

use crate::{
    Result, ShareLock, StreamError,
    capability::CapabilityRegistry,
    common::{Queue, Shutdown, Vars},
    events::{ErrorReason, Event, GraphEvent, LogEntry, LogStatus, Message, NexusEvent, RunAbortedEvent, RunEvent, RunFailedEvent, RunStartEvent},
    runtime::{Context, RunCommand, RunState},
    stream::{Nexus, NexusId, NexusKind, StreamGraph},
    utils,
};

pub struct Scheduler {
    /// Execution context with flow outputs and the event channel.
    ctx: Arc<Context>,
    /// The stream graph snapshot to traverse.
    graph: Arc<StreamGraph>,
    /// Capability registry for subtype dispatch.
    registry: Arc<CapabilityRegistry>,
    /// Per-run status records and execution log.
    state: ShareLock<RunState>,
    /// Queue for receiving run commands.
    command_queue: Arc<Queue<RunCommand>>,
    /// Tokio runtime for spawning the traversal task.
    runtime: Arc<Runtime>,
    /// Shutdown coordinator; terminated means the run is finished.
    shutdown: Arc<Shutdown>,
    /// Engine-wide node timeout, overridable per nexus.
    default_timeout: Option<Duration>,
}

impl Scheduler {
    pub fn new(
        ctx: Arc<Context>,
        graph: Arc<StreamGraph>,
        registry: Arc<CapabilityRegistry>,
        state: ShareLock<RunState>,
        command_queue: Arc<Queue<RunCommand>>,
        runtime: Arc<Runtime>,
        default_timeout_ms: Option<u64>,
    ) -> Self {
        Self {
            ctx,
            graph,
            registry,
            state,
            command_queue,
            runtime,
            shutdown: Arc::new(Shutdown::new()),
            default_timeout: default_timeout_ms.map(Duration::from_millis),
        }
    }

    /// Starts the scheduler's command loop.
    ///
    /// `Start` launches the traversal; `Abort` cancels it at the next
    /// suspension point. Every exit path publishes a terminal run event and
    /// marks the run finished.
    pub fn start(&self) {
        let ctx = self.ctx.clone();
        let graph = self.graph.clone();
        let registry = self.registry.clone();
        let state = self.state.clone();
        let command_queue = self.command_queue.clone();
        let shutdown = self.shutdown.clone();
        let default_timeout = self.default_timeout;

        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,

                    cmd_opt = command_queue.next_async() => {
                        let Some(cmd) = cmd_opt else { break };
                        match cmd {
                            RunCommand::Start => {
                                Self::publish_run_event(&ctx, RunEvent::Start(RunStartEvent {
                                    node_ids: graph.node_ids(),
                                }));

                                let traversal = Self::traverse(&ctx, &graph, &registry, &state, default_timeout);
                                tokio::pin!(traversal);

                                // Keep draining the command queue while the
                                // traversal runs so an abort lands mid-run.
                                let outcome = loop {
                                    tokio::select! {
                                        result = &mut traversal => break Some(result),
                                        cmd = command_queue.next_async() => {
                                            if matches!(cmd, Some(RunCommand::Abort) | None) {
                                                break None;
                                            }
                                        }
                                    }
                                };

                                match outcome {
                                    Some(Ok(())) => Self::publish_run_event(&ctx, RunEvent::Succeeded),
                                    Some(Err(e)) => Self::publish_run_event(&ctx, RunEvent::Failed(RunFailedEvent {
                                        error: e.to_string(),
                                    })),
                                    None => Self::publish_run_event(&ctx, RunEvent::Aborted(RunAbortedEvent {
                                        reason: "Aborted by command".to_string(),
                                    })),
                                }

                                // The run-finished transition must happen on
                                // every exit path, success or failure.
                                ctx.done();
                                shutdown.shutdown();
                            }
                            RunCommand::Abort => {
                                Self::publish_run_event(&ctx, RunEvent::Aborted(RunAbortedEvent {
                                    reason: "Aborted by command".to_string(),
                                }));
                                ctx.done();
                                shutdown.shutdown();
                            }
                        }
                    }
                }
            }
        });
    }

    /// Stops the scheduler.
    pub fn stop(&self) {
        self.shutdown.shutdown();
    }

    /// Checks whether the run has finished (succeeded, failed or aborted).
    pub fn is_complete(&self) -> bool {
        self.shutdown.is_terminated()
    }

    /// Runs the full traversal: every trigger sequentially, breadth-first.
    async fn traverse(
        ctx: &Arc<Context>,
        graph: &Arc<StreamGraph>,
        registry: &Arc<CapabilityRegistry>,
        state: &ShareLock<RunState>,
        default_timeout: Option<Duration>,
    ) -> Result<()> {
        // One visited set per run: a nexus reachable from several triggers
        // or via several paths still executes at most once.
        let mut visited: HashSet<NexusId> = HashSet::new();

        for trigger in graph.trigger_nodes() {
            visited.insert(trigger.id.clone());
            Self::fire_trigger(ctx, state, trigger)?;

            let mut queue: VecDeque<NexusId> = graph.outgoing_synapses(&trigger.id).iter().map(|s| s.target.clone()).collect();

            while let Some(nid) = queue.pop_front() {
                if visited.contains(&nid) {
                    continue;
                }
                visited.insert(nid.clone());

                let Some(nexus) = graph.get_node(&nid) else {
                    warn!(nexus = %nid, "skipping missing nexus referenced by synapse");
                    continue;
                };

                // Triggers are entry points only; a synapse pointing at one
                // never executes it.
                if nexus.kind == NexusKind::Trigger {
                    continue;
                }

                let succeeded = Self::execute_node(ctx, registry, state, nexus, default_timeout).await?;
                if succeeded {
                    for synapse in graph.outgoing_synapses(&nid) {
                        queue.push_back(synapse.target.clone());
                    }
                }
                // On error the branch terminates here: nothing downstream of
                // this nexus is enqueued, while siblings already in the
                // queue keep going.
            }
        }

        Ok(())
    }

    /// Fires a trigger: synthesizes its payload and records it as executed.
    fn fire_trigger(
        ctx: &Arc<Context>,
        state: &ShareLock<RunState>,
        trigger: &Nexus,
    ) -> Result<()> {
        let start_ts = utils::time::time_millis();

        Self::mark_running(ctx, state, &trigger.id, start_ts)?;

        let mut payload = Vars::new();
        payload.set("source", trigger.subtype.as_ref());
        payload.set("timestamp", start_ts);
        payload.set("data", "Incoming Trigger Data");

        ctx.add_output(trigger.id.clone(), payload.clone());

        let mut state_guard = state.write().map_err(|_| StreamError::Runtime("run state lock poisoned".to_string()))?;
        state_guard.mark_success(&trigger.id, payload.clone());
        drop(state_guard);

        Self::publish_nexus_event(ctx, &trigger.id, NexusEvent::Succeeded(utils::time::time_millis()));
        Self::append_log(
            ctx,
            state,
            LogEntry {
                id: utils::longid(),
                run_id: ctx.rid(),
                timestamp: utils::time::time_millis(),
                nexus_id: trigger.id.clone(),
                status: LogStatus::Success,
                message: format!("Fired {}", trigger.label),
                duration_ms: 0,
                output_data: Some(payload),
            },
        )?;

        debug!(nexus = %trigger.id, "trigger fired");
        Ok(())
    }

    /// Executes a single nexus under the status state machine.
    ///
    /// Returns whether the branch should continue (true on success).
    async fn execute_node(
        ctx: &Arc<Context>,
        registry: &Arc<CapabilityRegistry>,
        state: &ShareLock<RunState>,
        nexus: &Nexus,
        default_timeout: Option<Duration>,
    ) -> Result<bool> {
        let start_ts = utils::time::time_millis();
        let started = Instant::now();

        // Running is set before invocation and is externally observable.
        Self::mark_running(ctx, state, &nexus.id, start_ts)?;

        let outcome: std::result::Result<Vars, ErrorReason> = match registry.resolve(nexus.subtype) {
            None => {
                // Unknown subtypes never crash the run; the visit is a
                // logged no-op with empty output.
                warn!(nexus = %nexus.id, subtype = %nexus.subtype.as_ref(), "no capability registered, treating as no-op");
                Ok(Vars::new())
            }
            Some(capability) => {
                let snapshot = ctx.snapshot_all();
                let invoke = async {
                    capability.validate(&nexus.config)?;
                    capability.execute(&nexus.config, &snapshot).await
                };

                match nexus.timeout.or(default_timeout) {
                    Some(limit) => match tokio::time::timeout(limit, invoke).await {
                        Ok(result) => result.map_err(|e| ErrorReason::Failed(e.to_string())),
                        Err(_) => Err(ErrorReason::Timeout),
                    },
                    None => invoke.await.map_err(|e| ErrorReason::Failed(e.to_string())),
                }
            }
        };

        let duration_ms = started.elapsed().as_millis() as i64;
        let settled_ts = utils::time::time_millis();

        match outcome {
            Ok(output) => {
                ctx.add_output(nexus.id.clone(), output.clone());

                let mut state_guard = state.write().map_err(|_| StreamError::Runtime("run state lock poisoned".to_string()))?;
                state_guard.mark_success(&nexus.id, output.clone());
                drop(state_guard);

                Self::publish_nexus_event(ctx, &nexus.id, NexusEvent::Succeeded(settled_ts));
                Self::append_log(
                    ctx,
                    state,
                    LogEntry {
                        id: utils::longid(),
                        run_id: ctx.rid(),
                        timestamp: settled_ts,
                        nexus_id: nexus.id.clone(),
                        status: LogStatus::Success,
                        message: format!("Executed {}", nexus.label),
                        duration_ms,
                        output_data: Some(output),
                    },
                )?;

                Ok(true)
            }
            Err(reason) => {
                let message = reason.to_string();

                let mut state_guard = state.write().map_err(|_| StreamError::Runtime("run state lock poisoned".to_string()))?;
                state_guard.mark_error(&nexus.id, message.clone());
                drop(state_guard);

                Self::publish_nexus_event(ctx, &nexus.id, NexusEvent::Error(reason));
                Self::append_log(
                    ctx,
                    state,
                    LogEntry {
                        id: utils::longid(),
                        run_id: ctx.rid(),
                        timestamp: settled_ts,
                        nexus_id: nexus.id.clone(),
                        status: LogStatus::Error,
                        message,
                        duration_ms,
                        output_data: None,
                    },
                )?;

                Ok(false)
            }
        }
    }

    fn mark_running(
        ctx: &Arc<Context>,
        state: &ShareLock<RunState>,
        nid: &NexusId,
        timestamp: i64,
    ) -> Result<()> {
        let mut state_guard = state.write().map_err(|_| StreamError::Runtime("run state lock poisoned".to_string()))?;
        state_guard.mark_running(nid);
        drop(state_guard);

        Self::publish_nexus_event(ctx, nid, NexusEvent::Running(timestamp));
        Ok(())
    }

    fn append_log(
        ctx: &Arc<Context>,
        state: &ShareLock<RunState>,
        entry: LogEntry,
    ) -> Result<()> {
        let mut state_guard = state.write().map_err(|_| StreamError::Runtime("run state lock poisoned".to_string()))?;
        state_guard.append_log(entry.clone());
        drop(state_guard);

        let _ = ctx.channel().log_queue().send(Event::new(&entry));
        Ok(())
    }

    fn publish_nexus_event(
        ctx: &Arc<Context>,
        nid: &NexusId,
        event: NexusEvent,
    ) {
        let _ = ctx.channel().event_queue().send(Event::new(&Message {
            rid: ctx.rid(),
            nid: nid.clone(),
            event: GraphEvent::Nexus(event),
        }));
    }

    fn publish_run_event(
        ctx: &Arc<Context>,
        event: RunEvent,
    ) {
        let _ = ctx.channel().event_queue().send(Event::new(&Message {
            rid: ctx.rid(),
            nid: "".to_string(),
            event: GraphEvent::Run(event),
        }));
    }
}
