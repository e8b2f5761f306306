//! Stream engine - the main entry point for NexusStream.
//!
//! The engine manages the lifecycle of stream runs, including:
//! - Building run instances from stream models (graph snapshot at run start)
//! - Enforcing the single-flight guard (one run in progress at a time)
//! - Managing the event channel for observability
//! - Graceful shutdown coordination

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::runtime::Runtime;

use crate::{
    Config, Result, ShareLock, StreamError,
    capability::CapabilityRegistry,
    common::{MemCache, Queue, Shutdown},
    events::{GraphEvent, RunEvent},
    model::StreamModel,
    runtime::{Channel, ChannelEvent, ChannelOptions, Run, RunId},
};

/// Maximum number of runs to cache in memory.
const RUN_CACHE_SIZE: usize = 2048;
/// Size of the queue for completed run notifications.
const RUN_COMPLETE_QUEUE_SIZE: usize = 100;

/// The main stream engine.
///
/// Engine is the central coordinator for NexusStream, responsible for:
/// - Managing the tokio runtime for async execution
/// - Coordinating the event channel for pub/sub messaging
/// - Resolving capabilities through the registry
/// - Creating runs and refusing concurrent ones
///
/// # Example
///
/// ```rust,ignore
/// let engine = EngineBuilder::new().build()?;
/// engine.launch();
///
/// let run = engine.build_run(&stream_model)?;
/// let rid = engine.start_run(run)?;
///
/// // Shutdown when done
/// engine.shutdown();
/// ```
pub struct Engine {
    /// Event channel for broadcasting run events.
    channel: Arc<Channel>,
    /// Capability registry shared by all runs.
    registry: Arc<CapabilityRegistry>,
    /// Engine configuration.
    config: Config,
    /// Queue for receiving run completion notifications.
    runs_complete_queue: Arc<Queue<RunId>>,
    /// In-memory cache of recent runs, kept for inspection.
    runs: Arc<MemCache<RunId, Arc<Run>>>,
    /// The run currently in flight, if any (single-flight guard).
    active_run: ShareLock<Option<Arc<Run>>>,

    /// Flag indicating if the engine is running.
    running: Arc<AtomicBool>,
    /// Tokio runtime for async task execution.
    runtime: Arc<Runtime>,
    /// Shutdown coordinator for graceful termination.
    shutdown: Arc<Shutdown>,
}

impl Engine {
    /// Creates a new engine over the given runtime, configuration and
    /// capability registry. Use [`crate::EngineBuilder`] instead of calling
    /// this directly.
    pub(crate) fn new(
        runtime: Arc<Runtime>,
        config: Config,
        registry: CapabilityRegistry,
    ) -> Self {
        let channel = Arc::new(Channel::new(runtime.clone()));
        let runs_complete_queue = Queue::new(RUN_COMPLETE_QUEUE_SIZE);

        Self {
            channel,
            registry: Arc::new(registry),
            config,
            runs_complete_queue,
            runs: Arc::new(MemCache::new(RUN_CACHE_SIZE)),
            active_run: Arc::new(std::sync::RwLock::new(None)),
            running: Arc::new(AtomicBool::new(false)),
            runtime,
            shutdown: Arc::new(Shutdown::new()),
        }
    }

    /// Starts the engine and begins processing events.
    ///
    /// This method:
    /// - Begins listening on the event channel
    /// - Spawns a background task that releases the single-flight guard
    ///   when a run reaches a terminal state
    pub fn launch(&self) {
        if self.running.swap(true, Ordering::Relaxed) {
            return;
        }

        // Register handlers first, then start listening
        // This ensures no events are missed
        self.channel.listen();

        // Every terminal run event releases the single-flight guard.
        let runs_complete_queue = self.runs_complete_queue.clone();
        ChannelEvent::channel(self.channel.clone(), ChannelOptions::default()).on_event(move |e| {
            if let GraphEvent::Run(RunEvent::Succeeded | RunEvent::Failed(_) | RunEvent::Aborted(_)) = &e.event {
                let _ = runs_complete_queue.send(e.rid.clone());
            }
        });

        let runs_complete_queue = self.runs_complete_queue.clone();
        let shutdown = self.shutdown.clone();
        let active_run = self.active_run.clone();
        self.runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.wait() => break,
                    Some(rid) = runs_complete_queue.next_async() => {
                        let mut active = active_run.write().unwrap();
                        if active.as_ref().is_some_and(|run| run.id() == rid) {
                            *active = None;
                        }
                    }
                }
            }
        });
    }

    /// Gracefully shuts down the engine.
    ///
    /// This method:
    /// - Signals all components to stop
    /// - Aborts any run still in flight
    /// - Shuts down the event channel
    pub fn shutdown(&self) {
        if !self.running.swap(false, Ordering::Relaxed) {
            return;
        }

        self.shutdown.shutdown();
        for (_, run) in self.runs.iter() {
            if !run.is_complete() {
                run.abort();
            }
        }
        self.channel.shutdown();
    }

    /// Builds a run from a stream model.
    ///
    /// The graph is snapshotted here: editor mutations made after this call
    /// cannot affect the run's traversal.
    pub fn build_run(
        &self,
        model: &StreamModel,
    ) -> Result<Arc<Run>> {
        if !self.running.load(Ordering::Relaxed) {
            return Err(StreamError::Engine("Engine is not running".to_string()));
        }

        Run::new(
            model,
            self.registry.clone(),
            self.config.default_node_timeout_ms,
            self.channel.clone(),
            self.runtime.clone(),
        )
    }

    /// Starts a run and returns its id.
    ///
    /// Single-flight: while a run is in progress, starting another one is
    /// refused rather than interleaving two traversals.
    pub fn start_run(
        &self,
        run: Arc<Run>,
    ) -> Result<RunId> {
        if !self.running.load(Ordering::Relaxed) {
            return Err(StreamError::Engine("Engine is not running".to_string()));
        }

        {
            let mut active = self.active_run.write().unwrap();
            if active.as_ref().is_some_and(|current| !current.is_complete()) {
                return Err(StreamError::Engine("a run is already in progress".to_string()));
            }
            *active = Some(run.clone());
        }

        let rid = run.id().to_string();
        self.runs.set(rid.clone(), run.clone());

        run.start();

        Ok(rid)
    }

    /// Whether a run is currently in progress.
    pub fn is_run_active(&self) -> bool {
        self.active_run.read().unwrap().as_ref().is_some_and(|run| !run.is_complete())
    }

    /// Aborts a run by its ID.
    pub fn stop(
        &self,
        rid: &str,
    ) -> Result<()> {
        let rid_string = rid.to_string();
        if let Some(run) = self.runs.get(&rid_string) {
            run.abort();
            Ok(())
        } else {
            Err(StreamError::Run(format!("Run {} not found", rid)))
        }
    }

    /// Gets a run by its ID from the cache.
    pub fn get_run(
        &self,
        rid: &RunId,
    ) -> Option<Arc<Run>> {
        self.runs.get(rid)
    }

    /// Returns a reference to the event channel.
    pub fn channel(&self) -> Arc<Channel> {
        self.channel.clone()
    }
}
