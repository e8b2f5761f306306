//! # NexusStream
//!
//! NexusStream is a lightweight stream execution engine for node-based
//! workflows. It is designed to be embedded behind a visual builder and to
//! orchestrate the graphs that builder produces: nodes ("nexuses") represent
//! triggers, actions and logic branches, connected by directed edges
//! ("synapses").
//!
//! ## Core Features
//!
//! - **Breadth-First Traversal**: each trigger seeds a FIFO work queue that
//!   fans out along outgoing synapses, visiting every reachable node exactly
//!   once per run
//! - **Async Execution**: powered by `tokio`; each node's work is an opaque
//!   asynchronous capability resolved through a registry
//! - **Branch Isolation**: a failing node terminates only its own downstream
//!   branch, never the whole run
//! - **Per-Run State**: node status and outputs live on the run itself, so a
//!   finished run stays inspectable and concurrent graphs never corrupt each
//!   other
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nexus_stream::{EngineBuilder, StreamModel};
//!
//! let engine = EngineBuilder::new().build()?;
//! engine.launch();
//!
//! let stream = StreamModel::from_json(json_str)?;
//! let run = engine.build_run(&stream)?;
//! engine.start_run(run.clone())?;
//! ```

mod builder;
mod capability;
mod common;
mod config;
mod engine;
mod error;
mod events;
mod model;
mod runtime;
mod scheduler;
mod stream;
mod utils;

use std::sync::{Arc, RwLock};

pub use builder::EngineBuilder;
pub use capability::{Capability, CapabilityRegistry};
pub use config::Config;
pub use engine::Engine;
pub use error::StreamError;
pub use events::{ErrorReason, Event, GraphEvent, LogEntry, LogStatus, Message, NexusEvent, RunEvent};
pub use model::*;
pub use runtime::{Channel, ChannelEvent, ChannelOptions, FlowSnapshot, NexusRecord, Run, RunId};
pub use stream::{NexusId, NexusKind, NexusStatus, NexusSubtype};

pub use common::Vars;

/// Result type alias for NexusStream operations.
pub type Result<T> = std::result::Result<T, StreamError>;

/// Thread-safe shared lock wrapper using Arc<RwLock<T>>.
pub(crate) type ShareLock<T> = Arc<RwLock<T>>;
