use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    Result, StreamError,
    common::Vars,
    model::NexusModel,
    stream::synapse::DEFAULT_HANDLE,
};

/// nexus id
pub type NexusId = String;

/// Traversal role of a nexus.
///
/// Triggers are entry points only: they seed runs and are never enqueued
/// as targets by the scheduler.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NexusKind {
    Trigger,
    #[default]
    Action,
    Logic,
}

/// Closed enumeration selecting which capability a nexus dispatches to.
///
/// The engine only uses this as a registry key; subtypes with no registered
/// capability execute as a logged no-op.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NexusSubtype {
    #[default]
    Webhook,
    Schedule,
    ChatTrigger,
    HttpRequest,
    Agent,
    Delay,
    Condition,
    Logger,
    Email,
    SheetsRead,
    SheetsWrite,
    StaticData,
    WebSearch,
}

/// Per-run execution status of a nexus.
///
/// Transitions only ever move forward: `Idle -> Running -> {Success | Error}`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, strum::AsRefStr, strum::EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NexusStatus {
    #[default]
    Idle,
    Running,
    Success,
    Error,
}

/// Runtime nexus representation.
///
/// Built once per run from the [`NexusModel`] snapshot; carries no mutable
/// execution state. Status and last output live on the run itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nexus {
    /// nexus id
    pub id: NexusId,
    /// traversal role
    pub kind: NexusKind,
    /// capability selector
    pub subtype: NexusSubtype,
    /// display label
    pub label: String,
    /// opaque capability config
    pub config: Vars,
    /// named output ports, never empty
    pub output_handles: Vec<String>,
    /// capability execution timeout
    pub timeout: Option<Duration>,
}

impl Nexus {
    pub fn new(model: &NexusModel) -> Result<Self> {
        if model.id.is_empty() {
            return Err(StreamError::Nexus("nexus id must not be empty".to_string()));
        }

        // Port sets coming from the editor may be absent; normalize to the
        // single default port so every nexus has a non-empty handle set.
        let output_handles = if model.output_handles.is_empty() {
            vec![DEFAULT_HANDLE.to_string()]
        } else {
            model.output_handles.clone()
        };

        Ok(Self {
            id: model.id.clone(),
            kind: model.kind,
            subtype: model.subtype,
            label: if model.label.is_empty() {
                model.id.clone()
            } else {
                model.label.clone()
            },
            config: Vars::from(model.config.clone()),
            output_handles,
            timeout: model.timeout.map(Duration::from_millis),
        })
    }

    /// Resolve a synapse's source handle against this nexus' declared ports.
    ///
    /// An unknown handle falls back to handle index 0 rather than dropping
    /// the synapse.
    pub fn resolve_handle(
        &self,
        handle: &str,
    ) -> String {
        if self.output_handles.iter().any(|h| h == handle) {
            handle.to_string()
        } else {
            self.output_handles[0].clone()
        }
    }
}
