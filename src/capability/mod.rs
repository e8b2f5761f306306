//! Capability dispatch for nexus execution.
//!
//! A capability is the opaque unit of work a nexus subtype performs. The
//! engine never knows what a capability does; it resolves one through the
//! [`CapabilityRegistry`] by subtype, hands it the node config plus a stable
//! flow-context snapshot, and awaits the result.
//!
//! Subtypes with no registered capability are not an error: the scheduler
//! records a logged no-op success for them, so a graph built against
//! collaborators that are not plugged in still traverses cleanly.

pub mod condition;
pub mod delay;
pub mod logger;
pub mod sheets;
pub mod static_data;

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde_json::json;

use crate::{
    Result,
    common::Vars,
    runtime::FlowSnapshot,
    stream::NexusSubtype,
};

pub use condition::ConditionCapability;
pub use delay::DelayCapability;
pub use logger::LoggerCapability;
pub use sheets::SheetsReadCapability;
pub use static_data::StaticDataCapability;

/// A pluggable unit of work dispatched by nexus subtype.
#[async_trait]
pub trait Capability: Send + Sync {
    /// Returns the subtype this capability serves.
    ///
    /// # Returns
    ///
    /// Returns the [`NexusSubtype`] used as the registry key.
    fn subtype(&self) -> NexusSubtype;

    /// Returns the JSON schema of the capability's config.
    ///
    /// # Returns
    ///
    /// Returns a [`serde_json::Value`] representing the schema of the config.
    fn schema(&self) -> serde_json::Value {
        json!({"type": "object"})
    }

    /// Executes the capability with the given config and context snapshot.
    ///
    /// # Arguments
    ///
    /// * `config` - The nexus config, passed through opaquely by the engine.
    /// * `context` - A stable snapshot of all outputs produced so far.
    ///
    /// # Returns
    ///
    /// Returns a [`Result<Vars>`] representing the output of the capability.
    async fn execute(
        &self,
        config: &Vars,
        context: &FlowSnapshot,
    ) -> Result<Vars>;

    /// Validates a config against the capability's schema.
    fn validate(
        &self,
        config: &Vars,
    ) -> Result<()> {
        let schema = self.schema();
        let value: serde_json::Value = config.clone().into();
        jsonschema::validate(&schema, &value)?;
        Ok(())
    }
}

/// Registry mapping each subtype to its capability.
///
/// Dispatch is a pure function of the nexus subtype.
#[derive(Clone, Default)]
pub struct CapabilityRegistry {
    capabilities: HashMap<NexusSubtype, Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    /// create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// create a registry pre-loaded with the built-in capabilities
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ConditionCapability));
        registry.register(Arc::new(DelayCapability));
        registry.register(Arc::new(LoggerCapability));
        registry.register(Arc::new(SheetsReadCapability));
        registry.register(Arc::new(StaticDataCapability));
        registry
    }

    /// register a capability under its declared subtype
    pub fn register(
        &mut self,
        capability: Arc<dyn Capability>,
    ) {
        self.capabilities.insert(capability.subtype(), capability);
    }

    /// resolve the capability for a subtype
    pub fn resolve(
        &self,
        subtype: NexusSubtype,
    ) -> Option<Arc<dyn Capability>> {
        self.capabilities.get(&subtype).cloned()
    }
}
