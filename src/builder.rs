use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::{Capability, CapabilityRegistry, Config, Engine, Result};

pub struct EngineBuilder {
    config: Config,
    registry: CapabilityRegistry,
    rt: Option<Arc<Runtime>>,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            config: Config::default(),
            registry: CapabilityRegistry::with_defaults(),
            rt: None,
        }
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(
        mut self,
        config: Config,
    ) -> Self {
        self.config = config;
        self
    }

    pub fn async_worker_thread_number(
        mut self,
        n: u16,
    ) -> Self {
        self.config.async_worker_thread_number = n;
        self
    }

    pub fn default_node_timeout_ms(
        mut self,
        timeout_ms: u64,
    ) -> Self {
        self.config.default_node_timeout_ms = Some(timeout_ms);
        self
    }

    /// Register a capability, replacing any built-in serving the same subtype.
    pub fn register_capability(
        mut self,
        capability: Arc<dyn Capability>,
    ) -> Self {
        self.registry.register(capability);
        self
    }

    pub fn runtime(
        mut self,
        runtime: Arc<Runtime>,
    ) -> Self {
        self.rt = Some(runtime);
        self
    }

    pub fn build(self) -> Result<Engine> {
        let runtime = match self.rt {
            Some(rt) => rt,
            None => Arc::new(Builder::new_multi_thread().worker_threads(self.config.async_worker_thread_number.into()).enable_all().build().unwrap()),
        };
        let engine = Engine::new(runtime, self.config, self.registry);

        Ok(engine)
    }
}
