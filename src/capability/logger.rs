use async_trait::async_trait;

use crate::{
    Result,
    common::Vars,
    runtime::FlowSnapshot,
    stream::NexusSubtype,
};

use super::Capability;

/// Passthrough logger: emits everything produced so far as its own output,
/// making the accumulated flow context inspectable downstream.
pub struct LoggerCapability;

#[async_trait]
impl Capability for LoggerCapability {
    fn subtype(&self) -> NexusSubtype {
        NexusSubtype::Logger
    }

    async fn execute(
        &self,
        _: &Vars,
        context: &FlowSnapshot,
    ) -> Result<Vars> {
        let mut output = Vars::new();
        for (nid, vars) in context.iter() {
            output.set(nid.as_str(), vars.clone());
        }
        Ok(output)
    }
}
