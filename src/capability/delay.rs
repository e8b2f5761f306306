use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::{
    Result,
    common::Vars,
    runtime::FlowSnapshot,
    stream::NexusSubtype,
};

use super::Capability;

/// Suspends the branch for a configured number of milliseconds.
pub struct DelayCapability;

#[async_trait]
impl Capability for DelayCapability {
    fn subtype(&self) -> NexusSubtype {
        NexusSubtype::Delay
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "delay_ms": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Milliseconds to wait before resuming the branch"
                }
            }
        })
    }

    async fn execute(
        &self,
        config: &Vars,
        _: &FlowSnapshot,
    ) -> Result<Vars> {
        let delay_ms = config.get::<u64>("delay_ms").unwrap_or(0);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        let mut output = Vars::new();
        output.set("delayed_ms", delay_ms);
        Ok(output)
    }
}
