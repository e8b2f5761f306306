use async_trait::async_trait;
use serde_json::{Value, json};

use crate::{
    Result,
    common::Vars,
    runtime::FlowSnapshot,
    stream::NexusSubtype,
};

use super::Capability;

/// Emits the configured content as output.
///
/// Content that parses as a JSON object becomes the output directly;
/// anything else is wrapped under a `content` key.
pub struct StaticDataCapability;

#[async_trait]
impl Capability for StaticDataCapability {
    fn subtype(&self) -> NexusSubtype {
        NexusSubtype::StaticData
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "content": {
                    "type": "string",
                    "description": "Literal data to emit, JSON object or plain text"
                }
            }
        })
    }

    async fn execute(
        &self,
        config: &Vars,
        _: &FlowSnapshot,
    ) -> Result<Vars> {
        let content = config.get::<String>("content").unwrap_or_default();

        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(&content) {
            return Ok(Vars::from(Value::Object(map)));
        }

        let mut output = Vars::new();
        output.set("content", content);
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_json_object_content_becomes_output() {
        let mut config = Vars::new();
        config.set("content", r#"{"lead": "Nexus"}"#);

        let output = StaticDataCapability.execute(&config, &HashMap::new()).await.unwrap();
        assert_eq!(output.get::<String>("lead"), Some("Nexus".to_string()));
    }

    #[tokio::test]
    async fn test_plain_text_content_is_wrapped() {
        let mut config = Vars::new();
        config.set("content", "hello");

        let output = StaticDataCapability.execute(&config, &HashMap::new()).await.unwrap();
        assert_eq!(output.get::<String>("content"), Some("hello".to_string()));
    }
}
