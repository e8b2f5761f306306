use async_trait::async_trait;
use serde_json::json;

use crate::{
    Result,
    common::Vars,
    runtime::FlowSnapshot,
    stream::NexusSubtype,
};

use super::Capability;

/// Spreadsheet reader stub.
///
/// Real spreadsheet I/O is an external collaborator; the built-in returns a
/// fixed sample range so graphs stay runnable without credentials.
pub struct SheetsReadCapability;

#[async_trait]
impl Capability for SheetsReadCapability {
    fn subtype(&self) -> NexusSubtype {
        NexusSubtype::SheetsRead
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "sheet_id": {
                    "type": "string",
                    "description": "Spreadsheet identifier"
                },
                "range": {
                    "type": "string",
                    "description": "A1-notation range to read (e.g. 'Sheet1!A1:Z100')"
                }
            }
        })
    }

    async fn execute(
        &self,
        config: &Vars,
        _: &FlowSnapshot,
    ) -> Result<Vars> {
        let range = config.get::<String>("range").unwrap_or_else(|| "Sheet1!A1:Z100".to_string());

        let mut output = Vars::new();
        output.set("range", range);
        output.set("rows", json!([["ID", "Name"], ["1", "Nexus Lead"]]));
        Ok(output)
    }
}
