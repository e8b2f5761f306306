use serde::{Deserialize, Serialize};

use crate::{
    Result, StreamError,
    model::{NexusModel, SynapseModel},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamModel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    pub nexuses: Vec<NexusModel>,
    pub synapses: Vec<SynapseModel>,
}

impl StreamModel {
    pub fn from_json(s: &str) -> Result<Self> {
        let stream = serde_json::from_str::<StreamModel>(s);
        match stream {
            Ok(v) => Ok(v),
            Err(e) => Err(StreamError::Stream(format!("{}", e))),
        }
    }
}
