mod channel;
mod context;
mod run;

pub use channel::{Channel, ChannelEvent, ChannelOptions};
pub use context::{Context, FlowSnapshot};
pub use run::{NexusRecord, Run, RunCommand, RunId, RunState};
