use std::fmt;

#[derive(Debug, Clone)]
pub enum NexusEvent {
    Running(i64),
    Succeeded(i64),
    Error(ErrorReason),
}

impl NexusEvent {
    pub fn str(&self) -> &str {
        match self {
            NexusEvent::Running(_) => "Running",
            NexusEvent::Succeeded(_) => "Succeeded",
            NexusEvent::Error(_) => "Error",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ErrorReason {
    Timeout,
    Failed(String),
}

impl fmt::Display for ErrorReason {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            ErrorReason::Timeout => write!(f, "Timeout"),
            ErrorReason::Failed(msg) => write!(f, "{}", msg),
        }
    }
}
