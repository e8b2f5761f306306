//! Error types for NexusStream.
//!
//! All errors in NexusStream are represented by the `StreamError` enum,
//! which provides specific variants for different error categories.

use std::{io::ErrorKind, string::FromUtf8Error};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all NexusStream operations.
///
/// Each variant represents a specific category of error that can occur
/// during stream definition or execution.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum StreamError {
    /// Engine-level errors (startup, shutdown, single-flight refusal).
    #[error("{0}")]
    Engine(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, schema validation).
    #[error("{0}")]
    Convert(String),

    /// Runtime execution errors.
    #[error("{0}")]
    Runtime(String),

    /// Run lifecycle errors.
    #[error("{0}")]
    Run(String),

    /// Stream definition errors.
    #[error("{0}")]
    Stream(String),

    /// Nexus definition or execution errors.
    #[error("{0}")]
    Nexus(String),

    /// Synapse definition errors.
    #[error("{0}")]
    Synapse(String),

    /// Capability execution errors.
    #[error("{0}")]
    Capability(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),

    /// Message queue errors.
    #[error("{0}")]
    Queue(String),
}

impl From<StreamError> for String {
    fn from(val: StreamError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for StreamError {
    fn from(error: std::io::Error) -> Self {
        StreamError::IoError(error.to_string())
    }
}

impl From<StreamError> for std::io::Error {
    fn from(val: StreamError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<FromUtf8Error> for StreamError {
    fn from(_: FromUtf8Error) -> Self {
        StreamError::Runtime("Error with utf-8 string convert".to_string())
    }
}

impl From<serde_json::Error> for StreamError {
    fn from(error: serde_json::Error) -> Self {
        StreamError::Convert(error.to_string())
    }
}

impl From<jsonschema::ValidationError<'_>> for StreamError {
    fn from(error: jsonschema::ValidationError<'_>) -> Self {
        StreamError::Capability(error.to_string())
    }
}
