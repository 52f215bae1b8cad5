//! Error types for the tracking client.

use thiserror::Error;

/// Fault reported by the remote tracking service or its transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("remote fault {code}: {message}")]
pub struct RemoteFault {
    pub code: i32,
    pub message: String,
}

impl RemoteFault {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Errors produced while building a query or reading a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    /// Bad input, detected before any remote call
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Transport or service-level failure
    #[error(transparent)]
    RemoteFault(#[from] RemoteFault),

    /// Response shape or content violates the expected contract
    #[error("Parse failed: {0}")]
    Parse(String),
}

impl TrackingError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

impl From<quick_xml::DeError> for TrackingError {
    fn from(err: quick_xml::DeError) -> Self {
        TrackingError::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for TrackingError {
    fn from(err: serde_json::Error) -> Self {
        TrackingError::Parse(err.to_string())
    }
}
