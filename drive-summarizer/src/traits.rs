use crate::types::{ArtifactPayload, InvocationRequest, Result};
use async_trait::async_trait;
use std::fmt;
use std::path::Path;

/// Sends a single request to the LLM provider. One call is one attempt:
/// implementations never retry on their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &InvocationRequest) -> std::result::Result<String, TransportError>;
}

/// Why a single attempt did not produce text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Non-success HTTP status with the provider's message, if any.
    Status { status: u16, message: String },
    /// Connection failure or timeout before a status was received.
    Network(String),
    /// Success status but no usable completion (empty content or an error body).
    EmptyCompletion(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Status { status, message } => write!(f, "HTTP {}: {}", status, message),
            TransportError::Network(message) => write!(f, "network error: {}", message),
            TransportError::EmptyCompletion(message) => write!(f, "empty completion: {}", message),
        }
    }
}

/// Per-format extraction leaf, selected by file extension.
pub trait Processor: Send + Sync {
    fn processor_name(&self) -> &'static str;

    fn extract(&self, path: &Path) -> Result<ArtifactPayload>;
}
