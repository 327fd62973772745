use thiserror::Error;

use crate::types::AccessResult;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Connectivity failure or timeout; the flow stays resumable.
    #[error("Could not contact the server: {0}")]
    Network(String),

    /// Well-formed non-2xx answer; `reason` is the backend's `error`
    /// field, surfaced verbatim as the denial message.
    #[error("Access denied: {reason}")]
    Denied {
        reason: String,
        result: AccessResult,
    },

    /// The server answered but the body did not parse.
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("Invalid base URL: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Denial reason, when this error is the denial path.
    pub fn denial_reason(&self) -> Option<&str> {
        match self {
            ClientError::Denied { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
