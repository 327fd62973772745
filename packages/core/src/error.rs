use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Incomplete identity: {0}")]
    IncompleteIdentity(String),

    #[error("Invalid token payload: {0}")]
    InvalidPayload(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
