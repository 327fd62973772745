use thiserror::Error;

pub type ScanResult<T> = Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    /// Local validation failure: identity fields missing. No network
    /// call is attempted.
    #[error("Completa nombre, apellido y correo antes de escanear")]
    IncompleteIdentity,

    /// Local validation failure: no resolved token to submit.
    #[error("No reader token to submit")]
    MissingToken,

    /// Camera or detection capability unavailable; the flow degrades to
    /// manual entry.
    #[error("Capture unavailable: {0}")]
    CaptureUnavailable(#[from] labgate_detect::DetectError),

    #[error("Storage error: {0}")]
    Storage(#[from] labgate_storage::StorageError),
}
