use thiserror::Error;

pub type ProducerResult<T> = Result<T, ProducerError>;

#[derive(Error, Debug)]
pub enum ProducerError {
    /// Local validation failure; nothing is armed or persisted.
    #[error("Por favor ingresa datos válidos")]
    InvalidIdentity,

    #[error("No generated code to operate on")]
    NothingGenerated,

    #[error("Storage error: {0}")]
    Storage(#[from] labgate_storage::StorageError),

    #[error("Encoding error: {0}")]
    Core(#[from] labgate_core::CoreError),
}
