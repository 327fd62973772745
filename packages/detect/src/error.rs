use thiserror::Error;

pub type DetectResult<T> = Result<T, DetectError>;

#[derive(Error, Debug)]
pub enum DetectError {
    /// The user denied camera access, or no camera exists. The consumer
    /// degrades to manual entry on this.
    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),

    /// No detection capability at all on this platform.
    #[error("No barcode detection capability available")]
    NoCapability,

    /// Frame capture failed at the stream level.
    #[error("Video stream error: {0}")]
    Stream(String),

    /// A genuine decoder failure, as opposed to a frame with no code.
    #[error("Decode error: {0}")]
    Decode(String),
}
