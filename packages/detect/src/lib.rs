// ABOUTME: Detection strategy selection for the scanner portal
// ABOUTME: Native frame detector or fallback stream decoder, one observed-code event

pub mod backend;
pub mod error;
pub mod session;

pub use backend::{
    select_backend, CameraAccess, DetectionBackend, Frame, FrameDetector, StreamDecodeOutcome,
    StreamDecoder, VideoStream,
};
pub use error::{DetectError, DetectResult};
pub use session::ScanController;
