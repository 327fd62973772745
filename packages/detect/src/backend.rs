// ABOUTME: Capability traits for camera streams and the two decoding backends
// ABOUTME: Feature probing picks one; both feed the same observed-code event

use async_trait::async_trait;

use crate::error::DetectResult;

/// One captured video frame, as luminance bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// A live camera stream whose media tracks can be stopped.
#[async_trait]
pub trait VideoStream: Send {
    /// Capture the next frame. Errors here are stream-level failures,
    /// not decode misses.
    async fn next_frame(&mut self) -> DetectResult<Frame>;

    /// Stop every media track of the stream. Idempotent.
    fn stop_tracks(&mut self);

    /// Whether any track is still live. Used by teardown checks.
    fn has_live_tracks(&self) -> bool;
}

/// Camera acquisition. Failure is a capability error the flow degrades
/// on, never a dead end.
#[async_trait]
pub trait CameraAccess: Send + Sync {
    async fn open(&self) -> DetectResult<Box<dyn VideoStream>>;
}

/// Native frame-level detector, where the platform can decode a single
/// frame on demand.
pub trait FrameDetector: Send + Sync {
    /// All codes found in the frame. An empty result is a miss, not an
    /// error.
    fn detect(&self, frame: &Frame) -> DetectResult<Vec<String>>;
}

/// Per-frame outcome of the fallback stream decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamDecodeOutcome {
    Found(String),
    /// No code in this frame; ignored by the caller.
    NotFound,
}

/// Continuous fallback decoder fed frame by frame, mirroring a
/// video-stream reader that reports every decode attempt.
pub trait StreamDecoder: Send {
    fn decode(&mut self, frame: &Frame) -> DetectResult<StreamDecodeOutcome>;

    /// Release decoder internals so a later session starts clean.
    fn reset(&mut self);
}

/// The strategy chosen for a scan session.
pub enum DetectionBackend {
    /// Poll the native detector on a fixed interval.
    Native(Box<dyn FrameDetector>),
    /// Run the fallback decoder over every frame.
    Stream(Box<dyn StreamDecoder>),
}

impl DetectionBackend {
    pub fn name(&self) -> &'static str {
        match self {
            DetectionBackend::Native(_) => "native-detector",
            DetectionBackend::Stream(_) => "stream-decoder",
        }
    }
}

/// Capability probe: prefer the native detector when the platform has
/// one, otherwise fall back to the stream decoder.
pub fn select_backend(
    native: Option<Box<dyn FrameDetector>>,
    fallback: Option<Box<dyn StreamDecoder>>,
) -> Option<DetectionBackend> {
    match (native, fallback) {
        (Some(detector), _) => Some(DetectionBackend::Native(detector)),
        (None, Some(decoder)) => Some(DetectionBackend::Stream(decoder)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopDetector;
    impl FrameDetector for NoopDetector {
        fn detect(&self, _frame: &Frame) -> DetectResult<Vec<String>> {
            Ok(vec![])
        }
    }

    struct NoopDecoder;
    impl StreamDecoder for NoopDecoder {
        fn decode(&mut self, _frame: &Frame) -> DetectResult<StreamDecodeOutcome> {
            Ok(StreamDecodeOutcome::NotFound)
        }
        fn reset(&mut self) {}
    }

    #[test]
    fn native_detector_wins_the_probe() {
        let backend = select_backend(Some(Box::new(NoopDetector)), Some(Box::new(NoopDecoder)));
        assert_eq!(backend.unwrap().name(), "native-detector");
    }

    #[test]
    fn fallback_is_used_without_native_capability() {
        let backend = select_backend(None, Some(Box::new(NoopDecoder)));
        assert_eq!(backend.unwrap().name(), "stream-decoder");
    }

    #[test]
    fn no_capability_probes_to_none() {
        assert!(select_backend(None, None).is_none());
    }
}
