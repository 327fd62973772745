// ABOUTME: Scan session driving one backend until a single code is observed
// ABOUTME: Teardown clears the poll task, resets the decoder, and stops tracks

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};
use tracing::{debug, info, warn};

use labgate_core::DETECT_POLL_INTERVAL_MS;

use crate::backend::{DetectionBackend, FrameDetector, StreamDecodeOutcome, VideoStream};

struct Resources {
    stream: Option<Box<dyn VideoStream>>,
    decoder: Option<Box<dyn crate::backend::StreamDecoder>>,
}

/// Runs one detection backend against a live stream and forwards the
/// first observed code to the session channel.
///
/// Both backends stop capture before forwarding, so a validation call
/// never races the next decode tick. `teardown` is safe on every exit
/// path and releases all three resources unconditionally.
pub struct ScanController {
    task: Mutex<Option<JoinHandle<()>>>,
    resources: Arc<AsyncMutex<Resources>>,
}

impl Default for ScanController {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanController {
    pub fn new() -> Self {
        Self {
            task: Mutex::new(None),
            resources: Arc::new(AsyncMutex::new(Resources {
                stream: None,
                decoder: None,
            })),
        }
    }

    /// Start capturing with the given backend. Any previous capture is
    /// torn down first, so at most one poll task is ever live.
    pub async fn start(
        &self,
        stream: Box<dyn VideoStream>,
        backend: DetectionBackend,
        observed: mpsc::Sender<String>,
    ) {
        self.teardown().await;

        let mut resources = self.resources.lock().await;
        resources.stream = Some(stream);
        info!("Starting scan with the {} backend", backend.name());

        let shared = Arc::clone(&self.resources);
        let handle = match backend {
            DetectionBackend::Native(detector) => {
                tokio::spawn(poll_native(shared, detector, observed))
            }
            DetectionBackend::Stream(decoder) => {
                resources.decoder = Some(decoder);
                tokio::spawn(read_stream(shared, observed))
            }
        };
        drop(resources);

        *self.task.lock().expect("scan task slot poisoned") = Some(handle);
    }

    /// Clear the poll task, reset the fallback decoder, and stop all
    /// media tracks. All three happen even if only a subset was active.
    pub async fn teardown(&self) {
        if let Some(handle) = self.task.lock().expect("scan task slot poisoned").take() {
            handle.abort();
        }
        let mut resources = self.resources.lock().await;
        if let Some(decoder) = resources.decoder.as_mut() {
            decoder.reset();
        }
        resources.decoder = None;
        if let Some(stream) = resources.stream.as_mut() {
            stream.stop_tracks();
        }
        resources.stream = None;
        debug!("Scan capture torn down");
    }

    /// Whether a capture task is currently armed.
    pub fn is_capturing(&self) -> bool {
        self.task
            .lock()
            .expect("scan task slot poisoned")
            .as_ref()
            .map(|t| !t.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        // Async teardown may never run; the poll task at least must not
        // outlive its controller.
        if let Ok(mut slot) = self.task.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

/// Native path: poll decoded frames on a fixed interval until exactly
/// one code is found, then stop polling and the stream before
/// forwarding.
async fn poll_native(
    shared: Arc<AsyncMutex<Resources>>,
    detector: Box<dyn FrameDetector>,
    observed: mpsc::Sender<String>,
) {
    let mut ticker = interval(Duration::from_millis(DETECT_POLL_INTERVAL_MS));
    loop {
        ticker.tick().await;
        let mut resources = shared.lock().await;
        let Some(stream) = resources.stream.as_mut() else {
            return;
        };
        let frame = match stream.next_frame().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Frame capture failed, keeping the poll alive: {e}");
                continue;
            }
        };
        match detector.detect(&frame) {
            Ok(mut codes) if codes.len() == 1 => {
                let code = codes.remove(0);
                stream.stop_tracks();
                resources.stream = None;
                drop(resources);
                debug!("Native detector observed a code");
                let _ = observed.send(code).await;
                return;
            }
            Ok(_) => {
                // Zero or several codes in frame: keep polling until the
                // reader presents exactly one.
            }
            Err(e) => warn!("Native detect failed on this frame: {e}"),
        }
    }
}

/// Fallback path: continuous frame decoding. A frame without a code is
/// not an error; genuine decode errors are logged and the stream keeps
/// running. The first success stops reader and stream before
/// forwarding, mirroring the native path.
async fn read_stream(shared: Arc<AsyncMutex<Resources>>, observed: mpsc::Sender<String>) {
    loop {
        let mut resources = shared.lock().await;
        let Some(stream) = resources.stream.as_mut() else {
            return;
        };
        let frame = match stream.next_frame().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Frame capture failed, keeping the reader alive: {e}");
                drop(resources);
                sleep(Duration::from_millis(50)).await;
                continue;
            }
        };
        let Some(decoder) = resources.decoder.as_mut() else {
            return;
        };
        match decoder.decode(&frame) {
            Ok(StreamDecodeOutcome::Found(code)) => {
                decoder.reset();
                resources.decoder = None;
                if let Some(stream) = resources.stream.as_mut() {
                    stream.stop_tracks();
                }
                resources.stream = None;
                drop(resources);
                debug!("Stream decoder observed a code");
                let _ = observed.send(code).await;
                return;
            }
            Ok(StreamDecodeOutcome::NotFound) => {}
            Err(e) => warn!("Decode attempt failed, stream continues: {e}"),
        }
        drop(resources);
        tokio::task::yield_now().await;
    }
}
