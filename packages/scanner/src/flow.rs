// ABOUTME: The consumer's two-step flow: Form, then Scan
// ABOUTME: Entry-source precedence, auto-submit guard, and submission with re-arm

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use labgate_client::{AccessResult, ClientError, ValidatorClient};
use labgate_core::{Identity, UserKind};
use labgate_detect::{select_backend, CameraAccess, FrameDetector, ScanController, StreamDecoder};
use labgate_storage::{LocalStore, SessionCache};

use crate::error::{ScanError, ScanResult};
use crate::resolve::{resolve_reader_token, token_from_url};

/// UI steps of the consumer. There is no skipping Form; going back from
/// Scan tears down any active capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStep {
    Form,
    Scan,
}

/// Where an acquired token came from, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    EntryUrl,
    Camera,
    SessionCache,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquiredToken {
    pub token: String,
    pub source: TokenSource,
}

/// Result of one submission attempt. Denials and transport failures are
/// outcomes, not errors: the flow stays resumable either way.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Granted(AccessResult),
    Denied {
        reason: String,
        result: AccessResult,
    },
    /// Network unreachable or the response did not parse.
    ContactFailure(String),
}

/// The scanner-portal consumer.
///
/// Owns the pieces the flow shares: the validator client, the local
/// store for the role-scoped identity, the session token cache, and the
/// capture controller. Submission methods take `&mut self`, so one flow
/// instance never has two meaningful submissions in flight.
pub struct ScannerFlow {
    kind: UserKind,
    step: ScanStep,
    identity: Identity,
    client: ValidatorClient,
    store: LocalStore,
    cache: Arc<SessionCache>,
    controller: ScanController,
    /// At most one automatic submission per cache recovery.
    auto_submitted: bool,
    /// Cleared while a submission runs, re-armed after every attempt.
    scan_ready: bool,
}

impl ScannerFlow {
    pub fn new(
        kind: UserKind,
        client: ValidatorClient,
        store: LocalStore,
        cache: Arc<SessionCache>,
    ) -> Self {
        Self {
            kind,
            step: ScanStep::Form,
            identity: Identity::new("", "", ""),
            client,
            store,
            cache,
            controller: ScanController::new(),
            auto_submitted: false,
            scan_ready: true,
        }
    }

    /// Load the identity last used on this portal, if any, so the user
    /// does not re-enter it across sessions.
    pub async fn hydrate(&mut self) {
        if let Some(identity) = self.store.load_identity(self.kind).await {
            debug!("Hydrated identity for {}", self.kind);
            self.identity = identity;
        }
    }

    pub fn set_identity(&mut self, identity: Identity) {
        self.identity = identity.trimmed();
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn step(&self) -> ScanStep {
        self.step
    }

    pub fn is_scan_ready(&self) -> bool {
        self.scan_ready
    }

    /// Move from Form to Scan and acquire a token from the non-camera
    /// entry sources. Camera capture, when wanted, is started separately
    /// with [`start_capture`](Self::start_capture).
    pub fn enter_scan(&mut self, entry_url: Option<&str>) -> Option<AcquiredToken> {
        self.step = ScanStep::Scan;
        self.acquire(entry_url, None)
    }

    /// Source precedence: entry address, then a live camera value, then
    /// the session cache within its TTL.
    ///
    /// An address token is written through to the cache immediately, so
    /// a reload inside the TTL window recovers it from source three. A
    /// cache hit is surfaced at most once until the guard clears.
    pub fn acquire(
        &mut self,
        entry_url: Option<&str>,
        camera_value: Option<&str>,
    ) -> Option<AcquiredToken> {
        if let Some(token) = entry_url.and_then(token_from_url) {
            self.cache.put(token.clone());
            info!("Reader token taken from the entry address");
            return Some(AcquiredToken {
                token,
                source: TokenSource::EntryUrl,
            });
        }

        if let Some(raw) = camera_value {
            if let Some(token) = resolve_reader_token(raw) {
                return Some(AcquiredToken {
                    token,
                    source: TokenSource::Camera,
                });
            }
        }

        if let Some(token) = self.cache.get() {
            if self.auto_submitted {
                debug!("Cache hit suppressed by the auto-submit guard");
                return None;
            }
            self.auto_submitted = true;
            info!("Reader token recovered from the session cache");
            return Some(AcquiredToken {
                token,
                source: TokenSource::SessionCache,
            });
        }

        None
    }

    /// Request a live stream and start capture with the best available
    /// backend. Observed codes arrive on `observed`; a capability
    /// failure here is the caller's cue to fall back to manual entry.
    pub async fn start_capture(
        &self,
        camera: &dyn CameraAccess,
        native: Option<Box<dyn FrameDetector>>,
        fallback: Option<Box<dyn StreamDecoder>>,
        observed: mpsc::Sender<String>,
    ) -> ScanResult<()> {
        let stream = camera.open().await?;
        let backend =
            select_backend(native, fallback).ok_or(labgate_detect::DetectError::NoCapability)?;
        self.controller.start(stream, backend, observed).await;
        Ok(())
    }

    /// Resolve and submit a value observed by the camera.
    pub async fn on_code_observed(&mut self, raw: &str) -> ScanResult<SubmitOutcome> {
        let token = resolve_reader_token(raw).ok_or(ScanError::MissingToken)?;
        self.submit(&token, TokenSource::Camera).await
    }

    /// Submit a manually pasted token.
    pub async fn submit_manual(&mut self, raw: &str) -> ScanResult<SubmitOutcome> {
        let token = resolve_reader_token(raw).ok_or(ScanError::MissingToken)?;
        self.submit(&token, TokenSource::Manual).await
    }

    /// Submit an acquired token against the validator.
    ///
    /// Requires a complete identity and a non-empty token; neither
    /// failure reaches the network. The identity is persisted before
    /// the call so the next session starts filled in. After every
    /// attempt — grant, denial, or transport failure — scanning
    /// readiness is re-armed.
    pub async fn submit(&mut self, token: &str, source: TokenSource) -> ScanResult<SubmitOutcome> {
        if !self.identity.is_complete() {
            return Err(ScanError::IncompleteIdentity);
        }
        let token = token.trim();
        if token.is_empty() {
            return Err(ScanError::MissingToken);
        }

        self.scan_ready = false;
        if let Err(e) = self.store.save_identity(self.kind, &self.identity).await {
            // Persistence is convenience, not a gate on validation.
            warn!("Could not persist identity: {e}");
        }

        let outcome = match self.client.validate(token, &self.identity).await {
            Ok(result) => {
                info!(
                    "Access {}",
                    result.tipo.as_deref().unwrap_or("registrado")
                );
                SubmitOutcome::Granted(result)
            }
            Err(ClientError::Denied { reason, result }) => {
                warn!("Access denied: {reason}");
                SubmitOutcome::Denied { reason, result }
            }
            Err(e) => {
                warn!("Validation attempt failed: {e}");
                SubmitOutcome::ContactFailure("No se pudo contactar al servidor".to_string())
            }
        };

        // A momentary failure must never block the reader lane.
        self.scan_ready = true;
        if source != TokenSource::SessionCache {
            self.auto_submitted = false;
        }
        Ok(outcome)
    }

    /// Explicit back navigation. Any active capture is torn down.
    pub async fn back_to_form(&mut self) {
        self.step = ScanStep::Form;
        self.controller.teardown().await;
    }

    /// Unmount-style teardown of capture resources.
    pub async fn teardown(&self) {
        self.controller.teardown().await;
    }

    pub fn is_capturing(&self) -> bool {
        self.controller.is_capturing()
    }
}
