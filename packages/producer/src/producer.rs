// ABOUTME: The producer-side token lifecycle
// ABOUTME: Idle -> Active(expiring) -> Expired, or Idle -> Active(renewing) self-loop

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};
use tracing::{debug, info};

use labgate_core::{
    now_ms, Identity, TokenPayload, TokenStatus, UserKind, EXPIRY_WINDOW_MS, RENEWAL_PERIOD_MS,
};
use labgate_storage::LocalStore;

use crate::error::{ProducerError, ProducerResult};

/// Named states of the producer lifecycle, replacing the flag pairs
/// (`qrExpired`, `autoRenewal`, live interval) that allowed impossible
/// combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProducerPhase {
    /// No code generated yet.
    Idle,
    /// A code is live and a one-shot expiry is armed.
    Expiring,
    /// A code is live and the repeating renewal timer is armed.
    Renewing,
    /// The expiry window elapsed with renewal off.
    Expired,
}

struct Inner {
    phase: ProducerPhase,
    payload: Option<TokenPayload>,
    auto_renewal: bool,
    timer: Option<JoinHandle<()>>,
}

impl Inner {
    fn clear_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
        }
    }
}

/// Producer of time-bounded identity codes.
///
/// Exactly one timer (one-shot expiry or repeating renewal) is live at
/// any moment; every transition aborts the previous timer before arming
/// the next. Dropping the producer aborts whatever is armed.
pub struct TokenProducer {
    kind: UserKind,
    store: LocalStore,
    inner: Arc<Mutex<Inner>>,
}

impl TokenProducer {
    pub fn new(kind: UserKind, store: LocalStore) -> Self {
        Self {
            kind,
            store,
            inner: Arc::new(Mutex::new(Inner {
                phase: ProducerPhase::Idle,
                payload: None,
                auto_renewal: false,
                timer: None,
            })),
        }
    }

    pub fn kind(&self) -> UserKind {
        self.kind
    }

    pub fn phase(&self) -> ProducerPhase {
        self.lock().phase
    }

    pub fn auto_renewal(&self) -> bool {
        self.lock().auto_renewal
    }

    /// The payload as last stamped by a generate/renewal transition.
    pub fn payload(&self) -> Option<TokenPayload> {
        self.lock().payload.clone()
    }

    /// Generate a fresh code for the given identity.
    ///
    /// Requires a complete identity; on failure nothing is persisted and
    /// no timer is armed. On success the identity is appended to the
    /// saved-users list (duplicates allowed), stored as the role's last
    /// identity, and the timer for the current renewal preference is
    /// armed.
    pub async fn generate(&self, identity: &Identity) -> ProducerResult<TokenPayload> {
        let trimmed = identity
            .ensure_complete()
            .map_err(|_| ProducerError::InvalidIdentity)?;

        let payload = TokenPayload::valid(&trimmed, self.kind, now_ms());
        self.store.append_saved_user(&payload).await?;
        self.store.save_identity(self.kind, &trimmed).await?;

        let mut inner = self.lock();
        inner.payload = Some(payload.clone());
        self.arm(&mut inner);
        info!("Generated {} code for {}", self.kind, trimmed.email);
        Ok(inner.payload.clone().unwrap_or(payload))
    }

    /// Re-arm from a previously saved payload, exactly like a fresh
    /// generate but without re-validating field contents.
    pub fn select_saved(&self, saved: &TokenPayload) -> TokenPayload {
        let mut inner = self.lock();
        let mut payload = saved.clone();
        payload.timestamp = now_ms();
        payload.status = TokenStatus::Valid;
        payload.expired = None;
        payload.auto_renewal = None;
        payload.tipo_usuario = self.kind;
        inner.payload = Some(payload.clone());
        self.arm(&mut inner);
        inner.payload.clone().unwrap_or(payload)
    }

    /// Switch the renewal preference.
    ///
    /// Turning renewal on cancels any pending one-shot expiry and arms
    /// the repeating timer. Turning it off cancels the repeating timer
    /// and arms a fresh 15-second expiry measured from this instant,
    /// unless the code already expired, in which case it stays expired.
    pub fn set_auto_renewal(&self, enabled: bool) {
        let mut inner = self.lock();
        if inner.auto_renewal == enabled {
            return;
        }
        inner.auto_renewal = enabled;

        if inner.payload.is_none() {
            // Preference only; nothing live to re-arm.
            inner.clear_timer();
            return;
        }

        let still_expired = inner
            .payload
            .as_ref()
            .map(|p| p.expired == Some(true))
            .unwrap_or(false);
        if !enabled && still_expired {
            // Already expired and no renewal tick revived it: keep it
            // that way instead of granting a fresh window.
            inner.clear_timer();
            inner.phase = ProducerPhase::Expired;
            if let Some(payload) = inner.payload.as_mut() {
                payload.auto_renewal = None;
            }
            return;
        }

        self.arm(&mut inner);
    }

    pub fn toggle_auto_renewal(&self) {
        let enabled = self.auto_renewal();
        self.set_auto_renewal(!enabled);
    }

    /// The encoded string a reader displays right now.
    ///
    /// Under renewal the render re-stamps the timestamp, so the most
    /// recent render always wins over the last tick.
    pub fn current_code(&self) -> ProducerResult<String> {
        let inner = self.lock();
        let payload = inner.payload.as_ref().ok_or(ProducerError::NothingGenerated)?;
        if inner.phase == ProducerPhase::Renewing {
            let mut rendered = payload.clone();
            rendered.timestamp = now_ms().max(payload.timestamp);
            rendered.auto_renewal = Some(true);
            rendered.status = TokenStatus::Valid;
            rendered.expired = None;
            return Ok(rendered.encode()?);
        }
        Ok(payload.encode()?)
    }

    /// Clear the live timer and forget the current code, as when the
    /// producer screen unmounts.
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        inner.clear_timer();
        inner.payload = None;
        inner.phase = ProducerPhase::Idle;
    }

    /// Saved identities available for re-selection.
    pub async fn saved_users(&self) -> Vec<TokenPayload> {
        self.store.saved_users().await
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("producer state poisoned")
    }

    /// Arm the timer for the current renewal preference, atomically
    /// replacing whatever was armed before.
    fn arm(&self, inner: &mut MutexGuard<'_, Inner>) {
        inner.clear_timer();

        if inner.auto_renewal {
            // The stored payload keeps its expiry markers until the next
            // tick; the render path already presents renewal-mode codes
            // as valid.
            if let Some(payload) = inner.payload.as_mut() {
                payload.auto_renewal = Some(true);
            }
            inner.phase = ProducerPhase::Renewing;
            inner.timer = Some(spawn_renewal(Arc::clone(&self.inner)));
            debug!("Armed renewal timer every {RENEWAL_PERIOD_MS}ms");
        } else {
            if let Some(payload) = inner.payload.as_mut() {
                payload.auto_renewal = None;
            }
            inner.phase = ProducerPhase::Expiring;
            inner.timer = Some(spawn_expiry(Arc::clone(&self.inner)));
            debug!("Armed one-shot expiry in {EXPIRY_WINDOW_MS}ms");
        }
    }
}

impl Drop for TokenProducer {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.clear_timer();
        }
    }
}

fn spawn_expiry(shared: Arc<Mutex<Inner>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        sleep(Duration::from_millis(EXPIRY_WINDOW_MS)).await;
        let mut inner = shared.lock().expect("producer state poisoned");
        if inner.phase != ProducerPhase::Expiring {
            return;
        }
        inner.phase = ProducerPhase::Expired;
        if let Some(payload) = inner.payload.as_mut() {
            payload.status = TokenStatus::Expired;
            payload.expired = Some(true);
        }
        debug!("Code expired after {EXPIRY_WINDOW_MS}ms");
    })
}

fn spawn_renewal(shared: Arc<Mutex<Inner>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(RENEWAL_PERIOD_MS));
        // The first tick completes immediately; the renewal cadence
        // starts one full period out.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let mut inner = shared.lock().expect("producer state poisoned");
            if inner.phase != ProducerPhase::Renewing {
                return;
            }
            if let Some(payload) = inner.payload.as_mut() {
                // The wall clock may not have ticked between renewals;
                // the timestamp still has to advance.
                payload.timestamp = now_ms().max(payload.timestamp + 1);
                payload.status = TokenStatus::Valid;
                payload.expired = None;
                debug!("Renewed code, timestamp {}", payload.timestamp);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tokio::time::{advance, Duration};

    fn identity() -> Identity {
        Identity::new("Lin", "Soto", "lin@uni.edu")
    }

    fn producer(dir: &TempDir) -> TokenProducer {
        TokenProducer::new(UserKind::Estudiante, LocalStore::new(dir.path()))
    }

    /// Let spawned timer tasks observe an advanced clock.
    async fn settle() {
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn generate_requires_a_complete_identity() {
        let dir = TempDir::new().unwrap();
        let p = producer(&dir);

        let err = p
            .generate(&Identity::new("", "Soto", "lin@uni.edu"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProducerError::InvalidIdentity));
        assert_eq!(p.phase(), ProducerPhase::Idle);
        // Nothing persisted either.
        assert!(p.saved_users().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn generate_arms_the_expiry_window() {
        let dir = TempDir::new().unwrap();
        let p = producer(&dir);
        p.generate(&identity()).await.unwrap();
        settle().await;
        assert_eq!(p.phase(), ProducerPhase::Expiring);

        advance(Duration::from_millis(EXPIRY_WINDOW_MS - 100)).await;
        settle().await;
        assert_eq!(p.phase(), ProducerPhase::Expiring);
        assert_eq!(p.payload().unwrap().status, TokenStatus::Valid);

        advance(Duration::from_millis(200)).await;
        settle().await;
        assert_eq!(p.phase(), ProducerPhase::Expired);
        let payload = p.payload().unwrap();
        assert_eq!(payload.status, TokenStatus::Expired);
        assert_eq!(payload.expired, Some(true));
        // The staleness marker travels inside the encoded code.
        assert!(p.current_code().unwrap().contains("\"status\":\"EXPIRED\""));
    }

    #[tokio::test(start_paused = true)]
    async fn renewal_mode_never_expires_and_timestamps_increase() {
        let dir = TempDir::new().unwrap();
        let p = producer(&dir);
        p.set_auto_renewal(true);
        p.generate(&identity()).await.unwrap();
        settle().await;
        assert_eq!(p.phase(), ProducerPhase::Renewing);

        let mut last = p.payload().unwrap().timestamp;
        for _ in 0..4 {
            advance(Duration::from_millis(RENEWAL_PERIOD_MS)).await;
            settle().await;
            let payload = p.payload().unwrap();
            assert_eq!(payload.expired, None);
            assert_eq!(payload.status, TokenStatus::Valid);
            assert!(payload.timestamp > last);
            last = payload.timestamp;
        }
        assert_eq!(p.phase(), ProducerPhase::Renewing);
    }

    #[tokio::test(start_paused = true)]
    async fn toggling_renewal_off_restarts_the_window_from_the_toggle() {
        let dir = TempDir::new().unwrap();
        let p = producer(&dir);
        p.set_auto_renewal(true);
        p.generate(&identity()).await.unwrap();
        settle().await;

        advance(Duration::from_millis(10_000)).await;
        settle().await;
        p.set_auto_renewal(false);
        settle().await;
        assert_eq!(p.phase(), ProducerPhase::Expiring);

        // A countdown measured from the prior tick would fire here.
        advance(Duration::from_millis(EXPIRY_WINDOW_MS - 100)).await;
        settle().await;
        assert_eq!(p.phase(), ProducerPhase::Expiring);

        advance(Duration::from_millis(200)).await;
        settle().await;
        assert_eq!(p.phase(), ProducerPhase::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn toggling_renewal_on_cancels_the_pending_expiry() {
        let dir = TempDir::new().unwrap();
        let p = producer(&dir);
        p.generate(&identity()).await.unwrap();
        settle().await;

        advance(Duration::from_millis(10_000)).await;
        settle().await;
        p.set_auto_renewal(true);
        settle().await;

        // Well past where the one-shot would have fired.
        advance(Duration::from_millis(EXPIRY_WINDOW_MS)).await;
        settle().await;
        assert_eq!(p.phase(), ProducerPhase::Renewing);
        assert_eq!(p.payload().unwrap().expired, None);
    }

    #[tokio::test(start_paused = true)]
    async fn toggling_off_before_a_revival_tick_preserves_expiry() {
        let dir = TempDir::new().unwrap();
        let p = producer(&dir);
        p.generate(&identity()).await.unwrap();
        settle().await;

        advance(Duration::from_millis(EXPIRY_WINDOW_MS + 100)).await;
        settle().await;
        assert_eq!(p.phase(), ProducerPhase::Expired);

        // Renewal-mode rendering presents the code as valid right away.
        p.set_auto_renewal(true);
        assert_eq!(p.phase(), ProducerPhase::Renewing);
        assert!(p.current_code().unwrap().contains("\"status\":\"VALID\""));

        // No tick has revived the stored payload yet, so switching back
        // off restores the expired state instead of a fresh window.
        p.set_auto_renewal(false);
        assert_eq!(p.phase(), ProducerPhase::Expired);
        assert_eq!(p.payload().unwrap().expired, Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn toggling_off_after_a_revival_tick_grants_a_fresh_window() {
        let dir = TempDir::new().unwrap();
        let p = producer(&dir);
        p.generate(&identity()).await.unwrap();
        settle().await;

        advance(Duration::from_millis(EXPIRY_WINDOW_MS + 100)).await;
        settle().await;
        p.set_auto_renewal(true);
        settle().await;

        advance(Duration::from_millis(RENEWAL_PERIOD_MS)).await;
        settle().await;
        assert_eq!(p.payload().unwrap().expired, None);

        p.set_auto_renewal(false);
        assert_eq!(p.phase(), ProducerPhase::Expiring);
    }

    #[tokio::test(start_paused = true)]
    async fn select_saved_rearms_like_a_fresh_generate() {
        let dir = TempDir::new().unwrap();
        let p = producer(&dir);
        p.generate(&identity()).await.unwrap();
        settle().await;

        advance(Duration::from_millis(EXPIRY_WINDOW_MS + 100)).await;
        settle().await;
        assert_eq!(p.phase(), ProducerPhase::Expired);

        let saved = p.saved_users().await.pop().unwrap();
        let reissued = p.select_saved(&saved);
        settle().await;
        assert_eq!(p.phase(), ProducerPhase::Expiring);
        assert_eq!(reissued.status, TokenStatus::Valid);
        assert!(reissued.timestamp >= saved.timestamp);

        advance(Duration::from_millis(EXPIRY_WINDOW_MS + 100)).await;
        settle().await;
        assert_eq!(p.phase(), ProducerPhase::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn generate_appends_duplicates_to_saved_users() {
        let dir = TempDir::new().unwrap();
        let p = producer(&dir);
        p.generate(&identity()).await.unwrap();
        p.generate(&identity()).await.unwrap();
        assert_eq!(p.saved_users().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn renewal_stays_under_the_staleness_threshold() {
        let dir = TempDir::new().unwrap();
        let p = producer(&dir);
        p.set_auto_renewal(true);
        p.generate(&identity()).await.unwrap();
        settle().await;

        for _ in 0..3 {
            advance(Duration::from_millis(RENEWAL_PERIOD_MS)).await;
            settle().await;
            let payload = p.payload().unwrap();
            assert!(!payload.is_stale(now_ms()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_clears_the_timer_and_code() {
        let dir = TempDir::new().unwrap();
        let p = producer(&dir);
        p.generate(&identity()).await.unwrap();
        p.shutdown();
        assert_eq!(p.phase(), ProducerPhase::Idle);
        assert!(p.payload().is_none());

        // No residual timer flips anything after the window.
        advance(Duration::from_millis(EXPIRY_WINDOW_MS + 100)).await;
        settle().await;
        assert_eq!(p.phase(), ProducerPhase::Idle);
    }
}
