// ABOUTME: Timing rules for the token lifecycle and acquisition caches
// ABOUTME: All values are milliseconds; the renewal/expiry relation is load-bearing

use chrono::Utc;

/// How long a generated code stays valid without auto-renewal.
pub const EXPIRY_WINDOW_MS: u64 = 15_000;

/// Auto-renewal tick period. Must stay below [`EXPIRY_WINDOW_MS`] so a
/// reader can never observe a stale code while renewal is active.
pub const RENEWAL_PERIOD_MS: u64 = 14_000;

/// Maximum age of a session-cached reader token before a read treats it
/// as absent.
pub const SESSION_CACHE_TTL_MS: u64 = 55_000;

/// Poll period for the native frame detector backend.
pub const DETECT_POLL_INTERVAL_MS: u64 = 400;

/// Current wall-clock time as epoch milliseconds.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
