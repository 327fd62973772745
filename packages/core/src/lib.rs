// ABOUTME: Core types shared by the Labgate producer, scanner, and client
// ABOUTME: Identity rules, token payload encoding, and the timing constants

pub mod error;
pub mod identity;
pub mod payload;
pub mod timing;

pub use error::{CoreError, CoreResult};
pub use identity::{Identity, UserKind};
pub use payload::{TokenPayload, TokenStatus};
pub use timing::{
    now_ms, DETECT_POLL_INTERVAL_MS, EXPIRY_WINDOW_MS, RENEWAL_PERIOD_MS, SESSION_CACHE_TTL_MS,
};
