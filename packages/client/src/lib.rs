// ABOUTME: HTTP exchange with the access backend
// ABOUTME: Token validation plus the attendance listings the display layer renders

pub mod error;
pub mod types;
pub mod validator;

pub use error::{ClientError, ClientResult};
pub use types::{AccessResult, AccumulatedHours, PresentStudent};
pub use validator::ValidatorClient;
