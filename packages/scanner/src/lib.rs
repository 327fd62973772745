// ABOUTME: Consumer flow for the scanner portal
// ABOUTME: Two-step state machine, source precedence, resolution, and submission

pub mod error;
pub mod flow;
pub mod resolve;

pub use error::{ScanError, ScanResult};
pub use flow::{AcquiredToken, ScanStep, ScannerFlow, SubmitOutcome, TokenSource};
pub use resolve::resolve_reader_token;
