// ABOUTME: Token producer: generation, expiry, and auto-renewal
// ABOUTME: An explicit state machine with a single live timer at any moment

pub mod error;
pub mod producer;

pub use error::{ProducerError, ProducerResult};
pub use producer::{ProducerPhase, TokenProducer};
