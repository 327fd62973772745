// ABOUTME: Shared pieces of the labgate binary
// ABOUTME: Environment configuration and tracing setup

pub mod config;

pub use config::{Config, ConfigError};

/// Initialize tracing from `RUST_LOG`, defaulting to warnings so the
/// CLI output stays readable.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();
}
