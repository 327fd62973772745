use std::env;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid API base URL: {0}")]
    InvalidApiBase(String),
    #[error("Could not determine a data directory")]
    NoDataDir,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the access backend, e.g. `http://localhost:5000/api`.
    pub api_base: String,
    /// Directory holding the local key/value store.
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base = env::var("LABGATE_API_BASE")
            .unwrap_or_else(|_| "http://localhost:5000/api".to_string());
        let api_base = api_base.trim_end_matches('/').to_string();
        Url::parse(&api_base).map_err(|e| ConfigError::InvalidApiBase(e.to_string()))?;

        let data_dir = match env::var("LABGATE_DATA_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .ok_or(ConfigError::NoDataDir)?
                .join(".labgate"),
        };

        Ok(Config { api_base, data_dir })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_yields_a_parseable_base_without_trailing_slash() {
        let config = Config::from_env().unwrap();
        assert!(Url::parse(&config.api_base).is_ok());
        assert!(!config.api_base.ends_with('/'));
    }

    #[test]
    fn from_env_picks_a_data_dir() {
        let config = Config::from_env().unwrap();
        assert!(!config.data_dir.as_os_str().is_empty());
    }
}
