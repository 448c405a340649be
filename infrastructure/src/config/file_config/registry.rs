//! Registry configuration from TOML (`[registry]` section)

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRegistryConfig {
    /// Registry endpoint. Unset means the in-process registry is used.
    pub base_url: Option<String>,
    /// Environment variable holding the registry API key
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for FileRegistryConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key_env: "TOOLWARDEN_REGISTRY_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

impl FileRegistryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The API key, when its environment variable is set.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("registry"));
        }
        if self.base_url.as_deref().is_some_and(|u| u.trim().is_empty()) {
            return Err(ConfigError::EmptyBaseUrl("registry"));
        }
        Ok(())
    }
}
