//! Model provider configuration from TOML (`[provider]` section)

use super::ConfigError;
use crate::providers::ProviderKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Wire format of model responses (openai, anthropic, gemini)
    pub kind: ProviderKind,
    /// Override of the provider's public endpoint
    pub base_url: Option<String>,
    /// Model used for resampling when the request names none
    pub model: Option<String>,
    /// Environment variable holding the API key (default depends on `kind`)
    pub api_key_env: Option<String>,
    pub timeout_secs: u64,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            base_url: None,
            model: None,
            api_key_env: None,
            timeout_secs: 120,
        }
    }
}

impl FileProviderConfig {
    pub fn api_key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or_else(|| self.kind.default_api_key_env())
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.kind.default_base_url())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout("provider"));
        }
        if self.base_url.as_deref().is_some_and(|u| u.trim().is_empty()) {
            return Err(ConfigError::EmptyBaseUrl("provider"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_kind() {
        let config: FileProviderConfig = toml::from_str(r#"kind = "anthropic""#).unwrap();
        assert_eq!(config.kind, ProviderKind::Anthropic);
        assert_eq!(config.api_key_env(), "ANTHROPIC_API_KEY");
        assert_eq!(config.base_url(), "https://api.anthropic.com");
    }

    #[test]
    fn test_explicit_overrides() {
        let config: FileProviderConfig = toml::from_str(
            r#"
kind = "openai"
base_url = "http://localhost:8080"
api_key_env = "LOCAL_KEY"
model = "gpt-4o-mini"
"#,
        )
        .unwrap();
        assert_eq!(config.base_url(), "http://localhost:8080");
        assert_eq!(config.api_key_env(), "LOCAL_KEY");
        assert_eq!(config.model.as_deref(), Some("gpt-4o-mini"));
    }

    #[test]
    fn test_unknown_kind_fails_to_parse() {
        assert!(toml::from_str::<FileProviderConfig>(r#"kind = "bedrock""#).is_err());
    }
}
