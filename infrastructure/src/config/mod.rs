//! Configuration file loading for toolwarden
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `TOOLWARDEN_*` environment variables (`TOOLWARDEN_EXECUTION__N_RESAMPLES=5`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./toolwarden.toml` or `./.toolwarden.toml`
//! 4. Global: `$XDG_CONFIG_HOME/toolwarden/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigError, FileAuditConfig, FileConfig, FileProviderConfig, FileRegistryConfig,
};
pub use loader::ConfigLoader;
