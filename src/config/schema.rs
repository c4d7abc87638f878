//! Configuration schema for compreg
//!
//! Configuration is stored at `~/.config/compreg/config.toml`

use crate::profile::DEFAULT_BASE_PROFILE_URI;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Registry defaults and artifact cache bounds
    pub registry: RegistryConfig,

    /// Network timeouts
    pub network: NetworkConfig,

    /// Base profile settings
    pub profile: ProfileConfig,

    /// Per-host registry credentials
    pub credentials: BTreeMap<String, Credential>,
}

impl Config {
    /// Directory holding the cached base profile
    pub fn profile_cache_dir(&self) -> PathBuf {
        self.profile
            .cache_dir
            .clone()
            .unwrap_or_else(super::ConfigManager::conf_dir)
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
        }
    }
}

/// Registry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Address used when `--registry` is not given
    pub default_registry: Option<String>,

    /// Upper bound on cached artifact bytes
    pub artifact_cache_bytes: usize,

    /// Upper bound on cached artifacts
    pub artifact_cache_entries: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            default_registry: None,
            artifact_cache_bytes: 64 * 1024 * 1024,
            artifact_cache_entries: 256,
        }
    }
}

/// Network settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Timeout for base profile checks and downloads
    pub profile_timeout_secs: u64,

    /// Timeout for remote registry calls
    pub request_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            profile_timeout_secs: 5,
            request_timeout_secs: 30,
        }
    }
}

/// Base profile settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Where the canonical base profile is published
    pub base_profile_uri: String,

    /// Override for the base profile cache directory
    pub cache_dir: Option<PathBuf>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            base_profile_uri: DEFAULT_BASE_PROFILE_URI.to_string(),
            cache_dir: None,
        }
    }
}

/// Credential for one registry host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// API token sent as a bearer credential
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[network]"));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.network.profile_timeout_secs, 5);
        assert_eq!(config.registry.artifact_cache_entries, 256);
        assert_eq!(config.profile.base_profile_uri, DEFAULT_BASE_PROFILE_URI);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [registry]
            default_registry = "https://registry.example.org/api"

            [credentials."registry.example.org"]
            token = "s3cret"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(
            config.registry.default_registry.as_deref(),
            Some("https://registry.example.org/api")
        );
        assert_eq!(config.credentials["registry.example.org"].token, "s3cret");
        assert_eq!(config.registry.artifact_cache_bytes, 64 * 1024 * 1024); // default preserved
    }

    #[test]
    fn profile_cache_dir_override() {
        let mut config = Config::default();
        config.profile.cache_dir = Some(PathBuf::from("/tmp/compreg-profiles"));
        assert_eq!(
            config.profile_cache_dir(),
            PathBuf::from("/tmp/compreg-profiles")
        );
    }
}
