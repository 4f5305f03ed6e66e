//! Configuration management for the Parcel Fertility Analysis server
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with PFA_ prefix
//! 4. The unprefixed SENTINELHUB_* credential variables

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Sentinel Hub credentials and endpoints
    pub sentinel_hub: SentinelHubConfig,

    /// Analysis limits and defaults
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SentinelHubConfig {
    /// Configuration instance id (OGC services)
    #[serde(default)]
    pub instance_id: String,

    /// OAuth client id
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret
    #[serde(default)]
    pub client_secret: String,

    /// API base URL
    pub base_url: String,

    /// OAuth token endpoint
    pub auth_url: String,
}

/// OAuth client credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl SentinelHubConfig {
    /// Client credentials, or `None` when either part is missing
    pub fn credentials(&self) -> Option<Credentials> {
        let client_id = self.client_id.trim();
        let client_secret = self.client_secret.trim();
        if client_id.is_empty() || client_secret.is_empty() {
            return None;
        }
        Some(Credentials {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }

    /// First characters of the instance id, safe to display
    pub fn instance_id_hint(&self) -> Option<String> {
        let id = self.instance_id.trim();
        (!id.is_empty()).then(|| format!("{}...", id.chars().take(10).collect::<String>()))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Smallest zone count accepted
    pub min_zone_count: u32,

    /// Largest zone count accepted
    pub max_zone_count: u32,

    /// Zone count when the request omits one
    pub default_zone_count: u32,

    /// Upper bound on one provider fetch, token and catalog calls included
    pub provider_timeout_secs: u64,

    /// Fixed noise seed; random per run when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("PFA_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8080)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("sentinel_hub.base_url", "https://services.sentinel-hub.com")?
            .set_default(
                "sentinel_hub.auth_url",
                "https://services.sentinel-hub.com/auth/realms/main/protocol/openid-connect/token",
            )?
            .set_default("analysis.min_zone_count", shared::MIN_ZONE_COUNT)?
            .set_default("analysis.max_zone_count", shared::MAX_ZONE_COUNT)?
            .set_default("analysis.default_zone_count", shared::DEFAULT_ZONE_COUNT)?
            .set_default("analysis.provider_timeout_secs", 30)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (PFA_ prefix)
            .add_source(
                Environment::with_prefix("PFA")
                    .separator("__")
                    .try_parsing(true),
            )
            // Credential variables as documented for the dashboard
            .set_override_option("sentinel_hub.instance_id", std::env::var("SENTINELHUB_INSTANCE_ID").ok())?
            .set_override_option("sentinel_hub.client_id", std::env::var("SENTINELHUB_CLIENT_ID").ok())?
            .set_override_option(
                "sentinel_hub.client_secret",
                std::env::var("SENTINELHUB_CLIENT_SECRET").ok(),
            )?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_zone_count: shared::MIN_ZONE_COUNT,
            max_zone_count: shared::MAX_ZONE_COUNT,
            default_zone_count: shared::DEFAULT_ZONE_COUNT,
            provider_timeout_secs: 30,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentinel(client_id: &str, client_secret: &str) -> SentinelHubConfig {
        SentinelHubConfig {
            instance_id: "0123456789abcdef".to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_credentials_present() {
        let creds = sentinel("id", "secret").credentials().unwrap();
        assert_eq!(creds.client_id, "id");
        assert_eq!(creds.client_secret, "secret");
    }

    #[test]
    fn test_credentials_missing_or_blank() {
        assert!(sentinel("", "secret").credentials().is_none());
        assert!(sentinel("id", "   ").credentials().is_none());
        assert!(SentinelHubConfig::default().credentials().is_none());
    }

    #[test]
    fn test_instance_id_hint_truncates() {
        assert_eq!(sentinel("id", "s").instance_id_hint().as_deref(), Some("0123456789..."));
        assert!(SentinelHubConfig::default().instance_id_hint().is_none());
    }
}
