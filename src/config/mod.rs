use crate::entitlement::LookupFailurePolicy;
use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Tunables read from `config.toml`. Secrets never live here, see [`Credentials`].
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub billing: BillingConfig,
    pub entitlement: EntitlementConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP API binds to.
    pub bind: String,
    /// Largest accepted upload body, in megabytes.
    pub max_upload_mb: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingConfig {
    /// Recurring price used for checkout sessions.
    pub price_id: Option<String>,
    /// Public URL of the front end, used for checkout redirects.
    pub app_url: String,
    /// Payment provider REST base URL.
    pub api_base: String,
    /// Maximum age (seconds) of a signed webhook timestamp.
    pub signature_tolerance_secs: u64,
    /// Period end written on checkout completion, in days from now.
    pub placeholder_period_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntitlementConfig {
    /// Summaries an unsubscribed user may generate over their lifetime.
    pub free_summaries: u32,
    pub on_lookup_failure: LookupFailurePolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            max_upload_mb: 200,
        }
    }
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            price_id: None,
            app_url: "http://localhost:3000".to_string(),
            api_base: "https://api.stripe.com/v1".to_string(),
            signature_tolerance_secs: 300,
            placeholder_period_days: 30,
        }
    }
}

impl Default for EntitlementConfig {
    fn default() -> Self {
        Self {
            free_summaries: 1,
            on_lookup_failure: LookupFailurePolicy::Degrade,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Read the config file at `path`, writing the defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file not found, creating default at {:?}", path);
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Environment variables win over the file for deploy-specific values.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("MEETNOTES_BIND") {
            self.server.bind = bind;
        }
        if let Some(price) = lookup("STRIPE_PRICE_ID") {
            self.billing.price_id = Some(price);
        }
        if let Some(url) = lookup("APP_URL") {
            self.billing.app_url = url;
        }
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

/// Secrets and collaborator endpoints. All of them are required at startup.
#[derive(Clone)]
pub struct Credentials {
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub api_base_url: String,
    pub auth_url: String,
    pub auth_anon_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_base_url", &self.api_base_url)
            .field("auth_url", &self.auth_url)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env is normal in production.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        Ok(Self {
            stripe_secret_key: require("STRIPE_SECRET_KEY")?,
            stripe_webhook_secret: require("STRIPE_WEBHOOK_SECRET")?,
            api_base_url: require("API_BASE_URL")?,
            auth_url: require("AUTH_URL")?,
            auth_anon_key: require("AUTH_ANON_KEY")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full_env() -> HashMap<String, String> {
        env(&[
            ("STRIPE_SECRET_KEY", "sk_test_123"),
            ("STRIPE_WEBHOOK_SECRET", "whsec_123"),
            ("API_BASE_URL", "http://localhost:8000"),
            ("AUTH_URL", "http://localhost:54321"),
            ("AUTH_ANON_KEY", "anon"),
        ])
    }

    #[test]
    fn test_credentials_from_complete_env() {
        let vars = full_env();
        let creds = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(creds.api_base_url, "http://localhost:8000");
        assert_eq!(creds.stripe_webhook_secret, "whsec_123");
    }

    #[test]
    fn test_credentials_missing_value_is_fatal() {
        let mut vars = full_env();
        vars.remove("STRIPE_WEBHOOK_SECRET");
        let err = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert_eq!(err, ConfigError::Missing("STRIPE_WEBHOOK_SECRET"));
    }

    #[test]
    fn test_credentials_blank_value_counts_as_missing() {
        let mut vars = full_env();
        vars.insert("AUTH_URL".to_string(), "   ".to_string());
        let err = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert_eq!(err, ConfigError::Missing("AUTH_URL"));
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let vars = full_env();
        let creds = Credentials::from_lookup(|k| vars.get(k).cloned()).unwrap();
        let printed = format!("{:?}", creds);
        assert!(!printed.contains("sk_test_123"));
        assert!(!printed.contains("whsec_123"));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.entitlement.free_summaries, 1);
        assert_eq!(config.entitlement.on_lookup_failure, LookupFailurePolicy::Degrade);
        assert_eq!(config.billing.placeholder_period_days, 30);
        assert_eq!(config.billing.signature_tolerance_secs, 300);
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.server.bind, "127.0.0.1:3000");
    }

    #[test]
    fn test_load_from_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[entitlement]\nfree_summaries = 3\non_lookup_failure = \"deny\"\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.entitlement.free_summaries, 3);
        assert_eq!(config.entitlement.on_lookup_failure, LookupFailurePolicy::Deny);
        assert_eq!(config.billing.app_url, "http://localhost:3000");
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("MEETNOTES_BIND", "0.0.0.0:8080"),
            ("STRIPE_PRICE_ID", "price_abc"),
        ]);
        let mut config = Config::default();
        config.apply_env_overrides(|k| vars.get(k).cloned());

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.billing.price_id.as_deref(), Some("price_abc"));
        assert_eq!(config.billing.app_url, "http://localhost:3000");
    }
}
