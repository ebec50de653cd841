use crate::api::{ClientCredentials, ResilienceConfig, RetryConfig};
use crate::api::resilience::MonitoringConfig;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_CLIENT_ID: &str = "DATAVERSE_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "DATAVERSE_CLIENT_SECRET";
pub const ENV_TENANT_ID: &str = "DATAVERSE_TENANT_ID";
pub const ENV_URL: &str = "DATAVERSE_URL";
pub const ENV_VERBOSE: &str = "DATAVERSE_VERBOSE";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default)]
    pub tenant_id: String,
    /// Organisation URL, e.g. `https://org.crm4.dynamics.com/`
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default)]
    pub verbose: bool,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_max_rate_limit_retries")]
    pub max_rate_limit_retries: u32,
    /// Keep resubmitting throttled batches for as long as the server asks
    #[serde(default)]
    pub unbounded_rate_limit_retries: bool,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_rate_limit_retries() -> u32 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            verbose: false,
            max_retries: default_max_retries(),
            max_rate_limit_retries: default_max_rate_limit_retries(),
            unbounded_rate_limit_retries: false,
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub client: ClientSettings,
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("dataverse-client");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config file, then apply `.env` and process environment overrides
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!("Loaded environment from {:?}", path);
        }

        let config_path = Self::get_config_path()?;
        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            info!("Config file {:?} doesn't exist, using defaults", config_path);
            Self::default()
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", path);

        let config_content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_toml_str(&config_content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid config TOML")
    }

    /// Override file values with any variables `lookup` knows about
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let overrides = [
            (ENV_CLIENT_ID, &mut self.auth.client_id),
            (ENV_CLIENT_SECRET, &mut self.auth.client_secret),
            (ENV_TENANT_ID, &mut self.auth.tenant_id),
            (ENV_URL, &mut self.auth.url),
        ];
        for (key, field) in overrides {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                debug!("{} overridden from environment", key);
                *field = value;
            }
        }

        if let Some(value) = lookup(ENV_VERBOSE) {
            self.client.verbose = matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
        }
    }

    pub fn credentials(&self) -> ClientCredentials {
        ClientCredentials::new(&self.auth.client_id, &self.auth.client_secret, &self.auth.tenant_id)
    }

    /// Fail unless everything needed to request a token is present
    pub fn require_auth(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("client_id", &self.auth.client_id),
            ("client_secret", &self.auth.client_secret),
            ("tenant_id", &self.auth.tenant_id),
            ("url", &self.auth.url),
        ]
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(name, _)| *name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Missing auth settings: {}. Set them in {:?} or via DATAVERSE_* environment variables",
                missing.join(", "),
                Self::get_config_path().unwrap_or_default()
            )
        }
    }

    pub fn resilience(&self) -> ResilienceConfig {
        let retry = RetryConfig {
            max_attempts: self.client.max_retries.max(1),
            max_rate_limit_retries: if self.client.unbounded_rate_limit_retries {
                None
            } else {
                Some(self.client.max_rate_limit_retries)
            },
            ..RetryConfig::default()
        };

        ResilienceConfig {
            retry,
            monitoring: MonitoringConfig {
                verbose: self.client.verbose,
                ..MonitoringConfig::default()
            },
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.client.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.client.connect_timeout_secs)
    }
}
