use crate::core::aggregate::AggregatorSettings;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "0.0.0.0:8000".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WhatsAppConfig {
    #[serde(default = "default_graph_url")]
    pub api_base_url: String,
    #[serde(default = "default_graph_version")]
    pub api_version: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub phone_number_id: Option<String>,
    #[serde(default)]
    pub verify_token: Option<String>,
}

fn default_graph_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_graph_version() -> String {
    "v22.0".to_string()
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        WhatsAppConfig {
            api_base_url: default_graph_url(),
            api_version: default_graph_version(),
            access_token: None,
            phone_number_id: None,
            verify_token: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScrapeProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct KeyedProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ProvidersConfig {
    pub logam_mulia: ScrapeProviderConfig,
    pub harga_emas: ScrapeProviderConfig,
    pub goldapi: KeyedProviderConfig,
    pub exchangerate: KeyedProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            logam_mulia: ScrapeProviderConfig {
                base_url: "https://www.logammulia.com".to_string(),
            },
            harga_emas: ScrapeProviderConfig {
                base_url: "https://harga-emas.org".to_string(),
            },
            goldapi: KeyedProviderConfig {
                base_url: "https://www.goldapi.io".to_string(),
                api_key: None,
            },
            exchangerate: KeyedProviderConfig {
                base_url: "https://v6.exchangerate-api.com".to_string(),
                api_key: None,
            },
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AggregationConfig {
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_outlier_tolerance")]
    pub outlier_tolerance: f64,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_outlier_tolerance() -> f64 {
    0.03
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

impl Default for AggregationConfig {
    fn default() -> Self {
        AggregationConfig {
            cache_ttl_secs: default_cache_ttl_secs(),
            outlier_tolerance: default_outlier_tolerance(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl AggregationConfig {
    /// Rejects values that would make every fetch fail or every check reject.
    pub fn validate(&self) -> Result<()> {
        if !self.outlier_tolerance.is_finite() || self.outlier_tolerance < 0.0 {
            anyhow::bail!(
                "aggregation.outlier_tolerance must be a finite, non-negative number, got {}",
                self.outlier_tolerance
            );
        }
        if self.fetch_timeout_secs == 0 {
            anyhow::bail!("aggregation.fetch_timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn settings(&self) -> AggregatorSettings {
        AggregatorSettings {
            cache_ttl: Duration::from_secs(self.cache_ttl_secs),
            outlier_tolerance: self.outlier_tolerance,
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub aggregation: AggregationConfig,
}

/// Reads an environment variable, treating blank values as unset.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Loads the default config file if present, then applies env overrides.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        let config = if config_path.exists() {
            Self::load_from_path(&config_path)?
        } else {
            debug!("No config at {}, using defaults", config_path.display());
            Self::default()
        };
        Ok(config.with_env_overrides())
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("id", "emasbot", "emasbot")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .aggregation
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    /// Overlays secrets and the bind address from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(env_value)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let apply = |target: &mut Option<String>, name: &str| {
            if let Some(value) = lookup(name) {
                *target = Some(value);
            }
        };
        apply(&mut self.whatsapp.access_token, "META_ACCESS_TOKEN");
        apply(&mut self.whatsapp.phone_number_id, "PHONE_NUMBER_ID");
        apply(&mut self.whatsapp.verify_token, "VERIFY_TOKEN");
        apply(&mut self.providers.goldapi.api_key, "GOLDAPI_KEY");
        apply(&mut self.providers.exchangerate.api_key, "EXCHANGERATE_API_KEY");
        if let Some(addr) = lookup("BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        self.drop_blank_secrets()
    }

    fn drop_blank_secrets(mut self) -> Self {
        for secret in [
            &mut self.whatsapp.access_token,
            &mut self.whatsapp.phone_number_id,
            &mut self.whatsapp.verify_token,
            &mut self.providers.goldapi.api_key,
            &mut self.providers.exchangerate.api_key,
        ] {
            if secret.as_deref().is_some_and(|s| s.trim().is_empty()) {
                *secret = None;
            }
        }
        self
    }
}
