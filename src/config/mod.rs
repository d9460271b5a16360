//! Configuration management for festboard

pub mod schema;

pub use schema::{
    AdminConfig, CacheConfig, CacheMode, Config, FestivalConfig, ManifestConfig, RosterConfig,
    ScoringConfig, StoreConfig,
};

use crate::error::{FestError, FestResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use url::Url;

/// Environment variable overriding `store.api_key`
pub const STORE_KEY_ENV: &str = "FESTBOARD_STORE_KEY";

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("festboard")
            .join("config.toml")
    }

    /// Get the state directory path
    pub fn state_dir() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("festboard")
    }

    /// Get the fetch cache root (one subdirectory per generation)
    pub fn cache_dir() -> PathBuf {
        Self::state_dir().join("cache")
    }

    /// Cache root for a config, honouring `cache.dir`
    pub fn cache_dir_for(config: &Config) -> PathBuf {
        config.cache.dir.clone().unwrap_or_else(Self::cache_dir)
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> FestResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load and validate configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> FestResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| FestError::io(format!("reading config from {}", path.display()), e))?;

        let config: Config = toml::from_str(&content).map_err(|e| FestError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        validate(&config).map_err(|e| FestError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(config)
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> FestResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            FestError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> FestResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| FestError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Check values serde cannot check on its own
pub fn validate(config: &Config) -> FestResult<()> {
    if config.festival.days == 0 {
        return Err(FestError::ConfigValue {
            key: "festival.days".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    if !matches!(config.general.log_format.as_str(), "text" | "json") {
        return Err(FestError::ConfigValue {
            key: "general.log_format".to_string(),
            reason: format!("unknown format '{}', expected text or json", config.general.log_format),
        });
    }

    if let Some(now) = &config.festival.now {
        crate::schedule::parse_local_time(now)?;
    }

    crate::cache::storage::validate_generation(&config.cache.generation)?;
    origin_url(config)?;
    parse_url(&config.store.base_url)?;
    for pinned in &config.cache.manifest.pinned {
        parse_url(pinned)?;
    }

    Ok(())
}

/// Parse a URL, mapping failures into `FestError::InvalidUrl`
pub fn parse_url(raw: &str) -> FestResult<Url> {
    Url::parse(raw).map_err(|e| FestError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// The application origin as a URL that relative assets resolve against
pub fn origin_url(config: &Config) -> FestResult<Url> {
    let mut raw = config.general.origin.clone();
    if !raw.ends_with('/') {
        raw.push('/');
    }
    parse_url(&raw)
}

/// Resolve an asset reference (absolute URL or origin-relative path)
pub fn resolve_asset(config: &Config, reference: &str) -> FestResult<Url> {
    if let Ok(url) = Url::parse(reference) {
        return Ok(url);
    }
    origin_url(config)?
        .join(reference)
        .map_err(|e| FestError::InvalidUrl {
            url: reference.to_string(),
            reason: e.to_string(),
        })
}

/// The store key, preferring the environment over the config file
pub fn store_key(config: &Config) -> Option<String> {
    std::env::var(STORE_KEY_ENV)
        .ok()
        .filter(|k| !k.is_empty())
        .or_else(|| config.store.api_key.clone())
}
