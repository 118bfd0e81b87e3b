use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::constants::{
    API_KEY_ENV, BASE_URL_ENV, CONFIG_PATH, DEFAULT_PLACES_BASE_URL, DEFAULT_TIMEOUT_SECONDS,
};
use crate::error::{AddressError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub places: PlacesConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlacesConfig {
    /// Credential for the places service. Absent means autocomplete is unavailable.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub language: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_PLACES_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            language: None,
        }
    }
}

impl PlacesConfig {
    /// The credential, if one is configured and not blank
    pub fn credential(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

impl Config {
    /// Load `config.toml` when present, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Path::new(CONFIG_PATH);
        let mut config = if path.exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            AddressError::Configuration(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            self.places.api_key = Some(key);
        }
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            self.places.base_url = url;
        }
    }
}
