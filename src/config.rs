use std::path::{Path, PathBuf};

use eyre::{Result, bail};
use log::debug;
use serde::{Deserialize, Serialize};

/// Environment variable holding the Groq credential
pub const API_KEY_VAR: &str = "GROQ_API_KEY";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub model: Option<String>,
    pub api_base: Option<String>,
    pub languages: Option<Vec<String>>,
    pub fallback_languages: Option<Vec<String>>,
    pub max_chars: Option<usize>,
}

impl Config {
    /// Load config from ~/.config/ytsum/config.toml if it exists
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!("Loading config from {}", path.display());
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            debug!("No config file found at {}", path.display());
            Ok(Config::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.max_chars == Some(0) {
            bail!("max_chars must be greater than zero");
        }
        Ok(())
    }

    /// Manual caption languages in priority order
    pub fn languages(&self) -> Vec<String> {
        self.languages
            .clone()
            .unwrap_or_else(|| vec!["en".to_string(), "en-GB".to_string()])
    }

    /// Auto-generated caption languages tried when no manual track matches
    pub fn fallback_languages(&self) -> Vec<String> {
        self.fallback_languages
            .clone()
            .unwrap_or_else(|| vec!["en".to_string()])
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("ytsum")
        .join("config.toml")
}

/// Read the Groq credential from the environment; blank values count as unset
pub fn api_key() -> Option<String> {
    non_blank(std::env::var(API_KEY_VAR).ok())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
