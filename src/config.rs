//! Configuration with XDG paths
//!
//! ~/.config/llmbench/config.json - API key, endpoint, defaults (0600)
//!
//! Flags beat environment, environment beats the config file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use crate::client::{Endpoint, DEFAULT_BASE_URL};

const APP_NAME: &str = "llmbench";

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

/// Get config directory (~/.config/llmbench/)
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .context("Could not determine config directory")?;
    Ok(base.join(APP_NAME))
}

/// Get config file path
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.json"))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OpenAI-compatible base URL, e.g. http://localhost:11434/v1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_suite: Option<String>,
}

impl Config {
    /// Load config from disk, or return defaults
    pub fn load() -> Result<Self> {
        let path = config_path()?;

        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to disk with secure permissions
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(config_dir()?)?;
        let path = config_path()?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, &content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        // Owner read/write only, the file may hold an API key
        let mut perms = fs::metadata(&path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&path, perms)?;

        Ok(())
    }

    /// Apply `config set <key> <value>`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "key" | "api_key" | "api-key" => self.api_key = Some(value.to_string()),
            "base-url" | "base_url" | "url" => self.base_url = Some(value.to_string()),
            "temperature" => {
                let t: f32 = value
                    .parse()
                    .with_context(|| format!("Invalid temperature: {}", value))?;
                self.temperature = Some(t);
            }
            "suite" | "default_suite" => {
                crate::prompts::get_suite(value)?;
                self.default_suite = Some(value.to_string());
            }
            _ => anyhow::bail!(
                "Unknown config key: {}. Valid keys: key, base-url, temperature, suite",
                key
            ),
        }
        Ok(())
    }

    /// Resolve the endpoint from flag, then environment, then this config
    pub fn endpoint(&self, base_url_flag: Option<&str>, api_key_flag: Option<&str>) -> Endpoint {
        let base_url = pick(base_url_flag, env_var(BASE_URL_ENV), self.base_url.as_deref())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = pick(api_key_flag, env_var(API_KEY_ENV), self.api_key.as_deref());
        Endpoint::new(base_url, api_key)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn pick(flag: Option<&str>, env: Option<String>, file: Option<&str>) -> Option<String> {
    flag.filter(|v| !v.is_empty())
        .map(str::to_string)
        .or(env)
        .or_else(|| file.map(str::to_string))
}
