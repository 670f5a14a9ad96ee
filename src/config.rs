//! Configuration: environment, `.env`, and an XDG config file
//!
//! ~/.config/talespin/config.json - API key, model, endpoint (0600)
//!
//! Environment variables win over the file; CLI flags win over both.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::client::DEFAULT_BASE_URL;
use crate::input::DEFAULT_CUSTOM_KEY;

const APP_NAME: &str = "talespin";

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";
pub const DEFAULT_GAME_DATA: &str = "game_data.json";
pub const DEFAULT_LOGS_DIR: &str = "logs";

/// Get config directory (~/.config/talespin/)
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

/// Persistent configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Chat-completions API key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model to narrate with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// OpenAI-compatible endpoint base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
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
        self.save_to(&config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, &content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        // Owner read/write only; the file holds the API key
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms)?;
        }

        Ok(())
    }

    /// Set one key by name, as used by `talespin config set`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "key" | "api_key" => self.api_key = Some(value.to_string()),
            "model" => self.model = Some(value.to_string()),
            "base_url" | "url" => self.base_url = Some(value.to_string()),
            _ => anyhow::bail!("Unknown config key: {}. Valid keys: key, model, base_url", key),
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
// RESOLVED SETTINGS
// ═══════════════════════════════════════════════════════════════

/// Everything a play session needs, resolved from all sources
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub custom_input_key: u32,
    pub debug: bool,
    pub game_data_file: PathBuf,
    pub logs_dir: PathBuf,
}

impl Settings {
    /// Load `.env`, the config file and the process environment
    pub fn resolve() -> Result<Self> {
        dotenvy::dotenv().ok();
        let file = Config::load()?;
        Self::from_sources(&file, |name| std::env::var(name).ok())
    }

    /// Combine a config file with an environment lookup
    pub fn from_sources(file: &Config, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let custom_input_key = match var("CUSTOM_INPUT_KEY") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("CUSTOM_INPUT_KEY must be a key code, got {:?}", raw))?,
            None => DEFAULT_CUSTOM_KEY,
        };

        Ok(Self {
            api_key: var("OPENAI_API_KEY")
                .or_else(|| var("OPENROUTER_API_KEY"))
                .or_else(|| file.api_key.clone()),
            base_url: var("BASE_URL")
                .or_else(|| file.base_url.clone())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: var("MODEL_NAME")
                .or_else(|| file.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            custom_input_key,
            debug: var("DEBUG").map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false),
            game_data_file: var("GAME_DATA_FILE")
                .unwrap_or_else(|| DEFAULT_GAME_DATA.to_string())
                .into(),
            logs_dir: var("LOGS_DIR").unwrap_or_else(|| DEFAULT_LOGS_DIR.to_string()).into(),
        })
    }

    /// API key or a helpful error
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().context(
            "No API key configured. Set OPENAI_API_KEY or run: talespin config set key <your-key>",
        )
    }
}
