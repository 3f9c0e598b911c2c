use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

use crate::style::ResponseStyle;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct Config {
    pub backend_url: Option<String>,
    pub style: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::read_from(&config_path)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.write_to(&config_path)
    }

    /// Persist the last selected style so the next run starts with it
    pub fn save_style(style: ResponseStyle) -> Result<()> {
        let mut config = Self::load().unwrap_or_default();
        config.style = Some(style.as_str().to_string());
        config.save()
    }

    /// Backend base URL resolution: CLI flag (or env, via clap) wins,
    /// then the config file, then the local default.
    pub fn resolve_backend_url(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.backend_url.clone())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
    }

    /// Style stored in the config file, if it names a known style
    pub fn saved_style(&self) -> Option<ResponseStyle> {
        self.style.as_deref().and_then(ResponseStyle::from_str)
    }

    fn read_from(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("concierge-chat").join("config.json"))
    }
}
