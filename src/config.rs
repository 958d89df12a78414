//! Configuration management for cinedeck
//!
//! Handles config file loading/saving and environment overrides.
//! Config is stored at ~/.config/cinedeck/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::tmdb;
use crate::models::Quality;
use crate::stream::proxy::{DEFAULT_ORIGIN, DEFAULT_REFERER, DEFAULT_USER_AGENT};
use crate::stream::UpstreamHeaders;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

pub const ENV_TMDB_API_KEY: &str = "TMDB_API_KEY";
pub const ENV_SOURCES_URL: &str = "CINEDECK_SOURCES_URL";
pub const ENV_BIND: &str = "CINEDECK_BIND";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TMDB v3 API key
    pub tmdb_api_key: Option<String>,
    /// TMDB API base URL (default https://api.themoviedb.org/3)
    pub tmdb_base_url: Option<String>,
    /// TMDB response language (default en-US)
    pub language: Option<String>,
    /// Base URL of the embed sources API
    pub sources_api_url: Option<String>,
    /// Listen address for `serve`
    pub bind: Option<String>,
    /// Preferred quality (4k, 1080p, 720p, 480p)
    pub preferred_quality: Option<String>,
    /// Watchlist file location
    pub watchlist_path: Option<PathBuf>,
    /// Upstream header spoofing for the relay
    pub proxy: ProxyConfig,
}

/// `[proxy]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub referer: String,
    pub origin: String,
    pub user_agent: String,
    /// Rewrite HLS playlists so segments also go through the relay
    pub rewrite_playlists: bool,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            referer: DEFAULT_REFERER.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            rewrite_playlists: true,
        }
    }
}

impl ProxyConfig {
    pub fn upstream_headers(&self) -> UpstreamHeaders {
        UpstreamHeaders {
            referer: self.referer.clone(),
            origin: self.origin.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

impl Config {
    /// Get config file path (~/.config/cinedeck/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cinedeck").join("config.toml"))
    }

    /// Load config from the given file or the default location, then apply
    /// environment overrides. A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).or_else(Self::path);
        let mut config = match path {
            Some(ref p) if p.exists() => Self::load_from(p)?,
            _ => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Save config to file
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::path().ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?,
        };

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Environment variables take precedence over the file
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if let Some(key) = get(ENV_TMDB_API_KEY) {
            self.tmdb_api_key = Some(key);
        }
        if let Some(url) = get(ENV_SOURCES_URL) {
            self.sources_api_url = Some(url);
        }
        if let Some(bind) = get(ENV_BIND) {
            self.bind = Some(bind);
        }
    }

    /// TMDB API key, required for every catalog command
    pub fn tmdb_api_key(&self) -> Result<&str> {
        self.tmdb_api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "TMDB API key missing. Set {} or tmdb_api_key in {}",
                    ENV_TMDB_API_KEY,
                    Self::path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "config.toml".to_string())
                )
            })
    }

    pub fn tmdb_base_url(&self) -> &str {
        self.tmdb_base_url.as_deref().unwrap_or(tmdb::DEFAULT_BASE_URL)
    }

    pub fn language(&self) -> &str {
        self.language.as_deref().unwrap_or(tmdb::DEFAULT_LANGUAGE)
    }

    pub fn bind(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    /// Preferred quality, if configured and recognizable
    pub fn preferred_quality(&self) -> Option<Quality> {
        self.preferred_quality
            .as_deref()
            .map(Quality::from_str_loose)
            .filter(|q| *q != Quality::Unknown)
    }

    pub fn watchlist_path(&self) -> Option<PathBuf> {
        self.watchlist_path.clone().or_else(crate::watchlist::Watchlist::default_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.tmdb_api_key.is_none());
        assert_eq!(config.bind(), DEFAULT_BIND);
        assert_eq!(config.language(), "en-US");
        assert!(config.proxy.rewrite_playlists);
        assert_eq!(config.proxy.referer, DEFAULT_REFERER);
    }

    #[test]
    fn test_missing_key_is_error() {
        let config = Config::default();
        assert!(config.tmdb_api_key().is_err());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            tmdb_api_key = "abc"
            preferred_quality = "720p"

            [proxy]
            referer = "https://player.example"
            "#,
        )
        .unwrap();
        assert_eq!(config.tmdb_api_key().unwrap(), "abc");
        assert_eq!(config.preferred_quality(), Some(Quality::HD720p));
        assert_eq!(config.proxy.referer, "https://player.example");
        assert_eq!(config.proxy.origin, DEFAULT_ORIGIN);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config {
            tmdb_api_key: Some("from-file".into()),
            ..Default::default()
        };
        let env: HashMap<&str, &str> = [
            (ENV_TMDB_API_KEY, "from-env"),
            (ENV_SOURCES_URL, "https://embed.example/"),
            (ENV_BIND, ""),
        ]
        .into_iter()
        .collect();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.tmdb_api_key().unwrap(), "from-env");
        assert_eq!(config.sources_api_url.as_deref(), Some("https://embed.example/"));
        // Empty values don't override
        assert_eq!(config.bind(), DEFAULT_BIND);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            sources_api_url: Some("https://embed.example".into()),
            ..Default::default()
        };
        config.save(Some(&path)).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.sources_api_url.as_deref(), Some("https://embed.example"));
    }
}
