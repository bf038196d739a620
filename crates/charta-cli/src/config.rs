//! Configuration file management for charta.
//!
//! Provides a TOML-based config file at `~/.config/charta/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Fallback backend URL when nothing else is configured.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080/api";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub backend: BackendSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BackendSection {
    pub url: String,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the charta config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/charta` or `~/.config/charta`.
/// We intentionally ignore the platform-specific `dirs::config_dir()`
/// (which returns `~/Library/Application Support` on macOS).
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("charta");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("charta")
}

/// Return the path to the charta config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load the config file, if it exists.
pub fn load_config() -> Result<Option<ConfigFile>> {
    let path = config_path();
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let cfg: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    Ok(Some(cfg))
}

/// Write the config file, creating the directory as needed.
pub fn save_config(cfg: &ConfigFile) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory: {}", dir.display()))?;
    let content = toml::to_string_pretty(cfg).context("failed to serialize config")?;
    let path = config_path();
    std::fs::write(&path, content)
        .with_context(|| format!("failed to write config file: {}", path.display()))?;
    Ok(())
}

// -----------------------------------------------------------------------
// Resolution
// -----------------------------------------------------------------------

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct ChartaConfig {
    pub backend_url: String,
}

impl ChartaConfig {
    /// Resolve the backend URL: CLI flag > `CHARTA_BACKEND_URL` > config
    /// file > default.
    pub fn resolve(cli_url: Option<&str>) -> Result<Self> {
        if let Some(url) = cli_url {
            return Ok(Self {
                backend_url: url.to_owned(),
            });
        }
        if let Ok(url) = std::env::var("CHARTA_BACKEND_URL") {
            if !url.is_empty() {
                return Ok(Self { backend_url: url });
            }
        }
        if let Some(cfg) = load_config()? {
            return Ok(Self {
                backend_url: cfg.backend.url,
            });
        }
        Ok(Self {
            backend_url: DEFAULT_BACKEND_URL.to_owned(),
        })
    }
}
