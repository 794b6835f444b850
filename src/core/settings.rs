//! # Application Settings
//!
//! Centralizes process-level settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.easel/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.
//!
//! Per-image settings (quality, style, ...) are user state, not config; they
//! live in [`crate::core::config_state`].

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::chat::DEFAULT_MODEL;
use crate::imaging::providers::openai::DEFAULT_OPENAI_BASE_URL;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EaselConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub data_dir: Option<String>,
    pub model: Option<String>,
    pub image_store: Option<StoreKind>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

/// Where generated images are kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Disk,
    Memory,
}

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub data_dir: PathBuf,
    pub model: String,
    pub image_store: StoreKind,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    /// Skip all disk state (chat log, settings, images).
    pub ephemeral: bool,
}

/// Overrides that came from the command line. `None` = not specified.
#[derive(Debug, Default)]
pub struct CliOverrides<'a> {
    pub data_dir: Option<&'a Path>,
    pub model: Option<&'a str>,
    pub ephemeral: bool,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "config I/O error: {e}"),
            SettingsError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for SettingsError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.easel`, or `./.easel` if there is no home directory.
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".easel")
}

/// Returns the path to `~/.easel/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".easel").join("config.toml"))
}

/// Load config from `~/.easel/config.toml`.
pub fn load_settings() -> Result<EaselConfig, SettingsError> {
    match config_path() {
        Some(path) => load_settings_from(&path),
        None => {
            warn!("Could not determine home directory, using default config");
            Ok(EaselConfig::default())
        }
    }
}

/// Load config from `path`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `EaselConfig::default()`. If it exists but is malformed,
/// returns `SettingsError::Parse`.
pub fn load_settings_from(path: &Path) -> Result<EaselConfig, SettingsError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(EaselConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(SettingsError::Io)?;
    let config: EaselConfig = toml::from_str(&contents).map_err(SettingsError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config.general);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# Easel Configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# data_dir = "/home/me/.easel"      # Chat log, settings and images
# model = "dall-e-3"
# image_store = "disk"              # "disk" or "memory"

# [openai]
# api_key = "sk-..."                # Or set OPENAI_API_KEY env var
# base_url = "https://api.openai.com/v1"
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final settings by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &EaselConfig, cli: &CliOverrides<'_>) -> ResolvedSettings {
    // Data dir: CLI → env → config → default
    let data_dir = cli
        .data_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::var("EASEL_DATA_DIR").ok().map(PathBuf::from))
        .or_else(|| config.general.data_dir.as_ref().map(PathBuf::from))
        .unwrap_or_else(default_data_dir);

    // Model: CLI → env → config → default
    let model = cli
        .model
        .map(str::to_string)
        .or_else(|| std::env::var("EASEL_MODEL").ok())
        .or_else(|| config.general.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    // API key: env → config
    let openai_api_key = std::env::var("OPENAI_API_KEY")
        .ok()
        .or_else(|| config.openai.api_key.clone())
        .filter(|key| !key.trim().is_empty());

    // Base URL: env → config → default
    let openai_base_url = std::env::var("OPENAI_BASE_URL")
        .ok()
        .or_else(|| config.openai.base_url.clone())
        .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());

    // Ephemeral runs never write images to disk either
    let image_store = if cli.ephemeral {
        StoreKind::Memory
    } else {
        config.general.image_store.unwrap_or_default()
    };

    ResolvedSettings {
        data_dir,
        model,
        image_store,
        openai_api_key,
        openai_base_url,
        ephemeral: cli.ephemeral,
    }
}
