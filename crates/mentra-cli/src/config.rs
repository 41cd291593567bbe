//! Configuration file management for mentra.
//!
//! Provides a TOML-based config file at `~/.config/mentra/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use mentra_core::output::check_tolerance;
use mentra_core::{HOUR_SUM_TOLERANCE, ModelConfig};

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub model: ModelSection,
    #[serde(default)]
    pub validation: ValidationSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ModelSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Gemini model name, e.g. `gemini-1.5-flash`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ValidationSection {
    /// Allowed gap between declared and computed roadmap hours.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hour_tolerance: Option<f64>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the mentra config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/mentra` or `~/.config/mentra`,
/// even on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("mentra");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("mentra")
}

/// Return the path to the mentra config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    save_config_to(&config_path(), config)
}

/// Write `config` to `path`. Sets file permissions to 0600 on Unix, since
/// the file may hold an API key.
pub fn save_config_to(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct MentraConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub hour_tolerance: f64,
}

impl MentraConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Model: `cli_model` > `MENTRA_MODEL` > `model.name` > `ModelConfig::DEFAULT_MODEL`
    /// - API key: `GEMINI_API_KEY` > `model.api_key` > none
    /// - Base URL: `MENTRA_MODEL_BASE_URL` > `model.base_url` > `ModelConfig::DEFAULT_BASE_URL`
    /// - Timeout and tolerance: config file > default
    pub fn resolve(cli_model: Option<&str>) -> Result<Self> {
        let file_config = match load_config() {
            Ok(cfg) => Some(cfg),
            Err(e) if config_path().exists() => return Err(e),
            Err(_) => None,
        };
        Self::resolve_with(cli_model, file_config.unwrap_or_default())
    }

    fn resolve_with(cli_model: Option<&str>, file: ConfigFile) -> Result<Self> {
        let ConfigFile { model, validation } = file;

        let model_name = cli_model
            .map(str::to_string)
            .or_else(|| std::env::var("MENTRA_MODEL").ok())
            .or(model.name)
            .unwrap_or_else(|| ModelConfig::DEFAULT_MODEL.to_string());

        let api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .or(model.api_key)
            .filter(|k| !k.is_empty());

        let base_url = std::env::var("MENTRA_MODEL_BASE_URL")
            .ok()
            .or(model.base_url)
            .unwrap_or_else(|| ModelConfig::DEFAULT_BASE_URL.to_string());

        let timeout = model
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(ModelConfig::DEFAULT_TIMEOUT);

        let hour_tolerance =
            check_tolerance(validation.hour_tolerance.unwrap_or(HOUR_SUM_TOLERANCE))
                .context("invalid validation.hour_tolerance")?;

        Ok(Self {
            api_key,
            model: model_name,
            base_url,
            timeout,
            hour_tolerance,
        })
    }

    /// Model client settings. Fails when no API key was found.
    pub fn model_config(&self) -> Result<ModelConfig> {
        let Some(api_key) = &self.api_key else {
            bail!(
                "Gemini API key not found; set GEMINI_API_KEY or run `mentra init --api-key <KEY>`"
            );
        };
        Ok(ModelConfig::new(api_key.clone())
            .model(self.model.clone())
            .base_url(self.base_url.clone())
            .timeout(self.timeout))
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
