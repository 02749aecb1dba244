//! Configuration management for Castwise
//!
//! ```toml
//! [assistant]
//! command = "agent"
//! tools = "Read"
//! timeout = "2m"
//!
//! [logging]
//! format = "text"
//! level = "warn"
//! ```
//!
//! Every key is optional. A missing file means defaults throughout.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::logging::LogFormat;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub assistant: AssistantConfig,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Executable of the content assistant
    pub command: String,
    /// Value passed to `--tools`
    pub tools: String,
    /// Default timeout, in humantime notation ("90s", "2m")
    pub timeout: String,
    /// Working directory for the assistant; tilde-expanded
    pub working_dir: Option<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            command: "agent".to_string(),
            tools: "Read".to_string(),
            timeout: "2m".to_string(),
            working_dir: None,
        }
    }
}

impl AssistantConfig {
    pub fn timeout(&self) -> Result<Duration> {
        humantime::parse_duration(&self.timeout).map_err(|e| {
            ConfigError::InvalidValue {
                field: "assistant.timeout".to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    pub fn working_dir(&self) -> Option<PathBuf> {
        self.working_dir
            .as_deref()
            .map(|dir| PathBuf::from(shellexpand::tilde(dir).to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: String,
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: "text".to_string(),
            level: "warn".to_string(),
        }
    }
}

/// The `[logging]` table alone; other sections are skipped unparsed
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoggingSection {
    logging: LoggingSettings,
}

impl LoggingSettings {
    /// Load only the `[logging]` section from the default location
    ///
    /// For tools that never use the assistant: a bad `[assistant]` section
    /// does not stop them. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let section: LoggingSection = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        section.logging.format()?;
        Ok(section.logging)
    }

    pub fn format(&self) -> Result<LogFormat> {
        self.format.parse().map_err(|message| {
            ConfigError::InvalidValue {
                field: "logging.format".to_string(),
                message,
            }
            .into()
        })
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// A missing file is not an error and yields [`Config::default`].
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;

        // Surface bad durations and formats at load time
        config.assistant.timeout()?;
        config.logging.format()?;

        Ok(config)
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("CASTWISE_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("castwise").join("config.toml"))
}
