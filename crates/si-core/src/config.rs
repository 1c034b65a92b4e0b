//! HAL configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Which rendering backend to create a device for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Immediate-mode, globally-stateful backend (legacy binding model).
    #[default]
    OpenGl,
    /// Explicit object-model backend (descriptor sets, immutable layouts).
    Vulkan,
    /// No-op backend for headless testing.
    Null,
}

/// Log verbosity, mapped onto `tracing` levels by [`crate::logging::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Renderer section of the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Backend to select at device creation.
    pub backend: BackendKind,
    /// Enable extra validation of binding descriptions and stage sets.
    pub validation: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            validation: true,
        }
    }
}

/// Debug/logging section of the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    /// Log verbosity.
    pub log_level: LogLevel,
}

/// Top-level HAL configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub renderer: RendererConfig,
    pub debug: DebugConfig,
}

impl Config {
    /// Parse a configuration from a TOML string.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}
