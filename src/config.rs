// Configuration loading and parsing (tiletrack.toml).
//
// The config file is optional: when it is absent the built-in defaults
// are used (local server for the classic view, the public tracker pool
// for ore/orb). A present-but-invalid file is an error, not a silent
// fallback.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::protocol::ViewId;

/// Config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "tiletrack.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    ReadError { path: PathBuf, message: String },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub backoff: BackoffConfig,
    pub views: ViewEndpoints,
}

impl Config {
    /// WebSocket endpoint for one view.
    pub fn endpoint(&self, view: ViewId) -> &str {
        match view {
            ViewId::Classic => &self.views.classic,
            ViewId::Ore => &self.views.ore,
            ViewId::Orb => &self.views.orb,
        }
    }
}

/// REST endpoint settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: "http://localhost:3000".to_string(),
        }
    }
}

/// Reconnect backoff parameters: base delay, multiplicative growth per
/// consecutive failure, and the ceiling the delay never exceeds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub base_ms: u64,
    pub factor: f64,
    pub ceiling_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        BackoffConfig {
            base_ms: 1000,
            factor: 1.5,
            ceiling_ms: 30_000,
        }
    }
}

/// Per-view WebSocket endpoints. Each view owns its own connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewEndpoints {
    pub classic: String,
    pub ore: String,
    pub orb: String,
}

impl Default for ViewEndpoints {
    fn default() -> Self {
        ViewEndpoints {
            classic: "ws://localhost:3000/ws".to_string(),
            ore: "wss://pool.ore-track.com/ws".to_string(),
            orb: "wss://pool.ore-track.com/orb/ws".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load the configuration from `tiletrack.toml` in `base_dir`, falling
/// back to defaults when the file does not exist.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join(CONFIG_FILE);
    if !path.exists() {
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    }
    let text = std::fs::read_to_string(&path).map_err(|err| ConfigError::ReadError {
        path: path.clone(),
        message: err.to_string(),
    })?;
    let config: Config =
        toml::from_str(&text).map_err(|source| ConfigError::ParseError { path, source })?;
    validate(&config)?;
    Ok(config)
}

/// Load the configuration from the current working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|err| ConfigError::ReadError {
        path: PathBuf::from("."),
        message: err.to_string(),
    })?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.backoff.base_ms == 0 {
        return Err(ConfigError::ValidationError {
            field: "backoff.base_ms".into(),
            message: "must be greater than 0".into(),
        });
    }
    if config.backoff.factor < 1.0 {
        return Err(ConfigError::ValidationError {
            field: "backoff.factor".into(),
            message: format!("must be >= 1.0, got {}", config.backoff.factor),
        });
    }
    if config.backoff.ceiling_ms < config.backoff.base_ms {
        return Err(ConfigError::ValidationError {
            field: "backoff.ceiling_ms".into(),
            message: "must be >= backoff.base_ms".into(),
        });
    }
    for (field, url) in [
        ("views.classic", &config.views.classic),
        ("views.ore", &config.views.ore),
        ("views.orb", &config.views.orb),
    ] {
        if !url.starts_with("ws://") && !url.starts_with("wss://") {
            return Err(ConfigError::ValidationError {
                field: field.into(),
                message: format!("must be a ws:// or wss:// URL, got `{url}`"),
            });
        }
    }
    if !config.api.base_url.starts_with("http://") && !config.api.base_url.starts_with("https://")
    {
        return Err(ConfigError::ValidationError {
            field: "api.base_url".into(),
            message: format!(
                "must be an http:// or https:// URL, got `{}`",
                config.api.base_url
            ),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
