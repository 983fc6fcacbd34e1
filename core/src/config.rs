/// Shell configuration
use crate::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default event channel carrying agent run events
pub const DEFAULT_EVENT_CHANNEL: &str = "agent://event";

/// Shell configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub backend: BackendConfig,
    pub runtime: RuntimeConfig,
    pub logging: LoggingConfig,
    pub theme: ThemeConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// JSON-RPC endpoint for commands
    pub rpc_url: String,
    /// WebSocket endpoint for event channels
    pub events_url: String,
    /// Bearer token sent with commands
    pub auth_token: Option<String>,
    /// Consecutive event stream reconnects before giving up (-1 for infinite)
    pub reconnect_attempts: i32,
    /// Delay between event stream reconnects
    pub reconnect_delay_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            rpc_url: "http://127.0.0.1:8080".to_string(),
            events_url: "ws://127.0.0.1:8080/events".to_string(),
            auth_token: None,
            reconnect_attempts: 5,
            reconnect_delay_ms: 1000,
        }
    }
}

/// Agent runtime pane configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Channel carrying run events
    pub event_channel: String,
    /// Command launching a run
    pub launch_command: String,
    /// Command loading a persisted transcript
    pub transcript_command: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            event_channel: DEFAULT_EVENT_CHANNEL.to_string(),
            launch_command: "run_agent_workflow".to_string(),
            transcript_command: "get_agent_chat_history".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

/// Theme configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Where the theme preference is persisted; platform data dir if unset
    pub preference_file: Option<PathBuf>,
}

impl ShellConfig {
    /// `<config dir>/cowork/shell.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cowork")
            .join("shell.toml")
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load from the given file, or from the default file if it exists, or
    /// fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Self::load(&default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn to_toml(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if !has_scheme(&self.backend.rpc_url, &["http://", "https://"]) {
            return Err(ConfigError::Invalid(format!(
                "backend.rpc_url must be an http(s) URL, got '{}'",
                self.backend.rpc_url
            )));
        }

        if !has_scheme(&self.backend.events_url, &["ws://", "wss://"]) {
            return Err(ConfigError::Invalid(format!(
                "backend.events_url must be a ws(s) URL, got '{}'",
                self.backend.events_url
            )));
        }

        for (name, value) in [
            ("runtime.event_channel", &self.runtime.event_channel),
            ("runtime.launch_command", &self.runtime.launch_command),
            ("runtime.transcript_command", &self.runtime.transcript_command),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", name)));
            }
        }

        Ok(())
    }
}

fn has_scheme(url: &str, schemes: &[&str]) -> bool {
    schemes
        .iter()
        .any(|scheme| url.starts_with(scheme) && url.len() > scheme.len())
}
