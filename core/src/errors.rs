/// Error types for the Cowork shell.
use thiserror::Error;

/// Failure of a call made through the command gateway or of the event
/// transport. Every variant carries a human-readable message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    /// The backend could not be reached or answered with a non-success status
    #[error("Connection error: {0}")]
    Connection(String),

    /// The backend rejected the command
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Request or response could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The event channel closed underneath a subscriber
    #[error("Channel closed: {0}")]
    Closed(String),
}

impl GatewayError {
    /// The message surfaced to the user as `lastError` and in notifications.
    ///
    /// Backend rejections carry their message verbatim; transport-level
    /// failures keep their prefix so the user can tell them apart.
    pub fn message(&self) -> String {
        match self {
            GatewayError::Rpc { message, .. } => message.clone(),
            GatewayError::Connection(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for GatewayError {
    fn from(e: serde_json::Error) -> Self {
        GatewayError::Serialization(e.to_string())
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// A persisted transcript record that cannot be converted into a timeline entry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    #[error("Malformed transcript record at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },
}

/// Shell configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Agent-builder spec validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("Agent spec id is required")]
    MissingId,

    #[error("Agent name is required")]
    MissingName,

    #[error("Allowlist tool policy requires at least one allowed tool")]
    EmptyAllowlist,

    #[error("Tool '{0}' is both allowed and denied")]
    ConflictingTool(String),

    #[error("Unknown tool policy mode: {0}")]
    UnknownPolicyMode(String),

    #[error("Invalid value for {field}: '{value}' is not a non-negative whole number")]
    InvalidRateLimit { field: &'static str, value: String },
}

/// Result type for agent spec operations
pub type SpecResult<T> = Result<T, SpecError>;

/// Theme preference persistence errors.
#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid preference file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown theme mode: {0}")]
    UnknownMode(String),
}

/// Result type for preference operations
pub type PreferenceResult<T> = Result<T, PreferenceError>;
