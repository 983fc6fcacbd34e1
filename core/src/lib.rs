// Cowork: desktop shell for building and running AI agents
// Core library providing run state, timeline types, and backend seams

pub mod agent_spec;
pub mod config;
pub mod errors;
pub mod notifications;
pub mod run_state;
pub mod theme;
pub mod timeline;
pub mod traits;
pub mod transcript;

// Re-export commonly used types
pub use errors::{
    ConfigError, ConfigResult, ConversionError, GatewayError, GatewayResult, PreferenceError,
    PreferenceResult, SpecError, SpecResult,
};

pub use timeline::{AgentEvent, EventKind, RunStatus, TimelineEvent};

pub use run_state::{RunState, RunTransition, TransitionOutcome};

pub use traits::{CommandTransport, EventChannel};

pub use transcript::{convert_record, convert_transcript, TranscriptRecord};

pub use notifications::{Notification, NotificationCenter, Notifier, Severity};

pub use theme::{
    detect_terminal_appearance, AppearanceDetector, FilePreferenceStore, PreferenceStore,
    ResolvedTheme, ThemeMode, ThemeStore,
};

pub use agent_spec::{AgentSoul, AgentSpec, AirlockConfig, RateLimitForm, RateLimits, ToolPolicy};

pub use config::{
    BackendConfig, LoggingConfig, RuntimeConfig, ShellConfig, ThemeConfig, DEFAULT_EVENT_CHANNEL,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
