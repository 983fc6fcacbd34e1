// Theme store for the Cowork shell
//
// - Explicitly constructed and injected, never a process-wide global
// - Preference persisted through a PreferenceStore ("system" | "light" | "dark")
// - "system" resolves through an injected appearance detector

use crate::errors::{PreferenceError, PreferenceResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// User-selected theme mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThemeMode::Light => write!(f, "light"),
            ThemeMode::Dark => write!(f, "dark"),
            ThemeMode::System => write!(f, "system"),
        }
    }
}

impl FromStr for ThemeMode {
    type Err = PreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ThemeMode::Light),
            "dark" => Ok(ThemeMode::Dark),
            "system" => Ok(ThemeMode::System),
            other => Err(PreferenceError::UnknownMode(other.to_string())),
        }
    }
}

/// Theme actually painted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolvedTheme {
    Light,
    Dark,
}

impl fmt::Display for ResolvedTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedTheme::Light => write!(f, "light"),
            ResolvedTheme::Dark => write!(f, "dark"),
        }
    }
}

/// Persistence for the theme preference
pub trait PreferenceStore: Send + Sync {
    /// The stored mode, or `None` if nothing was ever saved
    fn load(&self) -> PreferenceResult<Option<ThemeMode>>;

    fn save(&self, mode: ThemeMode) -> PreferenceResult<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct PreferenceFile {
    theme: String,
}

/// JSON file preference store
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/cowork/theme.json`
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("cowork")
            .join("theme.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> PreferenceResult<Option<ThemeMode>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        let file: PreferenceFile = serde_json::from_str(&contents)?;
        file.theme.parse().map(Some)
    }

    fn save(&self, mode: ThemeMode) -> PreferenceResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(&PreferenceFile {
            theme: mode.to_string(),
        })?;
        fs::write(&self.path, body)?;
        Ok(())
    }
}

/// Detects the operating system appearance
pub type AppearanceDetector = Box<dyn Fn() -> ResolvedTheme + Send + Sync>;

/// Current theme mode plus how to resolve and persist it
pub struct ThemeStore<P: PreferenceStore> {
    mode: ThemeMode,
    store: P,
    detect_system: AppearanceDetector,
}

impl<P: PreferenceStore> ThemeStore<P> {
    /// Read the persisted preference, falling back to `System` when it is
    /// missing or unreadable.
    pub fn init(store: P, detect_system: AppearanceDetector) -> Self {
        let mode = match store.load() {
            Ok(Some(mode)) => mode,
            Ok(None) => ThemeMode::System,
            Err(e) => {
                warn!("Ignoring unreadable theme preference: {}", e);
                ThemeMode::System
            }
        };
        debug!("Theme store initialised with mode {}", mode);

        Self {
            mode,
            store,
            detect_system,
        }
    }

    pub fn mode(&self) -> ThemeMode {
        self.mode
    }

    pub fn resolved(&self) -> ResolvedTheme {
        match self.mode {
            ThemeMode::Light => ResolvedTheme::Light,
            ThemeMode::Dark => ResolvedTheme::Dark,
            ThemeMode::System => (self.detect_system)(),
        }
    }

    /// Change and persist the mode. The in-memory mode only changes if the
    /// preference was saved.
    pub fn set_mode(&mut self, mode: ThemeMode) -> PreferenceResult<()> {
        self.store.save(mode)?;
        self.mode = mode;
        Ok(())
    }

    /// Flip between light and dark based on what is currently painted
    pub fn toggle(&mut self) -> PreferenceResult<ResolvedTheme> {
        let next = match self.resolved() {
            ResolvedTheme::Light => ThemeMode::Dark,
            ResolvedTheme::Dark => ThemeMode::Light,
        };
        self.set_mode(next)?;
        Ok(self.resolved())
    }
}

/// Appearance detector reading the `COLORFGBG` convention; defaults to dark.
pub fn detect_terminal_appearance() -> ResolvedTheme {
    match std::env::var("COLORFGBG") {
        Ok(value) => match value.rsplit(';').next().and_then(|bg| bg.parse::<u8>().ok()) {
            Some(bg) if bg == 7 || bg >= 9 => ResolvedTheme::Light,
            _ => ResolvedTheme::Dark,
        },
        Err(_) => ResolvedTheme::Dark,
    }
}
