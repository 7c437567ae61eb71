//! Global settings loaded from TOML.
//!
//! - `init_custom(toml_content)` sets a custom TOML before first `settings()` call
//! - `settings()` returns `&'static Settings` (lazy-init singleton)
//! - Default values are embedded via `include_str!("default_settings.toml")`

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();

/// Set custom TOML before first `settings()` call.
pub fn init_custom(toml_content: String) -> Result<(), SettingsError> {
    parse_settings_toml(&toml_content)?;
    CUSTOM_TOML
        .set(toml_content)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// Get or initialize the global settings singleton.
pub fn settings() -> &'static Settings {
    static INSTANCE: OnceLock<Settings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        let toml_str = CUSTOM_TOML
            .get()
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_SETTINGS_TOML);
        parse_settings_toml(toml_str).expect("settings TOML must be valid")
    })
}

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("settings already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub engine: EngineSettings,
    pub mapping: MappingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    pub start_active: bool,
    toggle_key: String,
    #[serde(skip, default = "ToggleKey::default")]
    toggle_key_parsed: ToggleKey,
}

impl EngineSettings {
    pub fn toggle_key(&self) -> ToggleKey {
        self.toggle_key_parsed
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MappingSettings {
    pub path: PathBuf,
    pub watch: bool,
    pub poll_interval_ms: u64,
}

impl MappingSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Hardware key that flips substitution on and off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToggleKey {
    #[default]
    PageUp,
    PageDown,
    ScrollLock,
    Pause,
    Insert,
    /// Function key `F1`..=`F12`.
    Function(u8),
}

impl FromStr for ToggleKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PageUp" => Ok(Self::PageUp),
            "PageDown" => Ok(Self::PageDown),
            "ScrollLock" => Ok(Self::ScrollLock),
            "Pause" => Ok(Self::Pause),
            "Insert" => Ok(Self::Insert),
            _ => s
                .strip_prefix('F')
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|n| (1..=12).contains(n))
                .map(Self::Function)
                .ok_or_else(|| format!("unsupported toggle key {s:?}")),
        }
    }
}

impl fmt::Display for ToggleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageUp => f.write_str("PageUp"),
            Self::PageDown => f.write_str("PageDown"),
            Self::ScrollLock => f.write_str("ScrollLock"),
            Self::Pause => f.write_str("Pause"),
            Self::Insert => f.write_str("Insert"),
            Self::Function(n) => write!(f, "F{n}"),
        }
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let mut s: Settings =
        toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    s.engine.toggle_key_parsed =
        s.engine
            .toggle_key
            .parse()
            .map_err(|reason| SettingsError::InvalidValue {
                field: "engine.toggle_key".to_string(),
                reason,
            })?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    if s.mapping.poll_interval_ms == 0 {
        return Err(SettingsError::InvalidValue {
            field: "mapping.poll_interval_ms".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    if s.mapping.path.as_os_str().is_empty() {
        return Err(SettingsError::InvalidValue {
            field: "mapping.path".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}
