use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_ENV_VAR: &str = "QUICKTASK_CONFIG_PATH";
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

const RESET: &str = "\x1b[0m";

/// Terminal colours for the two things the renderer highlights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    expired: &'static str,
    heading: &'static str,
}

impl Palette {
    pub const PLAIN: Self = Self {
        expired: "",
        heading: "",
    };

    pub fn expired(&self, text: &str) -> String {
        paint(self.expired, text)
    }

    pub fn heading(&self, text: &str) -> String {
        paint(self.heading, text)
    }
}

fn paint(colour: &str, text: &str) -> String {
    if colour.is_empty() {
        text.to_string()
    } else {
        format!("{colour}{text}{RESET}")
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Default,
    Noir,
    Solarized,
}

impl Theme {
    /// Accepts loose spellings such as `Dark Mode` or `solarized`; unknown
    /// names yield `None`.
    pub fn from_name(raw: &str) -> Option<Self> {
        let folded: String = raw
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|ch| ch.to_ascii_lowercase())
            .collect();

        match folded.as_str() {
            "" | "default" | "vanilla" | "light" | "plain" => Some(Self::Default),
            "noir" | "dark" | "darkmode" => Some(Self::Noir),
            "solarized" => Some(Self::Solarized),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Noir => "noir",
            Self::Solarized => "solarized",
        }
    }

    pub fn palette(self) -> Palette {
        match self {
            Self::Default => Palette::PLAIN,
            Self::Noir => Palette {
                expired: "\x1b[38;5;208m",
                heading: "\x1b[38;5;250m",
            },
            Self::Solarized => Palette {
                expired: "\x1b[38;5;160m",
                heading: "\x1b[38;5;245m",
            },
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub theme: Option<String>,
    #[serde(default)]
    pub aliases: HashMap<String, String>,
    #[serde(default)]
    pub refresh_interval_secs: Option<u64>,
    #[serde(default)]
    pub notifications: Option<bool>,
}

/// A config plus the reason the file could not be used, if any.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub aliases: HashMap<String, String>,
    pub refresh_interval_secs: Option<u64>,
    pub notifications: Option<bool>,
}

impl Config {
    /// Reads the config file, falling back to defaults when it is unusable.
    pub fn load() -> ConfigLoad {
        match config_path() {
            Ok(path) => Self::load_or_default(&path),
            Err(err) => ConfigLoad {
                config: Self::default(),
                error: Some(err),
            },
        }
    }

    fn load_or_default(path: &Path) -> ConfigLoad {
        if !path.exists() {
            return ConfigLoad {
                config: Self::default(),
                error: None,
            };
        }

        match Self::from_path(path) {
            Ok(config) => ConfigLoad { config, error: None },
            Err(err) => ConfigLoad {
                config: Self::default(),
                error: Some(err),
            },
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| AppError::io(format!("reading {}: {err}", path.display())))?;
        serde_json::from_str(&raw).map_err(|err| {
            AppError::invalid_data(format!("{} is not a valid config: {err}", path.display()))
        })
    }

    /// Unknown theme names render without colour.
    pub fn theme(&self) -> Theme {
        self.theme
            .as_deref()
            .and_then(Theme::from_name)
            .unwrap_or_default()
    }

    pub fn refresh_interval(&self) -> Duration {
        let secs = self
            .refresh_interval_secs
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS)
            .max(1);
        Duration::from_secs(secs)
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications.unwrap_or(true)
    }

    pub fn with_overrides(&self, overrides: &ConfigOverrides) -> Self {
        let mut merged = self.clone();
        if let Some(theme) = &overrides.theme {
            merged.theme = Some(theme.clone());
        }
        merged.aliases.extend(
            overrides
                .aliases
                .iter()
                .map(|(alias, expansion)| (alias.clone(), expansion.clone())),
        );
        merged.refresh_interval_secs = overrides
            .refresh_interval_secs
            .or(merged.refresh_interval_secs);
        merged.notifications = overrides.notifications.or(merged.notifications);
        merged
    }
}

/// Per-user directory holding the config file and the task lists.
pub fn app_dir() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("quicktask"))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join("quicktask"))
    }
}

pub fn config_path() -> Result<PathBuf, AppError> {
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
        _ => Ok(app_dir()?.join("config.json")),
    }
}
