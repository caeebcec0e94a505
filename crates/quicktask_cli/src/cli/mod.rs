use clap::Parser;
use quicktask_core::config::ConfigOverrides;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(author, version, about = "Keep tasks from plain-language commands", long_about = None)]
pub struct Cli {
    /// Output JSON
    #[arg(long)]
    pub json: bool,

    /// Override a config value for this run (theme, alias.<name>,
    /// refresh_interval_secs, notifications)
    #[arg(long = "config-override", value_name = "KEY=VALUE")]
    pub config_override: Vec<ConfigOverride>,

    /// Command to run once; without one an interactive prompt starts
    ///
    /// Example: quicktask add buy milk by tomorrow #home !
    /// Example: quicktask view week
    #[arg(value_name = "COMMAND", trailing_var_arg = true, allow_hyphen_values = true)]
    pub words: Vec<String>,
}

impl Cli {
    /// The command words joined back into one line, if any were given.
    pub fn command_line(&self) -> Option<String> {
        if self.words.is_empty() {
            None
        } else {
            Some(self.words.join(" "))
        }
    }
}

/// One `--config-override KEY=VALUE` argument, typed at parse time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverride {
    Theme(String),
    Alias { name: String, expansion: String },
    RefreshInterval(u64),
    Notifications(bool),
}

impl FromStr for ConfigOverride {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let Some((key, value)) = raw.split_once('=') else {
            return Err(format!("expected KEY=VALUE, got '{}'", raw.trim()));
        };
        let value = value.trim();
        let (field, sub) = match key.split_once('.') {
            Some((field, sub)) => (field, Some(sub.trim())),
            None => (key, None),
        };

        match (fold_key(field).as_str(), sub) {
            ("alias" | "aliases", Some(name)) if !name.is_empty() => Ok(Self::Alias {
                name: name.to_string(),
                expansion: value.to_string(),
            }),
            ("alias" | "aliases", _) => {
                Err("alias overrides are written alias.<name>=<command>".into())
            }
            ("", _) => Err("override key cannot be empty".into()),
            (field, Some(_)) if KNOWN_FIELDS.contains(&field) => {
                Err(format!("{field} has no sub-keys"))
            }
            ("theme", None) => Ok(Self::Theme(value.to_string())),
            ("refresh_interval" | "refresh_interval_secs", None) => value
                .parse()
                .map(Self::RefreshInterval)
                .map_err(|_| format!("refresh_interval_secs wants whole seconds, got '{value}'")),
            ("notifications", None) => parse_switch(value)
                .map(Self::Notifications)
                .ok_or_else(|| format!("notifications wants on or off, got '{value}'")),
            (other, _) => Err(format!("unknown config field '{other}'")),
        }
    }
}

const KNOWN_FIELDS: [&str; 4] = [
    "theme",
    "refresh_interval",
    "refresh_interval_secs",
    "notifications",
];

/// Folds every `--config-override` argument into one set of overrides; later
/// arguments win.
pub fn collect_overrides(overrides: &[ConfigOverride]) -> ConfigOverrides {
    let mut collected = ConfigOverrides::default();
    for entry in overrides {
        match entry.clone() {
            ConfigOverride::Theme(theme) => collected.theme = Some(theme),
            ConfigOverride::Alias { name, expansion } => {
                collected.aliases.insert(name, expansion);
            }
            ConfigOverride::RefreshInterval(secs) => collected.refresh_interval_secs = Some(secs),
            ConfigOverride::Notifications(enabled) => collected.notifications = Some(enabled),
        }
    }
    collected
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Some(true),
        "false" | "off" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// `Refresh-Interval Secs` and `refresh_interval_secs` name the same key.
fn fold_key(key: &str) -> String {
    key.trim()
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}
