//! Logger configuration and presets.

use serde::{Deserialize, Serialize};

/// Filter used when neither `RUNLET_LOG` nor `RUST_LOG` is set.
pub const DEFAULT_LEVEL: &str = "warn";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filter directive (e.g. `"info"`, `"debug,reqwest=warn"`)
    pub level: String,

    /// Output format
    pub format: Format,

    /// Display configuration
    pub display: DisplayConfig,
}

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Human-readable, multi-line
    Pretty,
    /// Compact single-line output
    #[default]
    Compact,
    /// Structured JSON, one object per line
    Json,
}

impl Format {
    /// Parse a format name; unknown names fall back to [`Format::Compact`].
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// What each event line shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Show timestamps
    pub time: bool,
    /// Show source location (`file:line`)
    pub source: bool,
    /// Show target module
    pub target: bool,
    /// Use ANSI colors
    pub colors: bool,
    /// Flatten JSON event fields into the top-level object
    pub flatten: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            time: true,
            source: false,
            target: true,
            colors: std::io::IsTerminal::is_terminal(&std::io::stderr()),
            flatten: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            format: Format::Compact,
            display: DisplayConfig::default(),
        }
    }
}

impl Config {
    /// Create configuration from the process environment.
    ///
    /// `RUNLET_LOG` (or `RUST_LOG`) sets the filter, `RUNLET_LOG_FORMAT`
    /// the format.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`.
    #[must_use]
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(level) = lookup("RUNLET_LOG").or_else(|| lookup("RUST_LOG")) {
            if !level.trim().is_empty() {
                config.level = level;
            }
        }

        if let Some(format) = lookup("RUNLET_LOG_FORMAT") {
            config.format = Format::parse_lenient(&format);
        }

        if let Some(colors) = lookup("RUNLET_LOG_COLORS") {
            config.display.colors = colors != "0" && colors != "false";
        }

        config
    }

    /// Development configuration (pretty, debug level)
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: Format::Pretty,
            display: DisplayConfig {
                source: true,
                ..DisplayConfig::default()
            },
        }
    }

    /// Production configuration (JSON, info level)
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Json,
            display: DisplayConfig {
                colors: false,
                source: false,
                flatten: true,
                ..DisplayConfig::default()
            },
        }
    }

    /// Test configuration: everything, no colors, no timestamps.
    #[must_use]
    pub fn test() -> Self {
        Self {
            level: "trace".to_string(),
            format: Format::Compact,
            display: DisplayConfig {
                colors: false,
                time: false,
                ..DisplayConfig::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            pairs
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_string())
        }
    }

    #[test]
    fn defaults_to_warn_compact() {
        let config = Config::from_vars(vars(&[]));
        assert_eq!(config.level, DEFAULT_LEVEL);
        assert_eq!(config.format, Format::Compact);
    }

    #[test]
    fn runlet_log_wins_over_rust_log() {
        let config = Config::from_vars(vars(&[
            ("RUST_LOG", "info"),
            ("RUNLET_LOG", "runlet_script=trace"),
        ]));
        assert_eq!(config.level, "runlet_script=trace");

        let config = Config::from_vars(vars(&[("RUST_LOG", "info")]));
        assert_eq!(config.level, "info");
    }

    #[test]
    fn blank_filter_keeps_the_default() {
        let config = Config::from_vars(vars(&[("RUNLET_LOG", "  ")]));
        assert_eq!(config.level, DEFAULT_LEVEL);
    }

    #[rstest]
    #[case("json", Format::Json)]
    #[case("PRETTY", Format::Pretty)]
    #[case("compact", Format::Compact)]
    #[case("logfmt", Format::Compact)]
    fn format_names(#[case] name: &str, #[case] expected: Format) {
        assert_eq!(Format::parse_lenient(name), expected);
    }

    #[test]
    fn colors_can_be_turned_off() {
        let config = Config::from_vars(vars(&[("RUNLET_LOG_COLORS", "false")]));
        assert!(!config.display.colors);
    }

    #[test]
    fn presets() {
        assert_eq!(Config::production().format, Format::Json);
        assert!(!Config::production().display.colors);
        assert_eq!(Config::development().level, "debug");
        assert!(!Config::test().display.time);
    }

    #[test]
    fn deserializes_partial_tables() {
        let config: Config = serde_json::from_str(r#"{"format": "json"}"#).unwrap();
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.level, DEFAULT_LEVEL);
    }
}
