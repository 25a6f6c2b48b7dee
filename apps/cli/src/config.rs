//! Layered runner configuration.
//!
//! Sources, lowest to highest precedence:
//!
//! 1. built-in defaults
//! 2. the TOML file named by `RUNLET_CONFIG`, if it exists
//! 3. `RUNLET_`-prefixed environment variables, `__` separating nested keys
//!    (`RUNLET_VAULT__MOUNT=kv`)
//!
//! `RUNLET_LOG`, `RUST_LOG` and `RUNLET_LOG_FORMAT` keep their logging
//! meaning and are applied last.

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use runlet_context::DEFAULT_ROOT_PREFIX;
use runlet_credential::VaultSettings;
use runlet_script::{MAX_CALL_DEPTH_LIMIT, ScriptConfig};
use serde::{Deserialize, Serialize};

/// Names of the environment variables read outside the nested scheme.
const CONFIG_FILE_VAR: &str = "RUNLET_CONFIG";
const FLAT_VARS: [&str; 4] = ["config", "log", "log_format", "log_colors"];

/// Everything the runner needs besides the envelope itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Context segment that every write must start with.
    pub root_prefix: String,
    /// Vault client settings.
    pub vault: VaultSettings,
    /// Interpreter limits.
    pub script: ScriptConfig,
    /// Logger settings.
    pub log: runlet_log::Config,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            root_prefix: DEFAULT_ROOT_PREFIX.to_string(),
            vault: VaultSettings::default(),
            script: ScriptConfig::default(),
            log: runlet_log::Config::default(),
        }
    }
}

impl RunnerConfig {
    /// Load from the process environment.
    pub fn load() -> anyhow::Result<Self> {
        let file = std::env::var_os(CONFIG_FILE_VAR).map(PathBuf::from);
        let mut config: Self = Self::figment(file)
            .extract()
            .context("invalid runner configuration")?;
        config.apply_log_env(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then `file`, then `RUNLET_*` variables.
    pub fn figment(file: Option<PathBuf>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(
            Env::prefixed("RUNLET_")
                .filter(|key| !FLAT_VARS.iter().any(|flat| key.as_str().eq_ignore_ascii_case(flat)))
                .split("__"),
        )
    }

    fn apply_log_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let from_env = runlet_log::Config::from_vars(&lookup);
        if lookup("RUNLET_LOG").or_else(|| lookup("RUST_LOG")).is_some() {
            self.log.level = from_env.level;
        }
        if lookup("RUNLET_LOG_FORMAT").is_some() {
            self.log.format = from_env.format;
        }
        if lookup("RUNLET_LOG_COLORS").is_some() {
            self.log.display.colors = from_env.display.colors;
        }
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.root_prefix.is_empty() || self.root_prefix.contains(runlet_context::SEPARATOR) {
            bail!(
                "root_prefix must be a single non-empty path segment, got '{}'",
                self.root_prefix
            );
        }
        let depth = self.script.max_call_depth;
        if !(1..=MAX_CALL_DEPTH_LIMIT).contains(&depth) {
            bail!(
                "script.max_call_depth must be between 1 and {MAX_CALL_DEPTH_LIMIT}, got {depth}"
            );
        }
        self.vault.validate().context("invalid vault settings")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let config = RunnerConfig::default();
        assert_eq!(config.root_prefix, "variables");
        assert_eq!(config.vault.timeout_secs, 10);
        assert_eq!(config.script.max_call_depth, 64);
        config.validate().unwrap();
    }

    #[test]
    fn file_then_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "runlet.toml",
                r#"
                root_prefix = "vars"

                [vault]
                mount = "kv"
                timeout_secs = 5

                [script]
                max_call_depth = 32
                "#,
            )?;
            jail.set_env("RUNLET_VAULT__TIMEOUT_SECS", "20");
            jail.set_env("RUNLET_LOG", "debug");

            let config: RunnerConfig = RunnerConfig::figment(Some("runlet.toml".into())).extract()?;

            assert_eq!(config.root_prefix, "vars");
            assert_eq!(config.vault.mount, "kv");
            assert_eq!(config.vault.timeout_secs, 20);
            assert_eq!(config.script.max_call_depth, 32);
            // the flat logging variable is not a nested key
            assert_eq!(config.log.level, runlet_log::DEFAULT_LEVEL);
            Ok(())
        });
    }

    #[test]
    fn missing_file_is_ignored() {
        Jail::expect_with(|_| {
            let config: RunnerConfig = RunnerConfig::figment(Some("absent.toml".into())).extract()?;
            assert_eq!(config, RunnerConfig::default());
            Ok(())
        });
    }

    #[test]
    fn logging_variables_override_the_file() {
        let mut config = RunnerConfig::default();
        config.log.level = "error".into();

        config.apply_log_env(|name| match name {
            "RUST_LOG" => Some("info".into()),
            "RUNLET_LOG_FORMAT" => Some("json".into()),
            _ => None,
        });

        assert_eq!(config.log.level, "info");
        assert_eq!(config.log.format, runlet_log::Format::Json);
    }

    #[test]
    fn dotted_root_prefix_is_rejected() {
        let config = RunnerConfig {
            root_prefix: "a.b".into(),
            ..RunnerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("single non-empty path segment"));
    }

    #[test]
    fn out_of_range_timeout_is_rejected() {
        let mut config = RunnerConfig::default();
        config.vault.timeout_secs = 120;
        let err = config.validate().unwrap_err();
        assert!(format!("{err:#}").contains("timeout_secs"), "{err:#}");
    }

    #[test]
    fn call_depth_outside_the_limit_is_rejected() {
        let mut config = RunnerConfig::default();
        config.script.max_call_depth = MAX_CALL_DEPTH_LIMIT;
        config.validate().unwrap();

        config.script.max_call_depth = 100_000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("script.max_call_depth must be between 1 and"), "{err}");

        config.script.max_call_depth = 0;
        assert!(config.validate().is_err());
    }
}
