//! Runtime configuration.
//!
//! # Responsibility
//! - Load settings from an optional TOML file.
//! - Apply environment overrides on top of file values.
//!
//! # Invariants
//! - Every field has a usable default; an absent file is not an error unless
//!   the path was given explicitly.
//! - The API key is never written to logs.

use crate::model::extraction::{MAX_SUBTASKS, MIN_SUBTASKS};
use crate::pipeline::orchestrator::OrchestrationMode;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV_VAR: &str = "KLARA_CONFIG_PATH";
const CONFIG_FILE_NAME: &str = "klara.toml";

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::InvalidValue { key, value } => write!(f, "invalid value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::InvalidValue { .. } => None,
        }
    }
}

/// Settings for the structured-inference collaborator.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    pub api_key: Option<String>,
    /// Overrides the Messages API endpoint.
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Upper bound for one inference call, including connect time.
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl std::fmt::Debug for InferenceConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Settings for the interpretation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub mode: OrchestrationMode,
    pub min_subtasks: usize,
    pub max_subtasks: usize,
    pub default_estimate_minutes: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            mode: OrchestrationMode::default(),
            min_subtasks: MIN_SUBTASKS,
            max_subtasks: MAX_SUBTASKS,
            default_estimate_minutes: crate::pipeline::fallback::FALLBACK_ESTIMATE_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file; `None` means the caller picks a location.
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace|debug|info|warn|error`; build-mode default when unset.
    pub level: Option<String>,
    /// Absolute directory for rolling log files; stderr when unset.
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KlaraConfig {
    pub inference: InferenceConfig,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl KlaraConfig {
    /// Parses a TOML document; missing sections fall back to defaults.
    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Applies overrides from a variable lookup.
    ///
    /// Blank values are ignored so an exported-but-empty variable does not
    /// wipe a file setting.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(value) = get("ANTHROPIC_API_KEY") {
            self.inference.api_key = Some(value);
        }
        if let Some(value) = get("KLARA_MODEL") {
            self.inference.model = value;
        }
        if let Some(value) = get("KLARA_BASE_URL") {
            self.inference.base_url = Some(value);
        }
        if let Some(value) = get("KLARA_TIMEOUT_SECS") {
            let parsed = value.trim().parse::<u64>().ok().filter(|secs| *secs > 0);
            self.inference.timeout_secs = parsed.ok_or(ConfigError::InvalidValue {
                key: "KLARA_TIMEOUT_SECS",
                value,
            })?;
        }
        if let Some(value) = get("KLARA_PIPELINE_MODE") {
            let parsed = OrchestrationMode::parse(&value);
            self.pipeline.mode = parsed.ok_or(ConfigError::InvalidValue {
                key: "KLARA_PIPELINE_MODE",
                value,
            })?;
        }
        if let Some(value) = get("KLARA_DB_PATH") {
            self.storage.db_path = Some(PathBuf::from(value));
        }
        if let Some(value) = get("KLARA_LOG_LEVEL") {
            self.logging.level = Some(value);
        }
        if let Some(value) = get("KLARA_LOG_DIR") {
            self.logging.dir = Some(PathBuf::from(value));
        }
        Ok(())
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pipeline = &self.pipeline;
        // Configured bounds may only tighten the 3..=7 decomposition range.
        if pipeline.min_subtasks < MIN_SUBTASKS || pipeline.min_subtasks > pipeline.max_subtasks {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.min_subtasks",
                value: pipeline.min_subtasks.to_string(),
            });
        }
        if pipeline.max_subtasks > MAX_SUBTASKS {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.max_subtasks",
                value: pipeline.max_subtasks.to_string(),
            });
        }
        if pipeline.default_estimate_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pipeline.default_estimate_minutes",
                value: "0".to_string(),
            });
        }
        if self.inference.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "inference.timeout_secs",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Resolves the config file location.
///
/// Order: explicit path, `KLARA_CONFIG_PATH`, then `$HOME/.config/klara/klara.toml`.
/// The boolean is `true` when the path was requested explicitly.
pub fn config_path(explicit: Option<&Path>) -> Option<(PathBuf, bool)> {
    if let Some(path) = explicit {
        return Some((path.to_path_buf(), true));
    }
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some((PathBuf::from(path), true));
        }
    }
    std::env::var_os("HOME").map(|home| {
        (
            PathBuf::from(home)
                .join(".config")
                .join("klara")
                .join(CONFIG_FILE_NAME),
            false,
        )
    })
}

/// Loads configuration from file (if any) plus process environment.
pub fn load_config(explicit: Option<&Path>) -> Result<KlaraConfig, ConfigError> {
    let mut config = match config_path(explicit) {
        Some((path, required)) => match std::fs::read_to_string(&path) {
            Ok(raw) => KlaraConfig::from_toml_str(&raw, &path)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound && !required => {
                KlaraConfig::default()
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        },
        None => KlaraConfig::default(),
    };

    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_production_settings() {
        let config = KlaraConfig::default();
        assert_eq!(config.inference.model, DEFAULT_MODEL);
        assert_eq!(config.inference.max_tokens, 2048);
        assert_eq!(config.pipeline.mode, OrchestrationMode::MultiExtraction);
        assert_eq!(config.pipeline.min_subtasks, 3);
        assert_eq!(config.pipeline.max_subtasks, 7);
        config.validate().unwrap();
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = KlaraConfig::from_toml_str(
            r#"
            [inference]
            model = "claude-test"

            [pipeline]
            mode = "single_label"
            "#,
            Path::new("inline.toml"),
        )
        .unwrap();

        assert_eq!(config.inference.model, "claude-test");
        assert_eq!(config.inference.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.pipeline.mode, OrchestrationMode::SingleLabel);
        assert_eq!(config.pipeline.max_subtasks, 7);
    }

    #[test]
    fn env_overrides_win_and_blank_values_are_ignored() {
        let vars = HashMap::from([
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("KLARA_MODEL", "  "),
            ("KLARA_PIPELINE_MODE", "single_label"),
            ("KLARA_DB_PATH", "/tmp/klara.db"),
        ]);
        let mut config = KlaraConfig::default();
        config
            .apply_env_overrides(|key| vars.get(key).map(|value| value.to_string()))
            .unwrap();

        assert_eq!(config.inference.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.inference.model, DEFAULT_MODEL);
        assert_eq!(config.pipeline.mode, OrchestrationMode::SingleLabel);
        assert_eq!(
            config.storage.db_path.as_deref(),
            Some(Path::new("/tmp/klara.db"))
        );
    }

    #[test]
    fn invalid_env_values_are_rejected() {
        let mut config = KlaraConfig::default();
        let err = config
            .apply_env_overrides(|key| (key == "KLARA_PIPELINE_MODE").then(|| "both".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "KLARA_PIPELINE_MODE",
                ..
            }
        ));
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = InferenceConfig {
            api_key: Some("sk-secret".to_string()),
            ..InferenceConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn inconsistent_subtask_bounds_fail_validation() {
        let mut config = KlaraConfig::default();
        config.pipeline.min_subtasks = 8;
        assert!(config.validate().is_err());

        let mut config = KlaraConfig::default();
        config.pipeline.max_subtasks = 9;
        assert!(config.validate().is_err());

        let mut config = KlaraConfig::default();
        config.pipeline.max_subtasks = 5;
        config.validate().unwrap();
    }
}
