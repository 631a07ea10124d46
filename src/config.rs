// Configuration: defaults < crm_lens.toml < CRM_LENS_* environment variables.
// Nested keys use a double underscore, e.g. CRM_LENS_NARRATIVE__API_KEY.

use super::{
    errors::ConfigError,
    ingest::{DEFAULT_MAX_BYTES, IngestOptions},
    result::ConfigResult,
};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "crm_lens.toml";
pub const ENV_PREFIX: &str = "CRM_LENS_";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrmConfig {
    pub dataset: DatasetConfig,
    pub narrative: NarrativeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub path: Option<PathBuf>,
    pub max_bytes: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }
}

impl From<&DatasetConfig> for IngestOptions {
    fn from(config: &DatasetConfig) -> Self {
        Self {
            max_bytes: config.max_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    pub endpoint: String,
    pub model: String,
    // Unset leaves the narrative service disabled
    pub api_key: Option<String>,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub sample_limit: usize,
    pub timeout_secs: u64,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-1.5-flash".to_string(),
            api_key: None,
            temperature: 1.0,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
            sample_limit: 50,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CrmConfig {
    pub fn load() -> ConfigResult<Self> {
        Self::load_from_path(DEFAULT_CONFIG_FILE)
    }

    // A missing file is not an error; defaults and environment still apply
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_toml(toml_str: &str) -> ConfigResult<Self> {
        Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str))
            .extract()
            .map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let narrative = &self.narrative;
        if !(0.0..=2.0).contains(&narrative.temperature) {
            return Err(invalid(
                "narrative.temperature",
                format!("value {} is out of range [0, 2]", narrative.temperature),
            ));
        }
        if !(0.0..=1.0).contains(&narrative.top_p) {
            return Err(invalid(
                "narrative.top_p",
                format!("value {} is out of range [0, 1]", narrative.top_p),
            ));
        }
        if narrative.top_k == 0 {
            return Err(invalid("narrative.top_k", "must be greater than 0".to_string()));
        }
        if narrative.max_output_tokens == 0 {
            return Err(invalid(
                "narrative.max_output_tokens",
                "must be greater than 0".to_string(),
            ));
        }
        if narrative.sample_limit == 0 {
            return Err(invalid("narrative.sample_limit", "must be greater than 0".to_string()));
        }
        if narrative.timeout_secs == 0 {
            return Err(invalid("narrative.timeout_secs", "must be greater than 0".to_string()));
        }
        if narrative.endpoint.trim().is_empty() {
            return Err(invalid("narrative.endpoint", "must not be empty".to_string()));
        }
        if self.dataset.max_bytes == 0 {
            return Err(invalid("dataset.max_bytes", "must be greater than 0".to_string()));
        }
        Ok(())
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions::from(&self.dataset)
    }
}

fn invalid(key: &str, message: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CrmConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.narrative.sample_limit, 50);
        assert_eq!(config.dataset.max_bytes, 10 * 1024 * 1024);
        assert!(config.narrative.api_key.is_none());
    }

    #[test]
    fn test_from_toml_overrides_defaults() {
        let config = CrmConfig::from_toml(
            r#"
            [narrative]
            model = "gemini-1.5-pro"
            temperature = 0.4
            sample_limit = 10

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.narrative.model, "gemini-1.5-pro");
        assert_eq!(config.narrative.temperature, 0.4);
        assert_eq!(config.narrative.sample_limit, 10);
        assert_eq!(config.narrative.top_k, 64);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.dataset.max_bytes, DEFAULT_MAX_BYTES);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = CrmConfig::from_toml("[narrative]\ntemperature = 3.5\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "narrative.temperature"
        ));

        let config = CrmConfig::from_toml("[narrative]\nsample_limit = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config = CrmConfig::from_toml("[narrative]\ntop_p = 1.5\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        assert!(matches!(
            CrmConfig::from_toml("[narrative\nmodel = "),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crm_lens.toml");
        std::fs::write(&path, "[dataset]\npath = \"data/crm.csv\"\nmax_bytes = 2048\n").unwrap();
        let config = CrmConfig::load_from_path(&path).unwrap();
        assert_eq!(config.dataset.path, Some(PathBuf::from("data/crm.csv")));
        assert_eq!(config.ingest_options().max_bytes, 2048);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CrmConfig::load_from_path(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.narrative.model, NarrativeConfig::default().model);
    }
}
