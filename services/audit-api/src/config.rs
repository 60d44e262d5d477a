//! Service configuration loading.
//!
//! Precedence: built-in defaults, then the optional YAML file, then
//! environment variables. The result is validated once at startup.

use std::path::Path;

use anyhow::{Context, Result};
use scene_store::SceneStoreConfig;
use serde::{Deserialize, Serialize};
use vegetation::{AnalysisConfig, RetryPolicy};

/// Everything the service reads at startup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub analysis: AnalysisConfig,
    pub retry: RetryPolicy,
    pub scene_store: SceneStoreConfig,
    pub geocoder: GeocoderConfig,
}

/// Nominatim-compatible geocoder settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Base URL of the search service.
    pub base_url: String,
    /// User-Agent sent with every request; Nominatim requires one.
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Resolved queries kept in memory.
    pub cache_entries: usize,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "terratime-audit/0.1".to_string(),
            timeout_secs: 10,
            cache_entries: 1024,
        }
    }
}

impl GeocoderConfig {
    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("GEOCODER_URL") {
            self.base_url = url;
        }
        if let Ok(agent) = std::env::var("GEOCODER_USER_AGENT") {
            self.user_agent = agent;
        }
        if let Ok(val) = std::env::var("GEOCODER_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.timeout_secs = secs;
            }
        }
        self
    }
}

impl ServiceConfig {
    /// Load from an optional YAML file, apply env overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        let config = config.with_env_overrides();

        config
            .analysis
            .validate()
            .context("Invalid analysis configuration")?;

        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse config: {:?}", path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    fn with_env_overrides(mut self) -> Self {
        self.analysis = self.analysis.with_env_overrides();
        self.geocoder = self.geocoder.with_env_overrides();
        if std::env::var("SCENE_STORE").is_ok() {
            self.scene_store = SceneStoreConfig::from_env();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_common::Persona;
    use std::io::Write;

    #[test]
    fn test_yaml_overrides_defaults() {
        let yaml = r#"
analysis:
  cloud_threshold_pct: 30.0
  noise_floor: 0.1
retry:
  max_retries: 5
scene_store:
  backend: local
  root: /var/lib/scenes
"#;
        let config = ServiceConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.analysis.cloud_threshold_pct, 30.0);
        assert_eq!(config.analysis.noise_floor, 0.1);
        assert_eq!(config.analysis.target_year.0, 2024);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.retry.initial_delay_ms, 500);
        assert_eq!(config.geocoder.timeout_secs, 10);
        assert!(config.analysis.policy(Persona::Scientist).is_ok());
    }

    #[test]
    fn test_load_rejects_invalid_analysis() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "analysis:\n  baseline_year: 2030\n  target_year: 2020").unwrap();
        let err = ServiceConfig::load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Invalid analysis configuration"));
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(ServiceConfig::load(Some(Path::new("/nonexistent/audit.yaml"))).is_err());
    }
}
