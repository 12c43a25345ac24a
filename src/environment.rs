// src/environment.rs
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ip-api.com/json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub port: u16,
    pub gemini: GeminiConfig,
    pub location: LocationConfig,
    pub apply: ApplyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Never read from the config file, only from the process environment
    #[serde(skip)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSourceKind {
    Static,
    Ip,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub source: PositionSourceKind,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub ip_lookup_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplyConfig {
    pub send_delay_ms: u64,
    pub success_reset_ms: u64,
    pub error_reset_ms: u64,
    pub success_rate: f64,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    local: Option<AppConfig>,
    #[serde(default)]
    production: Option<AppConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            gemini: GeminiConfig::default(),
            location: LocationConfig::default(),
            apply: ApplyConfig::default(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEMINI_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout_seconds: 60,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            source: PositionSourceKind::Ip,
            latitude: None,
            longitude: None,
            ip_lookup_url: DEFAULT_IP_LOOKUP_URL.to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for ApplyConfig {
    fn default() -> Self {
        Self {
            send_delay_ms: 1500,
            success_reset_ms: 1500,
            error_reset_ms: 2000,
            success_rate: 0.95,
        }
    }
}

impl ApplyConfig {
    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.send_delay_ms)
    }

    pub fn success_reset(&self) -> Duration {
        Duration::from_millis(self.success_reset_ms)
    }

    pub fn error_reset(&self) -> Duration {
        Duration::from_millis(self.error_reset_ms)
    }
}

impl AppConfig {
    /// Load `config.yaml` for the current environment, then apply env overrides.
    /// Missing file means built-in defaults.
    pub fn load() -> Result<Self> {
        let environment = Self::get_environment();
        info!("Loading configuration for environment: {}", environment);

        let mut config = Self::load_from_file(&PathBuf::from("config.yaml"), &environment)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn get_environment() -> String {
        std::env::var("ISBUL_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    fn load_from_file(path: &Path, environment: &str) -> Result<Self> {
        if !path.exists() {
            info!("{} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_yaml_str(&content, environment)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml_str(content: &str, environment: &str) -> Result<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(content)?;

        let section = match environment {
            "production" => config_file.production,
            _ => config_file.local,
        };

        Ok(section.unwrap_or_default())
    }

    /// Overlay process configuration; `lookup` is `std::env::var` outside tests
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("API_KEY").or_else(|| lookup("GEMINI_API_KEY"));
        self.gemini.api_key = api_key.filter(|key| !key.trim().is_empty());

        if let Some(url) = lookup("GEMINI_API_URL") {
            self.gemini.base_url = url;
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(port) = lookup("ROCKET_PORT") {
            self.port = port
                .parse::<u16>()
                .context("ROCKET_PORT must be a valid port number")?;
        }

        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        self.gemini.api_key.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const YAML: &str = r#"
local:
  port: 9000
  location:
    source: static
    latitude: 41.0
    longitude: 29.0
production:
  gemini:
    model: gemini-2.5-pro
  location:
    source: none
"#;

    #[test]
    fn test_sections_by_environment() {
        let local = AppConfig::from_yaml_str(YAML, "local").unwrap();
        assert_eq!(local.port, 9000);
        assert_eq!(local.location.source, PositionSourceKind::Static);
        assert_eq!(local.location.latitude, Some(41.0));
        assert_eq!(local.gemini.model, DEFAULT_GEMINI_MODEL);

        let production = AppConfig::from_yaml_str(YAML, "production").unwrap();
        assert_eq!(production.port, 8000);
        assert_eq!(production.gemini.model, "gemini-2.5-pro");
        assert_eq!(production.location.source, PositionSourceKind::None);
    }

    #[test]
    fn test_missing_section_uses_defaults() {
        let config = AppConfig::from_yaml_str("local:\n  port: 1\n", "production").unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.apply.success_rate, 0.95);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-test"),
            ("ROCKET_PORT", "8123"),
        ]);

        let mut config = AppConfig::default();
        config
            .apply_env_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.gemini.api_key.as_deref(), Some("secret"));
        assert_eq!(config.gemini.model, "gemini-test");
        assert_eq!(config.port, 8123);
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(|key| (key == "API_KEY").then(|| "  ".to_string()))
            .unwrap();
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut config = AppConfig::default();
        let result =
            config.apply_env_overrides(|key| (key == "ROCKET_PORT").then(|| "abc".to_string()));
        assert!(result.is_err());
    }
}
