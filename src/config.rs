//! Service configuration.
//!
//! Values are layered: built-in defaults, then an optional YAML file, then
//! environment variables, then command-line flags (applied by the CLI).
//!
//! ```yaml
//! server:
//!   host: 127.0.0.1
//!   port: 8080
//! llm:
//!   model: google/gemini-2.0-flash-001
//!   temperature: 0.1
//! limits:
//!   max_image_bytes: 2097152
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::engine::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use crate::error::ConfigError;
use crate::llm::{DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS};
use crate::utils::data_uri::DEFAULT_MAX_IMAGE_BYTES;

/// Prefix for service-specific environment variables.
pub const ENV_PREFIX: &str = "DSA_CODER_";

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    /// `host:port`, suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Model provider settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_base: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    /// Ask the provider for `response_format: json_object`.
    pub json_mode: bool,
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .field("json_mode", &self.json_mode)
            .finish()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            json_mode: true,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Request size limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest accepted image, in decoded bytes.
    pub max_image_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub limits: LimitsConfig,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Reads a YAML file. Missing keys keep their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Full load: optional file, then environment, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlays values from `lookup`.
    ///
    /// `DSA_CODER_*` variables take precedence over the shared `LITELLM_*`
    /// ones.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(val) = var("HOST") {
            self.server.host = val;
        }
        if let Some(val) = var("PORT") {
            self.server.port = parse_env_value(&val, "DSA_CODER_PORT")?;
        }

        if let Some(val) = var("API_BASE").or_else(|| lookup("LITELLM_API_BASE")) {
            self.llm.api_base = val;
        }
        if let Some(val) = var("API_KEY")
            .or_else(|| lookup("LITELLM_API_KEY"))
            .filter(|v| !v.is_empty())
        {
            self.llm.api_key = Some(val);
        }
        if let Some(val) = var("MODEL").or_else(|| lookup("LITELLM_DEFAULT_MODEL")) {
            self.llm.model = val;
        }
        if let Some(val) = var("TEMPERATURE") {
            self.llm.temperature = parse_env_value(&val, "DSA_CODER_TEMPERATURE")?;
        }
        if let Some(val) = var("MAX_TOKENS") {
            self.llm.max_tokens = parse_env_value(&val, "DSA_CODER_MAX_TOKENS")?;
        }
        if let Some(val) = var("TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_env_value(&val, "DSA_CODER_TIMEOUT_SECS")?;
        }
        if let Some(val) = var("JSON_MODE") {
            self.llm.json_mode = parse_env_bool(&val, "DSA_CODER_JSON_MODE")?;
        }

        if let Some(val) = var("MAX_IMAGE_BYTES") {
            self.limits.max_image_bytes = parse_env_value(&val, "DSA_CODER_MAX_IMAGE_BYTES")?;
        }

        Ok(())
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "server.host cannot be empty".to_string(),
            ));
        }

        if !self.llm.api_base.starts_with("http://") && !self.llm.api_base.starts_with("https://")
        {
            return Err(ConfigError::ValidationFailed(format!(
                "llm.api_base must be an http(s) URL, got '{}'",
                self.llm.api_base
            )));
        }

        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "llm.model cannot be empty".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::ValidationFailed(
                "llm.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(ConfigError::ValidationFailed(
                "llm.max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "llm.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.limits.max_image_bytes == 0 {
            return Err(ConfigError::ValidationFailed(
                "limits.max_image_bytes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.server.port = port;
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.llm.api_base = api_base.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.llm.api_key = Some(api_key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.llm.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.llm.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.llm.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.llm.timeout_secs = timeout_secs;
        self
    }

    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.llm.json_mode = json_mode;
        self
    }

    pub fn with_max_image_bytes(mut self, max_image_bytes: usize) -> Self {
        self.limits.max_image_bytes = max_image_bytes;
        self
    }
}

/// Parse an environment variable value into a type.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("could not parse '{}'", value),
    })
}

/// Parse an environment variable as a boolean.
fn parse_env_bool(value: &str, key: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected boolean value, got '{}'", value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.llm.api_base, DEFAULT_API_BASE);
        assert!(config.llm.api_key.is_none());
        assert!((config.llm.temperature - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.llm.timeout(), Duration::from_secs(120));
        assert_eq!(config.limits.max_image_bytes, 4 * 1024 * 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("DSA_CODER_PORT", "8080"),
                ("DSA_CODER_MODEL", "openai/gpt-4o-mini"),
                ("LITELLM_DEFAULT_MODEL", "ignored"),
                ("LITELLM_API_BASE", "http://localhost:4000"),
                ("LITELLM_API_KEY", "sk-test"),
                ("DSA_CODER_JSON_MODE", "off"),
            ]))
            .expect("valid env");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.llm.model, "openai/gpt-4o-mini");
        assert_eq!(config.llm.api_base, "http://localhost:4000");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert!(!config.llm.json_mode);
    }

    #[test]
    fn test_env_parse_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env(&[("DSA_CODER_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "DSA_CODER_PORT"));
    }

    #[test]
    fn test_yaml_partial_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "server:\n  port: 9090\nllm:\n  temperature: 0.5").expect("write");

        let config = AppConfig::from_yaml_file(file.path()).expect("parse");
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!((config.llm.temperature - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.llm.max_tokens, DEFAULT_MAX_TOKENS);
    }

    #[test]
    fn test_yaml_empty_is_default() {
        assert_eq!(AppConfig::from_yaml_str("  \n").expect("parse"), AppConfig::default());
    }

    #[test]
    fn test_validation_failures() {
        assert!(AppConfig::default().with_temperature(3.0).validate().is_err());
        assert!(AppConfig::default().with_api_base("localhost:4000").validate().is_err());
        assert!(AppConfig::default().with_model(" ").validate().is_err());
        assert!(AppConfig::default().with_max_tokens(0).validate().is_err());
        assert!(AppConfig::default().with_timeout_secs(0).validate().is_err());
        assert!(AppConfig::default().with_max_image_bytes(0).validate().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = AppConfig::default().with_api_key("sk-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
