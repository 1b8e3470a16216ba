//! Error types for dsa-coder operations.
//!
//! Defines error types for the major subsystems:
//! - LLM API interactions
//! - Prompt rendering and model reply parsing
//! - Request validation at the action boundary
//! - Image and data URI handling
//! - Configuration loading
//! - Workbench (form state) transitions

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },
}

/// Errors raised by the prompt template engine.
///
/// The engine never returns a partially populated result; every way a model
/// call can go wrong ends up as one of these.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Prompt rendering failed: {0}")]
    Render(#[from] tera::Error),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Model returned no content")]
    EmptyResponse,

    #[error("Model reply does not contain a JSON object: {0}")]
    MissingJson(String),

    #[error("Model reply does not match the output schema: {0}")]
    SchemaMismatch(String),
}

/// Which schema rule a field broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationRule {
    /// Missing or blank.
    Required,
    /// Longer than the field's limit.
    TooLong,
    /// Present but not an acceptable value.
    Malformed,
}

/// A request field that failed schema validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Wire name of the offending field (camelCase).
    pub field: &'static str,
    pub rule: ValidationRule,
    /// Human-readable reason.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, rule: ValidationRule, message: impl Into<String>) -> Self {
        Self {
            field,
            rule,
            message: message.into(),
        }
    }

    pub fn required(field: &'static str) -> Self {
        Self::new(field, ValidationRule::Required, "is required")
    }
}

/// Errors that can occur while encoding or decoding images.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Not a data URI")]
    NotDataUri,

    #[error("Data URI must be base64 encoded")]
    NotBase64,

    #[error("Unsupported media type '{0}': only images are accepted")]
    UnsupportedMediaType(String),

    #[error("Image is too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },

    #[error("Invalid base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Cannot determine image type for '{0}'")]
    UnknownExtension(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors returned by workbench transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("A request is already in flight")]
    Busy,

    #[error("There is no generated code to debug yet")]
    NothingToDebug,

    #[error("{0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::required("errorReport");
        assert_eq!(err.to_string(), "errorReport: is required");
        assert_eq!(err.rule, ValidationRule::Required);
    }

    #[test]
    fn test_engine_error_from_llm_error() {
        let err: EngineError = LlmError::RateLimited("slow down".to_string()).into();
        assert!(matches!(err, EngineError::Llm(LlmError::RateLimited(_))));
        assert!(err.to_string().contains("slow down"));
    }

    #[test]
    fn test_image_too_large_message() {
        let err = ImageError::TooLarge {
            size: 10,
            limit: 5,
        };
        assert_eq!(
            err.to_string(),
            "Image is too large: 10 bytes exceeds the 5 byte limit"
        );
    }
}
