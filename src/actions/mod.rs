//! Action layer: the boundary between callers and the prompt engine.
//!
//! Both actions validate the request, apply defaults, make at most one model
//! call, and fold every outcome into an [`ActionResponse`]. Failures become
//! plain messages here; nothing structured crosses this boundary.

pub mod validation;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::engine::{EngineSettings, PromptEngine};
use crate::error::{LlmError, ValidationError, ValidationRule};
use crate::llm::LiteLlmClient;
use crate::metrics::{ActionOutcome, MetricsCollector};
use crate::types::{ActionResponse, GenerationRequest, RegenerationRequest};
use crate::utils::data_uri::DEFAULT_MAX_IMAGE_BYTES;

pub use validation::{
    has_problem, validate_generation, validate_regeneration, MAX_CODE_CHARS, MAX_PROBLEM_CHARS,
    MAX_TEXT_CHARS,
};

/// Returned when a request fails schema validation.
pub const INVALID_INPUT: &str = "Invalid input.";

/// Returned when a generation request has neither description nor image.
pub const MISSING_PROBLEM: &str = "Please provide a problem description or upload an image.";

/// Returned when `previousCode` is missing.
pub const MISSING_PREVIOUS_CODE: &str = "The code to debug is required.";

/// Returned when `errorReport` is missing.
pub const MISSING_ERROR_REPORT: &str = "Please describe the error you encountered.";

pub const GENERATE_FAILED: &str =
    "Failed to generate code. The AI model may be temporarily unavailable. Please try again later.";

pub const REGENERATE_FAILED: &str =
    "Failed to regenerate code. The AI model may be temporarily unavailable. Please try again later.";

/// Substituted for an empty problem description when debugging.
pub const FALLBACK_PROBLEM_DESCRIPTION: &str =
    "No original problem description was provided. Focus solely on fixing the reported error in the code.";

/// Picks the user-facing message for a regeneration validation failure.
fn regeneration_message(err: &ValidationError) -> &'static str {
    match (err.field, err.rule) {
        ("previousCode", ValidationRule::Required) => MISSING_PREVIOUS_CODE,
        ("errorReport", ValidationRule::Required) => MISSING_ERROR_REPORT,
        _ => INVALID_INPUT,
    }
}

/// The `generate` and `regenerate` operations.
///
/// Holds no per-request state; one instance is shared by every caller.
#[derive(Debug, Clone)]
pub struct CodeActions {
    engine: Arc<PromptEngine>,
    max_image_bytes: usize,
    metrics: MetricsCollector,
}

impl CodeActions {
    pub fn new(engine: Arc<PromptEngine>) -> Self {
        Self {
            engine,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
            metrics: MetricsCollector::new(),
        }
    }

    /// Wires an OpenAI-compatible client and engine from configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self, LlmError> {
        let client = LiteLlmClient::new(
            config.llm.api_base.clone(),
            config.llm.api_key.clone(),
            config.llm.model.clone(),
            config.llm.timeout(),
        )?;
        let settings = EngineSettings::new()
            .with_model(config.llm.model.clone())
            .with_temperature(config.llm.temperature)
            .with_max_tokens(config.llm.max_tokens)
            .with_json_mode(config.llm.json_mode);
        let engine = PromptEngine::new(Arc::new(client), settings);

        Ok(Self::new(Arc::new(engine)).with_max_image_bytes(config.limits.max_image_bytes))
    }

    /// Sets the decoded-size limit for `photoDataUri`.
    pub fn with_max_image_bytes(mut self, max_image_bytes: usize) -> Self {
        self.max_image_bytes = max_image_bytes;
        self
    }

    pub fn max_image_bytes(&self) -> usize {
        self.max_image_bytes
    }

    /// Generates a first solution.
    pub async fn generate(&self, request: &GenerationRequest) -> ActionResponse {
        let input = match validate_generation(request, self.max_image_bytes) {
            Ok(input) => input,
            Err(e) => {
                tracing::debug!(operation = "generate", field = e.field, error = %e, "Rejected request");
                self.metrics.record_action("generate", ActionOutcome::Invalid);
                return ActionResponse::err(INVALID_INPUT);
            }
        };

        if !has_problem(&input) {
            self.metrics.record_action("generate", ActionOutcome::Invalid);
            return ActionResponse::err(MISSING_PROBLEM);
        }

        tracing::info!(
            operation = "generate",
            language = input.language.id(),
            has_image = input.has_image(),
            "Generating code"
        );

        match self.engine.generate_code(&input).await {
            Ok(result) => {
                self.metrics.record_action("generate", ActionOutcome::Success);
                ActionResponse::ok(result)
            }
            Err(e) => {
                tracing::error!(operation = "generate", error = %e, "AI code generation failed");
                self.metrics.record_action("generate", ActionOutcome::Failed);
                ActionResponse::err(GENERATE_FAILED)
            }
        }
    }

    /// Produces a corrected solution for previously generated code.
    pub async fn regenerate(&self, request: &RegenerationRequest) -> ActionResponse {
        let mut input = match validate_regeneration(request, self.max_image_bytes) {
            Ok(input) => input,
            Err(e) => {
                tracing::debug!(operation = "regenerate", field = e.field, error = %e, "Rejected request");
                self.metrics.record_action("regenerate", ActionOutcome::Invalid);
                return ActionResponse::err(regeneration_message(&e));
            }
        };

        if input.problem.problem_description.trim().is_empty() {
            input.problem.problem_description = FALLBACK_PROBLEM_DESCRIPTION.to_string();
        }

        tracing::info!(
            operation = "regenerate",
            language = input.problem.language.id(),
            has_image = input.problem.has_image(),
            "Regenerating code"
        );

        match self.engine.regenerate_code(&input).await {
            Ok(result) => {
                self.metrics.record_action("regenerate", ActionOutcome::Success);
                ActionResponse::ok(result)
            }
            Err(e) => {
                tracing::error!(operation = "regenerate", error = %e, "AI code regeneration failed");
                self.metrics.record_action("regenerate", ActionOutcome::Failed);
                ActionResponse::err(REGENERATE_FAILED)
            }
        }
    }
}
