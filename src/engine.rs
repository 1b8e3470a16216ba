//! Prompt template engine.
//!
//! Renders the generation or regeneration template from a normalized input,
//! sends it to the configured [`LlmProvider`] and parses the reply against the
//! output schema `{code, explanation?}`. A call either yields a complete
//! [`GenerationResult`] or an [`EngineError`]; partial results never escape.

use std::sync::Arc;
use std::time::Instant;

use serde::Deserialize;

use crate::error::EngineError;
use crate::language::Language;
use crate::llm::{CompletionRequest, LlmProvider, Message};
use crate::metrics::MetricsCollector;
use crate::prompts::{
    GenerationPrompt, RegenerationPrompt, GENERATION_SYSTEM_PROMPT, REGENERATION_SYSTEM_PROMPT,
};
use crate::types::GenerationResult;
use crate::utils::code_fence::ensure_fenced;
use crate::utils::json_extraction::try_extract_json_object;

/// Default sampling temperature for solution generation.
pub const DEFAULT_TEMPERATURE: f64 = 0.2;

/// Default reply budget in tokens.
pub const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Problem context after validation and defaulting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationInput {
    pub problem_description: String,
    pub constraints: String,
    pub examples: String,
    pub language: Language,
    /// Validated image data URI.
    pub image_data_uri: Option<String>,
}

impl GenerationInput {
    pub fn new(problem_description: impl Into<String>, language: Language) -> Self {
        Self {
            problem_description: problem_description.into(),
            constraints: String::new(),
            examples: String::new(),
            language,
            image_data_uri: None,
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_data_uri.is_some()
    }
}

/// Debug context: the original problem plus the code and error to fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegenerationInput {
    pub problem: GenerationInput,
    pub previous_code: String,
    pub error_report: String,
}

/// Model call parameters.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Model identifier; empty uses the provider's default.
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Request `response_format: json_object` from the provider.
    pub json_mode: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            json_mode: true,
        }
    }
}

impl EngineSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets temperature, clamped to the provider range.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }
}

/// Which template a call used; also the metrics label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Template {
    Generation,
    Regeneration,
}

impl Template {
    fn name(self) -> &'static str {
        match self {
            Template::Generation => "generation",
            Template::Regeneration => "regeneration",
        }
    }

    fn explanation_required(self) -> bool {
        matches!(self, Template::Regeneration)
    }
}

/// Raw model reply before schema checks.
#[derive(Debug, Deserialize)]
struct ModelReply {
    code: String,
    #[serde(default)]
    explanation: Option<String>,
}

/// Renders prompt templates and invokes the model.
pub struct PromptEngine {
    provider: Arc<dyn LlmProvider>,
    settings: EngineSettings,
    metrics: MetricsCollector,
}

impl std::fmt::Debug for PromptEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl PromptEngine {
    pub fn new(provider: Arc<dyn LlmProvider>, settings: EngineSettings) -> Self {
        Self {
            provider,
            settings,
            metrics: MetricsCollector::new(),
        }
    }

    pub fn with_defaults(provider: Arc<dyn LlmProvider>) -> Self {
        Self::new(provider, EngineSettings::default())
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Produces a first solution for a problem.
    pub async fn generate_code(
        &self,
        input: &GenerationInput,
    ) -> Result<GenerationResult, EngineError> {
        let language = input.language;
        let prompt = GenerationPrompt {
            problem_description: &input.problem_description,
            constraints: &input.constraints,
            examples: &input.examples,
            language: language.display_name(),
            fence_tag: language.fence_tag(),
            has_image: input.has_image(),
        }
        .render()?;

        let messages = vec![
            Message::system(GENERATION_SYSTEM_PROMPT),
            user_message(prompt, input.image_data_uri.as_deref()),
        ];

        self.run(Template::Generation, messages, language).await
    }

    /// Produces a corrected solution for defective code.
    pub async fn regenerate_code(
        &self,
        input: &RegenerationInput,
    ) -> Result<GenerationResult, EngineError> {
        let problem = &input.problem;
        let language = problem.language;
        let prompt = RegenerationPrompt {
            problem_description: &problem.problem_description,
            constraints: &problem.constraints,
            examples: &problem.examples,
            language: language.display_name(),
            fence_tag: language.fence_tag(),
            has_image: problem.has_image(),
            previous_code: &input.previous_code,
            error_report: &input.error_report,
        }
        .render()?;

        let messages = vec![
            Message::system(REGENERATION_SYSTEM_PROMPT),
            user_message(prompt, problem.image_data_uri.as_deref()),
        ];

        self.run(Template::Regeneration, messages, language).await
    }

    async fn run(
        &self,
        template: Template,
        messages: Vec<Message>,
        language: Language,
    ) -> Result<GenerationResult, EngineError> {
        let mut request = CompletionRequest::new(self.settings.model.clone(), messages)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_tokens);
        if self.settings.json_mode {
            request = request.with_json_object();
        }

        tracing::debug!(
            template = template.name(),
            language = language.id(),
            "Sending prompt to model"
        );

        let in_flight = self.metrics.llm_call_started();
        let started = Instant::now();
        let outcome = self.provider.complete(request).await;
        let elapsed = started.elapsed().as_secs_f64();
        drop(in_flight);

        let response = match outcome {
            Ok(response) => {
                self.metrics
                    .llm_call_finished(template.name(), true, elapsed, Some(&response.usage));
                response
            }
            Err(e) => {
                self.metrics
                    .llm_call_finished(template.name(), false, elapsed, None);
                return Err(e.into());
            }
        };

        tracing::info!(
            template = template.name(),
            model = %response.model,
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            latency_secs = elapsed,
            "Model replied"
        );

        let content = response.first_content().ok_or(EngineError::EmptyResponse)?;
        parse_reply(content, language, template.explanation_required())
    }
}

fn user_message(prompt: String, image_data_uri: Option<&str>) -> Message {
    match image_data_uri {
        Some(uri) => Message::user_with_image(prompt, uri),
        None => Message::user(prompt),
    }
}

/// Validates a raw model reply against the output schema.
fn parse_reply(
    content: &str,
    language: Language,
    explanation_required: bool,
) -> Result<GenerationResult, EngineError> {
    let json = try_extract_json_object(content)
        .into_result()
        .map_err(|e| EngineError::MissingJson(e.to_string()))?;

    let reply: ModelReply = serde_json::from_str(&json)
        .map_err(|e| EngineError::SchemaMismatch(format!("Invalid JSON: {}", e)))?;

    if reply.code.trim().is_empty() {
        return Err(EngineError::SchemaMismatch("\"code\" is empty".to_string()));
    }

    let explanation = reply
        .explanation
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());
    if explanation_required && explanation.is_none() {
        return Err(EngineError::SchemaMismatch(
            "\"explanation\" is required".to_string(),
        ));
    }

    Ok(GenerationResult {
        code: ensure_fenced(reply.code.trim(), language.fence_tag()),
        explanation,
    })
}
