//! The in-flight gauge must return to zero when a model call is abandoned.
//!
//! Kept in its own test binary: the gauge is process-global, and other tests
//! running model calls in parallel would move it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dsa_coder::engine::GenerationInput;
use dsa_coder::llm::{CompletionRequest, CompletionResponse, LlmProvider};
use dsa_coder::metrics::{init_metrics, LLM_IN_FLIGHT};
use dsa_coder::{Language, LlmError, PromptEngine};

/// A provider whose reply never arrives.
struct StalledProvider;

#[async_trait]
impl LlmProvider for StalledProvider {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        std::future::pending().await
    }
}

#[tokio::test]
async fn cancelled_call_leaves_no_request_in_flight() {
    init_metrics().expect("metrics init");
    let gauge = LLM_IN_FLIGHT.get().expect("gauge registered");

    let engine = PromptEngine::with_defaults(Arc::new(StalledProvider));
    let input = GenerationInput::new("Reverse a linked list.", Language::Python);

    let outcome = tokio::time::timeout(Duration::from_millis(50), engine.generate_code(&input)).await;

    assert!(outcome.is_err(), "stalled call should time out");
    assert_eq!(gauge.get(), 0.0);
}
