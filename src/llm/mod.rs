//! LLM integration for dsa-coder.
//!
//! A single OpenAI-compatible client sits behind the [`LlmProvider`] trait so
//! the prompt engine can be driven by a scripted provider in tests.
//!
//! ```ignore
//! use dsa_coder::llm::{CompletionRequest, LiteLlmClient, LlmProvider, Message};
//!
//! let client = LiteLlmClient::new_with_defaults(api_key)?;
//! let request = CompletionRequest::new("", vec![Message::user("Hello")]);
//! let response = client.complete(request).await?;
//! ```

pub mod litellm;

pub use litellm::{
    Choice, CompletionRequest, CompletionResponse, ContentPart, ImageUrl, LiteLlmClient,
    LlmProvider, Message, MessageContent, ResponseFormat, Usage, DEFAULT_API_BASE, DEFAULT_MODEL,
    DEFAULT_TIMEOUT_SECS,
};
