//! dsa-coder: LLM-backed solution generator for data structures and
//! algorithms problems.
//!
//! A problem statement (text and/or an image) goes through an action layer
//! that validates it, a prompt engine that renders a template and calls an
//! OpenAI-compatible model, and comes back as code plus an explanation. A
//! debug path sends generated code and a reported error back for a fix.

// Core modules
pub mod actions;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod language;
pub mod llm;
pub mod metrics;
pub mod prompts;
pub mod server;
pub mod session;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use actions::CodeActions;
pub use config::AppConfig;
pub use engine::{EngineSettings, PromptEngine};
pub use error::{
    ConfigError, EngineError, ImageError, LlmError, SessionError, ValidationError, ValidationRule,
};
pub use language::Language;
pub use session::Workbench;
pub use types::{ActionResponse, GenerationRequest, GenerationResult, RegenerationRequest};
