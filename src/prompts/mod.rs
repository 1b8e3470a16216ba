//! Prompt templates for solution generation and debugging.
//!
//! Each template is a Tera string rendered from a small serializable context.
//! Rendering has autoescaping off: problem text and code go to the model
//! verbatim.
//!
//! - [`generation`] - first solution for a problem statement
//! - [`regeneration`] - corrected solution for defective code plus an error report

pub mod generation;
pub mod regeneration;

pub use generation::{GenerationPrompt, GENERATION_SYSTEM_PROMPT, GENERATION_TEMPLATE};
pub use regeneration::{RegenerationPrompt, REGENERATION_SYSTEM_PROMPT, REGENERATION_TEMPLATE};

use serde::Serialize;
use tera::{Context, Tera};

/// Renders a one-off Tera template from a serializable context.
pub(crate) fn render<T: Serialize>(template: &str, values: &T) -> Result<String, tera::Error> {
    let context = Context::from_serialize(values)?;
    Tera::one_off(template, &context, false)
}
