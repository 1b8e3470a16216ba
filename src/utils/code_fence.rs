//! Markdown code fence handling for displayed solutions.
//!
//! The model is told to wrap its solution in a fence tagged with the language
//! (```` ```python ````). Display strips one leading fence line and one
//! trailing fence; anything that does not look like a fence is left alone.

use regex::Regex;
use std::sync::OnceLock;

fn leading_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*```[\w+#.-]*[ \t]*\r?\n").expect("static regex is valid"))
}

fn trailing_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:\r?\n)?```\s*$").expect("static regex is valid"))
}

/// Removes a leading fence-plus-language-tag line and a trailing fence.
///
/// The two ends are handled independently, so a reply that only opens a fence
/// still loses its opening line. Text without fences is returned unchanged.
pub fn strip_code_fence(code: &str) -> String {
    let without_head = leading_fence().replace(code, "");
    trailing_fence().replace(&without_head, "").into_owned()
}

/// Wraps `code` in a fence tagged with `tag`, unless it is already fenced.
pub fn ensure_fenced(code: &str, tag: &str) -> String {
    if code.trim_start().starts_with("```") {
        code.to_string()
    } else {
        format!("```{}\n{}\n```", tag, code.trim_end())
    }
}
