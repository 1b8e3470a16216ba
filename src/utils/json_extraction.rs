//! JSON extraction utilities for parsing LLM responses.
//!
//! Models asked for a JSON object do not always return a bare object: some
//! wrap it in a markdown code block, some prepend a sentence. Extraction tries,
//! in order:
//! 1. Direct JSON (content starts with '{')
//! 2. JSON inside a ```json code block
//! 3. JSON inside a generic ``` code block
//! 4. The first balanced `{...}` anywhere in the content
//!
//! # Example
//!
//! ```
//! use dsa_coder::utils::json_extraction::try_extract_json_object;
//!
//! let response = "Sure! {\"code\": \"print(1)\"}";
//! let json = try_extract_json_object(response).into_result().unwrap();
//! assert_eq!(json, "{\"code\": \"print(1)\"}");
//! ```

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Error type for JSON extraction failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum JsonExtractionError {
    #[error("JSON appears truncated: {unclosed_braces} unclosed braces. Partial: {partial_preview}...")]
    Truncated {
        partial_preview: String,
        unclosed_braces: usize,
    },
    #[error("No JSON object found in response. Content starts with: '{content_preview}'")]
    NotFound { content_preview: String },
}

/// Result of a JSON extraction attempt
#[derive(Debug, Clone, PartialEq)]
pub enum JsonExtractionResult {
    /// A complete, balanced JSON object
    Success(String),
    /// An object was started but never closed (usually a length cut-off)
    Truncated {
        partial_json: String,
        unclosed_braces: usize,
    },
    NotFound { content_preview: String },
}

impl JsonExtractionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, JsonExtractionResult::Success(_))
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, JsonExtractionResult::Truncated { .. })
    }

    /// Converts the result to a Result with a descriptive error
    pub fn into_result(self) -> Result<String, JsonExtractionError> {
        match self {
            JsonExtractionResult::Success(json) => Ok(json),
            JsonExtractionResult::Truncated {
                partial_json,
                unclosed_braces,
            } => Err(JsonExtractionError::Truncated {
                partial_preview: preview(&partial_json, 100),
                unclosed_braces,
            }),
            JsonExtractionResult::NotFound { content_preview } => {
                Err(JsonExtractionError::NotFound { content_preview })
            }
        }
    }
}

/// Returns at most `max_chars` characters of `s`, never splitting a char.
fn preview(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

fn json_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)```(?:json|JSON)[ \t]*\r?\n(.*?)```").expect("static regex is valid")
    })
}

fn generic_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```[^\n]*\r?\n(.*?)```").expect("static regex is valid"))
}

/// Finds the byte index of the brace closing the object that opens at `start`.
///
/// String literals (including escaped quotes) are skipped, so braces inside
/// code strings do not confuse the depth count.
pub fn find_matching_brace(s: &str, start: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.get(start) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match b {
            b'\\' if in_string => escape_next = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Counts braces left open at the end of `s`, ignoring string contents.
fn unclosed_braces(s: &str) -> usize {
    let mut depth: isize = 0;
    let mut in_string = false;
    let mut escape_next = false;
    for c in s.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => depth -= 1,
            _ => {}
        }
    }
    depth.max(0) as usize
}

/// Extracts the first balanced object from `s`, if any.
fn first_balanced_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    let end = find_matching_brace(s, start)?;
    Some(&s[start..=end])
}

/// Extracts a JSON object from an LLM response.
pub fn try_extract_json_object(content: &str) -> JsonExtractionResult {
    let trimmed = content.trim();

    if trimmed.starts_with('{') {
        if let Some(obj) = first_balanced_object(trimmed) {
            return JsonExtractionResult::Success(obj.to_string());
        }
    }

    for re in [json_block_regex(), generic_block_regex()] {
        if let Some(caps) = re.captures(trimmed) {
            if let Some(obj) = caps.get(1).and_then(|m| first_balanced_object(m.as_str())) {
                return JsonExtractionResult::Success(obj.trim().to_string());
            }
        }
    }

    if let Some(obj) = first_balanced_object(trimmed) {
        return JsonExtractionResult::Success(obj.to_string());
    }

    if let Some(start) = trimmed.find('{') {
        let partial = &trimmed[start..];
        let open = unclosed_braces(partial);
        if open > 0 {
            return JsonExtractionResult::Truncated {
                partial_json: partial.to_string(),
                unclosed_braces: open,
            };
        }
    }

    JsonExtractionResult::NotFound {
        content_preview: preview(trimmed, 50),
    }
}
