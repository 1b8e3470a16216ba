//! Schema checks for action requests.
//!
//! Checks run in field declaration order and stop at the first failure, so
//! the caller can pick a message from the offending field.

use crate::engine::{GenerationInput, RegenerationInput};
use crate::error::{ValidationError, ValidationRule};
use crate::language::Language;
use crate::types::{GenerationRequest, RegenerationRequest};
use crate::utils::data_uri::validate_image_data_uri;

/// Maximum characters in `problemDescription`.
pub const MAX_PROBLEM_CHARS: usize = 20_000;

/// Maximum characters in `previousCode`.
pub const MAX_CODE_CHARS: usize = 100_000;

/// Maximum characters in the remaining text fields.
pub const MAX_TEXT_CHARS: usize = 10_000;

/// Returns the field value, or empty when absent.
fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

fn check_length(field: &'static str, value: &str, max_chars: usize) -> Result<(), ValidationError> {
    let count = value.chars().count();
    if count > max_chars {
        return Err(ValidationError::new(
            field,
            ValidationRule::TooLong,
            format!("{} characters exceeds the {} character limit", count, max_chars),
        ));
    }
    Ok(())
}

fn check_required(field: &'static str, value: &str, max_chars: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    check_length(field, value, max_chars)
}

/// Parses `language`, defaulting to Python when absent or blank.
fn parse_language(value: &str) -> Result<Language, ValidationError> {
    if value.trim().is_empty() {
        return Ok(Language::default());
    }
    value
        .parse()
        .map_err(|e: String| ValidationError::new("language", ValidationRule::Malformed, e))
}

/// Checks `photoDataUri`; blank means no image.
fn check_image(value: &str, max_image_bytes: usize) -> Result<Option<String>, ValidationError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    validate_image_data_uri(value, max_image_bytes).map_err(|e| {
        ValidationError::new("photoDataUri", ValidationRule::Malformed, e.to_string())
    })?;
    Ok(Some(value.trim().to_string()))
}

/// Validates a generation request and applies defaults.
///
/// Does not enforce the description-or-image rule; see [`has_problem`].
pub fn validate_generation(
    request: &GenerationRequest,
    max_image_bytes: usize,
) -> Result<GenerationInput, ValidationError> {
    let problem_description = text(&request.problem_description);
    check_length("problemDescription", problem_description, MAX_PROBLEM_CHARS)?;

    let constraints = text(&request.constraints);
    check_length("constraints", constraints, MAX_TEXT_CHARS)?;

    let examples = text(&request.example_inputs_outputs);
    check_length("exampleInputsOutputs", examples, MAX_TEXT_CHARS)?;

    let language = parse_language(text(&request.language))?;
    let image_data_uri = check_image(text(&request.photo_data_uri), max_image_bytes)?;

    Ok(GenerationInput {
        problem_description: problem_description.to_string(),
        constraints: constraints.to_string(),
        examples: examples.to_string(),
        language,
        image_data_uri,
    })
}

/// Validates a regeneration request. The problem description may be empty.
pub fn validate_regeneration(
    request: &RegenerationRequest,
    max_image_bytes: usize,
) -> Result<RegenerationInput, ValidationError> {
    let problem = validate_generation(&request.problem, max_image_bytes)?;

    let previous_code = text(&request.previous_code);
    check_required("previousCode", previous_code, MAX_CODE_CHARS)?;

    let error_report = text(&request.error_report);
    check_required("errorReport", error_report, MAX_TEXT_CHARS)?;

    Ok(RegenerationInput {
        problem,
        previous_code: previous_code.to_string(),
        error_report: error_report.to_string(),
    })
}

/// True when the input carries a non-blank description or an image.
pub fn has_problem(input: &GenerationInput) -> bool {
    !input.problem_description.trim().is_empty() || input.image_data_uri.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::data_uri::{encode_data_uri, DEFAULT_MAX_IMAGE_BYTES};

    #[test]
    fn test_defaults_are_applied() {
        let input = validate_generation(&GenerationRequest::new("Two sum"), DEFAULT_MAX_IMAGE_BYTES)
            .expect("valid");
        assert_eq!(input.language, Language::Python);
        assert_eq!(input.constraints, "");
        assert_eq!(input.examples, "");
        assert!(input.image_data_uri.is_none());
    }

    #[test]
    fn test_unknown_language_is_rejected() {
        let request = GenerationRequest::new("Two sum").with_language("cobol");
        let err = validate_generation(&request, DEFAULT_MAX_IMAGE_BYTES).unwrap_err();
        assert_eq!(err.field, "language");
        assert_eq!(err.rule, ValidationRule::Malformed);
    }

    #[test]
    fn test_length_limits_count_characters() {
        let at_limit = "é".repeat(MAX_PROBLEM_CHARS);
        assert!(validate_generation(&GenerationRequest::new(at_limit), DEFAULT_MAX_IMAGE_BYTES).is_ok());

        let request = GenerationRequest::new("x").with_constraints("c".repeat(MAX_TEXT_CHARS + 1));
        let err = validate_generation(&request, DEFAULT_MAX_IMAGE_BYTES).unwrap_err();
        assert_eq!(err.field, "constraints");
        assert_eq!(err.rule, ValidationRule::TooLong);
    }

    #[test]
    fn test_image_checks() {
        let png = encode_data_uri("image/png", &[0x89, b'P', b'N', b'G']);
        let input = validate_generation(
            &GenerationRequest::default().with_photo_data_uri(png.clone()),
            DEFAULT_MAX_IMAGE_BYTES,
        )
        .expect("valid");
        assert_eq!(input.image_data_uri.as_deref(), Some(png.as_str()));
        assert!(has_problem(&input));

        let err = validate_generation(
            &GenerationRequest::default().with_photo_data_uri(png),
            2,
        )
        .unwrap_err();
        assert_eq!(err.field, "photoDataUri");

        let text_uri = encode_data_uri("text/plain", b"hello");
        let err = validate_generation(
            &GenerationRequest::default().with_photo_data_uri(text_uri),
            DEFAULT_MAX_IMAGE_BYTES,
        )
        .unwrap_err();
        assert_eq!(err.field, "photoDataUri");
    }

    #[test]
    fn test_has_problem_ignores_whitespace() {
        let input = validate_generation(&GenerationRequest::new("  \n "), DEFAULT_MAX_IMAGE_BYTES)
            .expect("valid");
        assert!(!has_problem(&input));
    }

    #[test]
    fn test_regeneration_reports_first_missing_field() {
        let request = RegenerationRequest {
            problem: GenerationRequest::new("Two sum"),
            previous_code: None,
            error_report: None,
        };
        let err = validate_regeneration(&request, DEFAULT_MAX_IMAGE_BYTES).unwrap_err();
        assert_eq!(err.field, "previousCode");
        assert_eq!(err.rule, ValidationRule::Required);

        let request = RegenerationRequest {
            problem: GenerationRequest::default(),
            previous_code: Some("print(1)".to_string()),
            error_report: Some("   ".to_string()),
        };
        let err = validate_regeneration(&request, DEFAULT_MAX_IMAGE_BYTES).unwrap_err();
        assert_eq!(err.field, "errorReport");
    }

    #[test]
    fn test_regeneration_allows_empty_description() {
        let request = RegenerationRequest::new(GenerationRequest::default(), "print(1)", "prints 1");
        let input = validate_regeneration(&request, DEFAULT_MAX_IMAGE_BYTES).expect("valid");
        assert_eq!(input.problem.problem_description, "");
        assert_eq!(input.previous_code, "print(1)");
    }
}
