//! Wire types shared by the action layer, the HTTP service and the CLI.
//!
//! All request and response bodies use camelCase field names. Every request
//! field is optional at the wire level; the action layer decides which ones
//! are required.

use serde::{Deserialize, Serialize};

/// Input for a first-generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Problem statement. Required unless `photo_data_uri` is supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_inputs_outputs: Option<String>,
    /// Language id such as `python` or `cpp`. Defaults to Python.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// `data:<image mime>;base64,<payload>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_data_uri: Option<String>,
}

impl GenerationRequest {
    pub fn new(problem_description: impl Into<String>) -> Self {
        Self {
            problem_description: Some(problem_description.into()),
            ..Self::default()
        }
    }

    pub fn with_constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = Some(constraints.into());
        self
    }

    pub fn with_examples(mut self, examples: impl Into<String>) -> Self {
        self.example_inputs_outputs = Some(examples.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_photo_data_uri(mut self, uri: impl Into<String>) -> Self {
        self.photo_data_uri = Some(uri.into());
        self
    }
}

/// Input for a debug request: the original problem plus the defective code
/// and the error the user saw.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegenerationRequest {
    #[serde(flatten)]
    pub problem: GenerationRequest,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_report: Option<String>,
}

impl RegenerationRequest {
    pub fn new(
        problem: GenerationRequest,
        previous_code: impl Into<String>,
        error_report: impl Into<String>,
    ) -> Self {
        Self {
            problem,
            previous_code: Some(previous_code.into()),
            error_report: Some(error_report.into()),
        }
    }
}

/// Code and explanation returned by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// A single fenced code block in the requested language.
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Uniform result of an action: exactly one of `data` and `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub data: Option<GenerationResult>,
    pub error: Option<String>,
}

impl ActionResponse {
    pub fn ok(result: GenerationResult) -> Self {
        Self {
            data: Some(result),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.data.is_some()
    }

    /// Converts into a `Result`, treating a missing payload as an error.
    pub fn into_result(self) -> Result<GenerationResult, String> {
        match (self.data, self.error) {
            (Some(data), _) => Ok(data),
            (None, Some(error)) => Err(error),
            (None, None) => Err("Empty response".to_string()),
        }
    }
}

/// Entry in the language catalogue served to the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    pub id: String,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_request_uses_camel_case() {
        let request = GenerationRequest::new("Two sum")
            .with_examples("[2,7] 9 -> [0,1]")
            .with_language("python");
        let json = serde_json::to_value(&request).expect("serialize");

        assert_eq!(json["problemDescription"], "Two sum");
        assert_eq!(json["exampleInputsOutputs"], "[2,7] 9 -> [0,1]");
        assert!(json.get("photoDataUri").is_none());
    }

    #[test]
    fn test_regeneration_request_is_flat() {
        let json = r#"{
            "problemDescription": "Two sum",
            "language": "java",
            "previousCode": "class A {}",
            "errorReport": "does not compile"
        }"#;
        let request: RegenerationRequest = serde_json::from_str(json).expect("deserialize");

        assert_eq!(request.problem.problem_description.as_deref(), Some("Two sum"));
        assert_eq!(request.problem.language.as_deref(), Some("java"));
        assert_eq!(request.previous_code.as_deref(), Some("class A {}"));
        assert_eq!(request.error_report.as_deref(), Some("does not compile"));
    }

    #[test]
    fn test_missing_and_null_fields_deserialize_as_none() {
        let request: GenerationRequest =
            serde_json::from_str(r#"{"constraints": null}"#).expect("deserialize");
        assert_eq!(request, GenerationRequest::default());
    }

    #[test]
    fn test_action_response_serializes_both_keys() {
        let json = serde_json::to_value(ActionResponse::err("Invalid input.")).expect("serialize");
        assert_eq!(json["error"], "Invalid input.");
        assert!(json["data"].is_null());

        let ok = ActionResponse::ok(GenerationResult {
            code: "```python\npass\n```".to_string(),
            explanation: None,
        });
        assert!(ok.is_ok());
        assert_eq!(ok.into_result().map(|r| r.code).as_deref(), Ok("```python\npass\n```"));
    }
}
