//! Debug prompt: previous code plus an error report in, corrected code out.

use serde::Serialize;

use super::render;

/// System prompt for defect correction.
pub const REGENERATION_SYSTEM_PROMPT: &str = "You are an expert software engineer who debugs and repairs solutions to data structures and algorithms problems. You reply with a single JSON object and nothing else.";

/// Tera template for the user turn of a regeneration request.
pub const REGENERATION_TEMPLATE: &str = r#"The code below was written for the problem described here, but it is defective. The user reported the error shown after the code.

**Original Problem Details:**

*   **Problem Description**: {{ problem_description }}
*   **Constraints**: {% if constraints %}{{ constraints }}{% else %}None given.{% endif %}
*   **Examples**: {% if examples %}{{ examples }}{% else %}None given.{% endif %}
*   **Programming Language**: {{ language }}{% if has_image %}
*   **Image**: the original problem statement is attached as an image. If it disagrees with the text, the image takes precedence.{% endif %}

**Defective Code:**
```{{ fence_tag }}
{{ previous_code }}
```

**Reported Error:**
{{ error_report }}

Follow these steps:
1.  **Diagnose**: Identify the root cause of the reported error. Check the logic against the problem statement, not only the symptom.
2.  **Fix**: Rewrite the solution so the error is gone and the code is correct for the whole problem, including edge cases implied by the constraints.
3.  **Verify**: Trace the original examples through the corrected code and confirm each produces the expected output.

**Instructions for Output:**
Respond with a JSON object with exactly these fields:
*   "code": the complete corrected solution as a single code block starting with ```{{ fence_tag }} and ending with ```.
*   "explanation": what was wrong, what you changed, and confirmation that the corrected code produces the expected output for the original examples.

Do not include text outside the JSON object."#;

/// Values substituted into [`REGENERATION_TEMPLATE`].
#[derive(Debug, Clone, Serialize)]
pub struct RegenerationPrompt<'a> {
    pub problem_description: &'a str,
    pub constraints: &'a str,
    pub examples: &'a str,
    pub language: &'a str,
    pub fence_tag: &'a str,
    pub has_image: bool,
    pub previous_code: &'a str,
    pub error_report: &'a str,
}

impl RegenerationPrompt<'_> {
    /// Renders the user prompt.
    pub fn render(&self) -> Result<String, tera::Error> {
        render(REGENERATION_TEMPLATE, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_code_and_error() {
        let prompt = RegenerationPrompt {
            problem_description: "Two sum",
            constraints: "",
            examples: "nums = [2,7,11,15], target = 9 -> [0,1]",
            language: "Python",
            fence_tag: "python",
            has_image: false,
            previous_code: "def two_sum(nums, t):\n    return [0, 0]",
            error_report: "Returns [0, 0] for every input",
        };
        let text = prompt.render().expect("render");

        assert!(text.contains("```python\ndef two_sum(nums, t):\n    return [0, 0]\n```"));
        assert!(text.contains("Returns [0, 0] for every input"));
        assert!(text.contains("nums = [2,7,11,15], target = 9 -> [0,1]"));
        assert!(text.contains("**Constraints**: None given."));
        assert!(!text.contains("**Image**"));
    }
}
