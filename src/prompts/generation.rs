//! First-generation prompt: problem statement in, one runnable solution out.

use serde::Serialize;

use super::render;

/// System prompt for solution generation.
pub const GENERATION_SYSTEM_PROMPT: &str = "You are an expert competitive programmer and software engineer specializing in data structures and algorithms. You reply with a single JSON object and nothing else.";

/// Tera template for the user turn of a generation request.
pub const GENERATION_TEMPLATE: &str = r#"Your task is to generate a correct and efficient solution for the given problem.

Follow these steps carefully:
1.  **Analyze the Request**: Thoroughly understand the problem description, constraints, and examples.{% if has_image %} An image of the problem is attached. Read it carefully; if the image and the text disagree, the image takes precedence.{% endif %}
2.  **Choose the Right Approach**: Select the most appropriate data structures and algorithms to solve the problem efficiently, keeping the constraints in mind.
3.  **Think Step-by-Step**: Before writing any code, outline the logic for your solution.
4.  **Generate the Code**: Write clean, readable, and well-structured code in {{ language }}. The solution must be self-contained in a single code block.
5.  **Verify the Solution**: Trace the provided examples through your code to ensure it produces the correct output. Your solution MUST work for the given examples and for the edge cases implied by the constraints.

**Problem Details:**

*   **Problem Description**: {% if problem_description %}{{ problem_description }}{% else %}See the attached image.{% endif %}
*   **Constraints**: {% if constraints %}{{ constraints }}{% else %}None given.{% endif %}
*   **Examples**: {% if examples %}{{ examples }}{% else %}None given.{% endif %}
*   **Programming Language**: {{ language }}

**Instructions for Output:**
Respond with a JSON object with exactly these fields:
*   "code": the final, complete and runnable solution as a single code block starting with ```{{ fence_tag }} and ending with ```.
*   "explanation": a short explanation of the approach and its complexity, and how the solution produces the expected output for each supplied example.

Do not include test harnesses or text outside the JSON object."#;

/// Values substituted into [`GENERATION_TEMPLATE`].
#[derive(Debug, Clone, Serialize)]
pub struct GenerationPrompt<'a> {
    pub problem_description: &'a str,
    pub constraints: &'a str,
    pub examples: &'a str,
    /// Display name, e.g. "C++".
    pub language: &'a str,
    pub fence_tag: &'a str,
    pub has_image: bool,
}

impl GenerationPrompt<'_> {
    /// Renders the user prompt.
    pub fn render(&self) -> Result<String, tera::Error> {
        render(GENERATION_TEMPLATE, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt<'a>(description: &'a str, has_image: bool) -> GenerationPrompt<'a> {
        GenerationPrompt {
            problem_description: description,
            constraints: "2 <= nums.length <= 10^4",
            examples: "",
            language: "Python",
            fence_tag: "python",
            has_image,
        }
    }

    #[test]
    fn test_renders_problem_fields() {
        let text = prompt("Return indices of two numbers that sum to target.", false)
            .render()
            .expect("render");
        assert!(text.contains("Return indices of two numbers that sum to target."));
        assert!(text.contains("2 <= nums.length <= 10^4"));
        assert!(text.contains("**Examples**: None given."));
        assert!(text.contains("```python"));
        assert!(!text.contains("image takes precedence"));
    }

    #[test]
    fn test_image_only_problem() {
        let text = prompt("", true).render().expect("render");
        assert!(text.contains("See the attached image."));
        assert!(text.contains("the image takes precedence"));
    }

    #[test]
    fn test_user_text_is_not_escaped() {
        let text = prompt("a < b && c > d", false).render().expect("render");
        assert!(text.contains("a < b && c > d"));
    }
}
