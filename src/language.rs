//! Target languages for generated solutions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Programming language of the generated code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    Java,
    Cpp,
    JavaScript,
    TypeScript,
    Go,
    Rust,
    C,
}

impl Language {
    /// Returns all supported languages, in the order the form lists them.
    pub fn all() -> &'static [Language] {
        &[
            Language::Python,
            Language::Java,
            Language::Cpp,
            Language::JavaScript,
            Language::TypeScript,
            Language::Go,
            Language::Rust,
            Language::C,
        ]
    }

    /// Wire identifier (`python`, `cpp`, ...).
    pub fn id(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::C => "c",
        }
    }

    /// Returns the display name for this language.
    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::Java => "Java",
            Language::Cpp => "C++",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Go => "Go",
            Language::Rust => "Rust",
            Language::C => "C",
        }
    }

    /// Info string the model is told to put after the opening fence.
    pub fn fence_tag(&self) -> &'static str {
        self.id()
    }

    /// File extension used when the CLI writes a solution to disk.
    pub fn extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::JavaScript => "js",
            Language::TypeScript => "ts",
            Language::Go => "go",
            Language::Rust => "rs",
            Language::C => "c",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "cpp" | "c++" => Ok(Language::Cpp),
            "javascript" | "js" => Ok(Language::JavaScript),
            "typescript" | "ts" => Ok(Language::TypeScript),
            "go" | "golang" => Ok(Language::Go),
            "rust" | "rs" => Ok(Language::Rust),
            "c" => Ok(Language::C),
            other => Err(format!("unsupported language '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_python() {
        assert_eq!(Language::default(), Language::Python);
    }

    #[test]
    fn test_from_str_accepts_ids_and_aliases() {
        for lang in Language::all() {
            assert_eq!(lang.id().parse::<Language>(), Ok(*lang));
        }
        assert_eq!("C++".parse::<Language>(), Ok(Language::Cpp));
        assert_eq!(" Py ".parse::<Language>(), Ok(Language::Python));
        assert!("cobol".parse::<Language>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_ids() {
        let json = serde_json::to_string(&Language::JavaScript).expect("serialize");
        assert_eq!(json, "\"javascript\"");
        let lang: Language = serde_json::from_str("\"cpp\"").expect("deserialize");
        assert_eq!(lang, Language::Cpp);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(Language::Cpp.to_string(), "C++");
        assert_eq!(Language::Go.extension(), "go");
    }
}
