//! Prompt templates for Svar.
//!
//! The system prompt can be replaced by a text file or the `SYSTEM_PROMPT`
//! environment variable; the question templates can be overridden in a TOML file.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

const PLACEHOLDER_PATTERN: &str = r"\{\{(\w+)\}\}";

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    /// System message placed at the start of every conversation.
    pub system: String,
    pub question: QuestionPrompts,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            system: DEFAULT_SYSTEM_PROMPT.to_string(),
            question: QuestionPrompts::default(),
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful assistant tasked with answering questions using a set of tools.

Think step by step about what information you need, then use the tools to gather it:
- Use 'web_search', 'wiki_search' or 'arxiv_search' for facts you do not know
- Use the math tools for arithmetic instead of computing in your head
- Use 'analyze_csv_file', 'analyze_excel_file', 'extract_text_from_image', 'image_analysis', 'audio_analysis'
  or 'youtube_analysis' when the question refers to a file or a video

Your final answer should be a number OR as few words as possible OR a comma separated
list of numbers and/or strings.
- If you are asked for a number, don't use commas or units such as $ or percent signs
  unless specified otherwise.
- If you are asked for a string, don't use articles or abbreviations, and write digits
  in plain text unless specified otherwise.
- If you are asked for a comma separated list, apply the above rules to each element.

Reply with the final answer only, with no explanation and no prefix."#;

/// Templates for the human message that carries the question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestionPrompts {
    /// Question with the text content of an attached file.
    pub with_file: String,
    /// Question whose attached file could not be read as text.
    pub with_unreadable_file: String,
    /// Question written backwards.
    pub reversed: String,
    /// Instructions appended to every question.
    pub precise_answer: String,
    /// Introduction of the retrieved similar example.
    pub similar_example: String,
}

impl Default for QuestionPrompts {
    fn default() -> Self {
        Self {
            with_file: r#"
Question: {{question}}
This question has an associated file. Here is the file content:
```{{extension}}
{{content}}
```
Analyze the file content above to answer the question.
"#
            .to_string(),

            with_unreadable_file: r#"
Question: {{question}}
This question has an associated file at path: {{path}}
However, there was an error reading the file: {{error}}
You can still try to answer the question based on the information provided.
"#
            .to_string(),

            reversed: r#"
This question appears to be in reversed text. Here's the reversed version:
{{reversed}}
Now answer the question above. Remember to format your answer exactly as requested.
"#
            .to_string(),

            precise_answer: r#"
When answering, provide ONLY the precise answer requested.
Do not include explanations, steps, reasoning, or additional text.
Be direct and specific.
For example, if asked "What is the capital of France?", respond simply with "Paris".
"#
            .to_string(),

            similar_example: "Here I provide a similar question and answer for reference: \n\n"
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts.
    ///
    /// The system prompt comes from `system_override` when set, otherwise from
    /// `system_prompt_path` when that file exists. `templates_path` may point
    /// to a TOML file overriding the question templates.
    pub fn load(
        system_override: Option<String>,
        system_prompt_path: Option<&Path>,
        templates_path: Option<&Path>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(path) = templates_path.filter(|p| p.exists()) {
            let content = std::fs::read_to_string(path)?;
            prompts.question = toml::from_str(&content)?;
        }

        match system_override.filter(|s| !s.trim().is_empty()) {
            Some(system) => {
                debug!("Using system prompt from environment");
                prompts.system = system;
            }
            None => {
                if let Some(path) = system_prompt_path.filter(|p| p.exists()) {
                    debug!("Loading system prompt from {:?}", path);
                    prompts.system = std::fs::read_to_string(path)?;
                }
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// `{{name}}` placeholders are substituted in one pass, so substituted
    /// values are never scanned for placeholders. Unknown names are left as is.
    pub fn render(template: &str, vars: &HashMap<&str, String>) -> String {
        let placeholder = match Regex::new(PLACEHOLDER_PATTERN) {
            Ok(re) => re,
            Err(e) => {
                warn!("Invalid placeholder pattern: {}", e);
                return template.to_string();
            }
        };

        placeholder
            .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(!prompts.system.is_empty());
        assert!(prompts.question.precise_answer.contains("ONLY the precise answer"));
    }

    #[test]
    fn test_render_template() {
        let mut vars = HashMap::new();
        vars.insert("question", "What is 2+2?".to_string());
        vars.insert("extension", ".txt".to_string());
        vars.insert("content", "four".to_string());

        let result = Prompts::render(&QuestionPrompts::default().with_file, &vars);
        assert!(result.contains("Question: What is 2+2?"));
        assert!(result.contains("```.txt\nfour\n```"));
    }

    #[test]
    fn test_render_does_not_rescan_values() {
        let mut vars = HashMap::new();
        vars.insert("question", "Q".to_string());
        vars.insert("extension", ".html".to_string());
        vars.insert("content", "<p>{{question}}</p><p>{{extension}}</p>".to_string());

        for _ in 0..50 {
            let result = Prompts::render("{{question}}|{{content}}|{{missing}}", &vars);
            assert_eq!(result, "Q|<p>{{question}}</p><p>{{extension}}</p>|{{missing}}");
        }
    }

    #[test]
    fn test_system_prompt_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("system_prompt.txt");
        std::fs::write(&path, "from file").unwrap();

        let prompts = Prompts::load(None, Some(&path), None).unwrap();
        assert_eq!(prompts.system, "from file");

        let prompts = Prompts::load(Some("from env".into()), Some(&path), None).unwrap();
        assert_eq!(prompts.system, "from env");

        let missing = dir.path().join("missing.txt");
        let prompts = Prompts::load(None, Some(&missing), None).unwrap();
        assert_eq!(prompts.system, DEFAULT_SYSTEM_PROMPT);
    }
}
