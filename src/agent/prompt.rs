//! Building the human message for a question.

use crate::config::{Prompts, QuestionPrompts};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Marker found in the benchmark's reversed-text question.
const REVERSED_MARKER: &str = ".rewsna eht sa";

/// Whether a question looks like it was written backwards.
pub fn is_reversed(question: &str) -> bool {
    question.starts_with('.') || question.contains(REVERSED_MARKER)
}

/// Build the prompt sent as the first human message.
///
/// An attached file is inlined when it reads as UTF-8 text. Otherwise the
/// prompt names the path and the read error so the model can still reach
/// for a tool. Reversed questions are flipped, which takes precedence over
/// the file context.
pub async fn build_prompt(templates: &QuestionPrompts, question: &str, file: Option<&Path>) -> String {
    let mut vars: HashMap<&str, String> = HashMap::new();
    vars.insert("question", question.to_string());

    let mut context = question.to_string();

    if let Some(path) = file {
        vars.insert("path", path.display().to_string());
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let extension = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| format!(".{}", e.to_lowercase()))
                    .unwrap_or_default();
                vars.insert("extension", extension);
                vars.insert("content", content);
                context = Prompts::render(&templates.with_file, &vars);
            }
            Err(e) => {
                debug!("Attached file {:?} is not readable as text: {}", path, e);
                vars.insert("error", e.to_string());
                context = Prompts::render(&templates.with_unreadable_file, &vars);
            }
        }
    }

    if is_reversed(question) {
        vars.insert("reversed", question.chars().rev().collect());
        context = Prompts::render(&templates.reversed, &vars);
    }

    format!("{}{}", context, templates.precise_answer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reversed_detection() {
        assert!(is_reversed(".rewsna eht sa \"tfel\" drow eht fo etisoppo eht etirw"));
        assert!(is_reversed("xx .rewsna eht sa yy"));
        assert!(!is_reversed("What is the capital of France?"));
    }

    #[tokio::test]
    async fn test_plain_question_gets_instructions() {
        let templates = QuestionPrompts::default();
        let prompt = build_prompt(&templates, "What is 2+2?", None).await;
        assert!(prompt.starts_with("What is 2+2?"));
        assert!(prompt.ends_with(&templates.precise_answer));
    }

    #[tokio::test]
    async fn test_text_file_is_inlined() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.PY");
        std::fs::write(&path, "print(42)").unwrap();

        let prompt = build_prompt(&QuestionPrompts::default(), "What does it print?", Some(&path)).await;
        assert!(prompt.contains("Question: What does it print?"));
        assert!(prompt.contains("```.py\nprint(42)\n```"));
        assert!(prompt.contains("ONLY the precise answer"));
    }

    #[tokio::test]
    async fn test_file_content_with_placeholders_is_inlined_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        let body = "<p>{{question}}</p><p>{{extension}}</p><p>{{path}}</p>";
        std::fs::write(&path, body).unwrap();

        for _ in 0..50 {
            let prompt = build_prompt(&QuestionPrompts::default(), "What is the title?", Some(&path)).await;
            assert!(prompt.contains(&format!("```.html\n{}\n```", body)));
        }
    }

    #[tokio::test]
    async fn test_unreadable_file_names_path_and_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("image.png");
        std::fs::write(&path, [0x89, 0x50, 0x4e, 0x47, 0xff, 0xfe]).unwrap();

        let prompt = build_prompt(&QuestionPrompts::default(), "What is shown?", Some(&path)).await;
        assert!(prompt.contains(&format!("associated file at path: {}", path.display())));
        assert!(prompt.contains("there was an error reading the file"));
    }

    #[tokio::test]
    async fn test_reversed_question_is_flipped() {
        let prompt = build_prompt(&QuestionPrompts::default(), ".olleh yas", None).await;
        assert!(prompt.contains("reversed version:\nsay hello.\n"));
    }
}
