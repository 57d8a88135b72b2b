//! Benchmark API types, client and local scoring.

mod client;
mod scoring;

pub use client::BenchmarkClient;
pub use scoring::AnswerKey;

use serde::{Deserialize, Serialize};

/// A benchmark question as served by `GET /questions`.
///
/// Fields are optional because malformed tasks are skipped rather than
/// failing the whole batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default, rename = "Level", skip_serializing_if = "Option::is_none")]
    pub level: Option<serde_json::Value>,
}

impl Task {
    /// Attached file name, treating an empty string as no attachment.
    pub fn attachment(&self) -> Option<&str> {
        self.file_name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// One submitted answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub task_id: String,
    pub submitted_answer: String,
}

/// Body of `POST /submit`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub username: Option<String>,
    pub agent_code: String,
    pub answers: Vec<Answer>,
}

/// Score for a set of answers, computed locally or returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub correct_count: usize,
    #[serde(default)]
    pub total_attempted: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl std::fmt::Display for ScoreReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "User: {}  Score: {}%  Correct: {}/{}",
            self.username.as_deref().unwrap_or("anonymous"),
            self.score,
            self.correct_count,
            self.total_attempted
        )
    }
}

/// Repository URL reported with a submission.
pub fn agent_code_url(space_id: &str) -> String {
    format!("https://huggingface.co/spaces/{}/tree/main", space_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_attachment() {
        let task: Task = serde_json::from_str(
            r#"{"task_id": "t", "question": "q", "Level": "1", "file_name": ""}"#,
        )
        .unwrap();
        assert_eq!(task.attachment(), None);

        let task: Task = serde_json::from_str(r#"{"task_id": "t", "file_name": "a.xlsx"}"#).unwrap();
        assert_eq!(task.attachment(), Some("a.xlsx"));
        assert_eq!(task.question, None);
    }

    #[test]
    fn test_score_report_display() {
        let report = ScoreReport {
            username: Some("alice".to_string()),
            score: 35.0,
            correct_count: 7,
            total_attempted: 20,
            message: None,
        };
        assert_eq!(report.to_string(), "User: alice  Score: 35%  Correct: 7/20");
    }

    #[test]
    fn test_agent_code_url() {
        assert_eq!(
            agent_code_url("alice/agent"),
            "https://huggingface.co/spaces/alice/agent/tree/main"
        );
    }
}
