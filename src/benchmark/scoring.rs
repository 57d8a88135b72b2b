//! Local scoring against a known answer key.

use super::{Answer, ScoreReport};
use crate::error::{Result, SvarError};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Expected answers keyed by task id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerKey {
    answers: HashMap<String, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AnswerKeyFile {
    Map(HashMap<String, String>),
    Records(Vec<AnswerKeyRecord>),
}

#[derive(Deserialize)]
struct AnswerKeyRecord {
    task_id: String,
    #[serde(alias = "submitted_answer", alias = "Final answer")]
    final_answer: String,
}

impl AnswerKey {
    pub fn new(answers: HashMap<String, String>) -> Self {
        Self { answers }
    }

    /// Load a key from either `{"task_id": "answer", ...}` or an array of
    /// `{task_id, final_answer}` records.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let key = Self::parse(&content).map_err(|e| {
            SvarError::Benchmark(format!("Invalid answer key {}: {}", path.display(), e))
        })?;
        info!("Loaded {} expected answers from {}", key.len(), path.display());
        Ok(key)
    }

    fn parse(content: &str) -> serde_json::Result<Self> {
        let answers = match serde_json::from_str::<AnswerKeyFile>(content)? {
            AnswerKeyFile::Map(map) => map,
            AnswerKeyFile::Records(records) => records
                .into_iter()
                .map(|r| (r.task_id, r.final_answer))
                .collect(),
        };
        Ok(Self { answers })
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn expected(&self, task_id: &str) -> Option<&str> {
        self.answers.get(task_id).map(String::as_str)
    }

    /// Score answers by exact match. The denominator is the size of the key,
    /// so unanswered tasks count against the score. When a task is answered
    /// more than once, only its last answer counts.
    pub fn score(&self, username: Option<&str>, answers: &[Answer]) -> ScoreReport {
        let latest: HashMap<&str, &str> = answers
            .iter()
            .map(|a| (a.task_id.as_str(), a.submitted_answer.as_str()))
            .collect();
        let correct = latest
            .into_iter()
            .filter(|(task_id, answer)| self.expected(task_id) == Some(*answer))
            .count();

        let score = if self.answers.is_empty() {
            0.0
        } else {
            100.0 * correct as f64 / self.answers.len() as f64
        };
        debug!("Local score {} ({} of {} known)", score, correct, self.answers.len());

        ScoreReport {
            username: username.map(str::to_string),
            score,
            correct_count: correct,
            total_attempted: answers.len(),
            message: None,
        }
    }
}
