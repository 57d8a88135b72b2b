//! Evaluation harness.
//!
//! Fetches every benchmark task, downloads attachments, answers the questions
//! one at a time, scores the answers locally when an answer key is
//! configured, and submits them to the scoring API.

use crate::agent::{Agent, Answerer};
use crate::benchmark::{Answer, AnswerKey, BenchmarkClient, Submission, Task};
use crate::config::Settings;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Builds the answerer once tasks are fetched.
pub type AnswererFactory = Box<dyn Fn() -> Result<Arc<dyn Answerer>> + Send + Sync>;

/// One answered task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_id: String,
    pub question: String,
    pub answer: String,
}

/// What a full run reports back to the UI and CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub status: String,
    pub results: Vec<TaskResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_status: Option<String>,
}

impl RunOutcome {
    fn status_only(status: String) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

/// Runs the agent over every benchmark task and submits the answers.
pub struct EvaluationRunner {
    client: BenchmarkClient,
    work_dir: PathBuf,
    agent_code: String,
    answer_key: Option<AnswerKey>,
    factory: AnswererFactory,
    limit: Option<usize>,
}

impl EvaluationRunner {
    pub fn new(
        client: BenchmarkClient,
        work_dir: PathBuf,
        agent_code: impl Into<String>,
        factory: AnswererFactory,
    ) -> Self {
        Self {
            client,
            work_dir,
            agent_code: agent_code.into(),
            answer_key: None,
            factory,
            limit: None,
        }
    }

    /// Build a runner whose answerer is the agent described by the settings.
    ///
    /// An unreadable answer key disables local scoring instead of failing.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let client = BenchmarkClient::new(&settings.benchmark)?;
        let agent_code = settings
            .benchmark
            .agent_code
            .clone()
            .unwrap_or_else(|| format!("svar {}", env!("CARGO_PKG_VERSION")));

        let agent_settings = settings.clone();
        let factory: AnswererFactory = Box::new(move || {
            let agent = Agent::from_settings(&agent_settings)?;
            Ok(Arc::new(agent) as Arc<dyn Answerer>)
        });

        let mut runner = Self::new(client, settings.work_dir(), agent_code, factory);

        if let Some(path) = &settings.benchmark.answer_key_path {
            match AnswerKey::load(&Settings::expand_path(path)) {
                Ok(key) => runner = runner.with_answer_key(key),
                Err(e) => warn!("Local scoring disabled: {}", e),
            }
        }

        Ok(runner)
    }

    pub fn with_answer_key(mut self, key: AnswerKey) -> Self {
        self.answer_key = Some(key);
        self
    }

    /// Only answer the first `limit` tasks.
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn agent_code(&self) -> &str {
        &self.agent_code
    }

    /// Answer every task and submit the answers under `username`.
    ///
    /// Never fails: every failure is reported through the returned status.
    #[instrument(skip(self))]
    pub async fn run_and_submit_all(&self, username: Option<&str>) -> RunOutcome {
        let username = username.map(str::trim).filter(|u| !u.is_empty());

        let mut tasks = match self.client.fetch_questions().await {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!("Error fetching tasks: {}", e);
                return RunOutcome::status_only(format!("Failed to fetch tasks: {}", e));
            }
        };
        if let Some(limit) = self.limit {
            tasks.truncate(limit);
        }

        self.download_attachments(&tasks).await;

        let answerer = match (self.factory)() {
            Ok(answerer) => answerer,
            Err(e) => {
                warn!("Error instantiating agent: {}", e);
                return RunOutcome::status_only(format!("Agent initialization failed: {}", e));
            }
        };

        let results = self.answer_all(answerer.as_ref(), &tasks).await;
        if results.is_empty() {
            return RunOutcome::status_only("No answers generated.".to_string());
        }

        let answers: Vec<Answer> = results
            .iter()
            .map(|r| Answer {
                task_id: r.task_id.clone(),
                submitted_answer: r.answer.clone(),
            })
            .collect();

        let local_status = self.answer_key.as_ref().map(|key| {
            let report = key.score(username, &answers);
            info!("Local evaluation: {}", report);
            report.to_string()
        });

        let status = match username {
            None => "Please log in to submit.".to_string(),
            Some(username) => {
                let submission = Submission {
                    username: Some(username.to_string()),
                    agent_code: self.agent_code.clone(),
                    answers,
                };
                match self.client.submit(&submission).await {
                    Ok(report) => report.to_string(),
                    Err(e) => {
                        warn!("Submission failed: {}", e);
                        format!("Submission failed: {}", e)
                    }
                }
            }
        };

        RunOutcome {
            status,
            results,
            local_status,
        }
    }

    fn attachment_path(&self, file_name: &str) -> PathBuf {
        let name = Path::new(file_name)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(file_name));
        self.work_dir.join(name)
    }

    async fn download_attachments(&self, tasks: &[Task]) {
        for task in tasks {
            let (Some(task_id), Some(file_name)) = (task.task_id.as_deref(), task.attachment())
            else {
                continue;
            };

            let bytes = match self.client.download_file(task_id).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Skipping attachment {} for task {}: {}", file_name, task_id, e);
                    continue;
                }
            };

            let path = self.attachment_path(file_name);
            let written = match tokio::fs::create_dir_all(&self.work_dir).await {
                Ok(()) => tokio::fs::write(&path, &bytes).await,
                Err(e) => Err(e),
            };
            match written {
                Ok(()) => info!("File saved as {}", path.display()),
                Err(e) => warn!("Could not save {}: {}", path.display(), e),
            }
        }
    }

    async fn answer_all(&self, answerer: &dyn Answerer, tasks: &[Task]) -> Vec<TaskResult> {
        let mut results = Vec::with_capacity(tasks.len());

        for (i, task) in tasks.iter().enumerate() {
            let (Some(task_id), Some(question)) = (task.task_id.as_deref(), task.question.as_deref())
            else {
                warn!("Skipping task with missing task_id or question: {:?}", task);
                continue;
            };

            info!("Answering task {}/{} ({})", i + 1, tasks.len(), task_id);
            let file = task.attachment().map(|name| self.attachment_path(name));
            let answer = answerer.answer_question(question, file.as_deref()).await;

            results.push(TaskResult {
                task_id: task_id.to_string(),
                question: question.to_string(),
                answer,
            });
        }

        results
    }
}
