//! HTTP client for the scoring API.

use super::{ScoreReport, Submission, Task};
use crate::config::BenchmarkSettings;
use crate::error::{Result, SvarError};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Client for `/questions`, `/files/{task_id}` and `/submit`.
pub struct BenchmarkClient {
    http: reqwest::Client,
    base_url: String,
    questions_timeout: Duration,
    submit_timeout: Duration,
}

impl BenchmarkClient {
    pub fn new(settings: &BenchmarkSettings) -> Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().build()?,
            base_url: settings.api_url.trim_end_matches('/').to_string(),
            questions_timeout: Duration::from_secs(settings.questions_timeout_seconds),
            submit_timeout: Duration::from_secs(settings.submit_timeout_seconds),
        })
    }

    /// Fetch every task.
    #[instrument(skip(self))]
    pub async fn fetch_questions(&self) -> Result<Vec<Task>> {
        let tasks: Vec<Task> = self
            .http
            .get(format!("{}/questions", self.base_url))
            .timeout(self.questions_timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!("Fetched {} tasks", tasks.len());
        Ok(tasks)
    }

    /// Download the file attached to a task.
    #[instrument(skip(self))]
    pub async fn download_file(&self, task_id: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(format!("{}/files/{}", self.base_url, task_id))
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(SvarError::Benchmark(format!(
                "Failed to retrieve the file. Status code: {}",
                status.as_u16()
            )));
        }

        let bytes = response.bytes().await?;
        debug!("Downloaded {} bytes for task {}", bytes.len(), task_id);
        Ok(bytes.to_vec())
    }

    /// Submit answers and return the remote score.
    #[instrument(skip(self, submission), fields(answers = submission.answers.len()))]
    pub async fn submit(&self, submission: &Submission) -> Result<ScoreReport> {
        let report: ScoreReport = self
            .http
            .post(format!("{}/submit", self.base_url))
            .timeout(self.submit_timeout)
            .json(submission)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!("Submission scored: {}", report);
        Ok(report)
    }
}
