//! Run command: answer every benchmark task and submit.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{credentials, Settings};
use crate::evaluation::EvaluationRunner;
use anyhow::Result;

/// Run the full evaluation.
pub async fn run_evaluation(username: Option<String>, limit: Option<usize>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Answer, &settings, credentials::env_lookup) {
        Output::error(&format!("{}", e));
        Output::info("Run 'svar doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let username = username.or_else(|| settings.benchmark.username.clone());
    match &username {
        Some(u) => Output::info(&format!("User logged in: {}", u)),
        None => Output::warning("No username set; answers will not be submitted."),
    }

    let runner = EvaluationRunner::from_settings(&settings)?.with_limit(limit);
    Output::kv("API", &settings.benchmark.api_url);
    Output::kv("Agent code", runner.agent_code());

    let spinner = Output::spinner("Answering benchmark tasks...");
    let outcome = runner.run_and_submit_all(username.as_deref()).await;
    spinner.finish_and_clear();

    Output::run_outcome(&outcome);
    Ok(())
}
