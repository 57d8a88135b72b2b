//! Ask command implementation.

use crate::agent::{Agent, EMPTY_QUESTION_ANSWER};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{credentials, Settings};
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, file: Option<String>, trace: bool, settings: Settings) -> Result<()> {
    if question.trim().is_empty() {
        println!("{}", EMPTY_QUESTION_ANSWER);
        return Ok(());
    }

    if let Err(e) = preflight::check(Operation::Answer, &settings, credentials::env_lookup) {
        Output::error(&format!("{}", e));
        Output::info("Run 'svar doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let file = file.map(|f| Settings::expand_path(&f));
    if let Some(path) = &file {
        if !path.exists() {
            Output::warning(&format!("{} does not exist", path.display()));
        }
    }

    let agent = Agent::from_settings(&settings)?;
    let spinner = Output::spinner("Thinking...");

    match agent.run(question, file.as_deref()).await {
        Ok((answer, run)) => {
            spinner.finish_and_clear();

            if trace {
                for message in &run.messages {
                    print!("{}", message);
                }
                println!();
            }
            if !run.tool_calls.is_empty() {
                Output::header("Tool calls");
                for call in &run.tool_calls {
                    Output::kv(&call.to_string(), &crate::cli::output::content_preview(&call.result, 100));
                }
                println!();
            }

            println!("{}", answer);
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Error answering question: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
