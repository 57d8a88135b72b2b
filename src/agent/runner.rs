//! Question answering on top of the agent graph.

use super::graph::{AgentGraph, GraphRun};
use super::normalize::normalize_answer;
use super::prompt::build_prompt;
use super::tools::ToolContext;
use crate::config::{credentials, QuestionPrompts, Settings};
use crate::embedding::create_embedder;
use crate::error::Result;
use crate::model::{ChatModel, Message, OpenAICompatibleModel};
use crate::retrieval::Retriever;
use crate::vector_store::create_vector_store;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Answer returned for blank questions.
pub const EMPTY_QUESTION_ANSWER: &str = "Please provide a question.";

/// Something that can answer a benchmark question.
#[async_trait]
pub trait Answerer: Send + Sync {
    /// Answer a question. Never fails: errors come back as answer text.
    async fn answer_question(&self, question: &str, file: Option<&Path>) -> String;
}

/// Retrieval-guided, tool-calling question answering agent.
pub struct Agent {
    graph: AgentGraph,
    prompts: QuestionPrompts,
}

impl Agent {
    pub fn new(graph: AgentGraph, prompts: QuestionPrompts) -> Self {
        Self { graph, prompts }
    }

    /// Build the agent described by the settings.
    ///
    /// Fails when the model credentials are missing or the vector store
    /// cannot be reached.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let creds =
            credentials::resolve_model_credentials(&settings.model, credentials::env_lookup)?;
        let model_id = settings.model.model_id();
        info!(
            "Using {} model {} (key from {})",
            settings.model.provider, model_id, creds.source
        );

        let model: Arc<dyn ChatModel> = Arc::new(OpenAICompatibleModel::new(
            &creds,
            &model_id,
            settings.model.temperature,
            Duration::from_secs(settings.model.timeout_seconds),
        )?);

        let tools = ToolContext::from_settings(settings, model.clone())?;
        let retriever = Retriever::new(create_embedder(settings)?, create_vector_store(settings)?)
            .with_k(settings.vector_store.top_k);

        let prompts = settings.prompts()?;
        let graph = AgentGraph::new(model, Arc::new(tools), &prompts.system)
            .with_retriever(retriever)
            .with_example_intro(&prompts.question.similar_example)
            .with_recursion_limit(settings.model.recursion_limit);

        info!("Agent ready");
        Ok(Self::new(graph, prompts.question))
    }

    /// Run the graph and return the full trace along with the normalized answer.
    #[instrument(skip(self, question), fields(question_len = question.len()))]
    pub async fn run(&self, question: &str, file: Option<&Path>) -> Result<(String, GraphRun)> {
        let prompt = build_prompt(&self.prompts, question, file).await;
        debug!("Prompt:\n{}", prompt);

        let run = self.graph.invoke(vec![Message::human(prompt)]).await?;
        for message in &run.messages {
            debug!("{}", message);
        }

        let answer = normalize_answer(run.final_content());
        info!("Generated answer: {}", answer);
        Ok((answer, run))
    }
}

#[async_trait]
impl Answerer for Agent {
    async fn answer_question(&self, question: &str, file: Option<&Path>) -> String {
        if question.trim().is_empty() {
            return EMPTY_QUESTION_ANSWER.to_string();
        }

        match self.run(question, file).await {
            Ok((answer, _)) => answer,
            Err(e) => {
                warn!("Failed to answer question: {}", e);
                format!("Error answering question: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::testing;
    use crate::model::testing::{tool_call, ScriptedModel};

    fn agent(model: Arc<ScriptedModel>, dir: &Path) -> Agent {
        let graph = AgentGraph::new(model, Arc::new(testing::context(dir)), "SYSTEM");
        Agent::new(graph, QuestionPrompts::default())
    }

    #[tokio::test]
    async fn test_answer_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![
            tool_call("c1", "add", r#"{"a": 40, "b": 2}"#),
            Message::assistant("  The answer is \"42\"  "),
        ]));

        let answer = agent(model.clone(), dir.path())
            .answer_question("What is 40 + 2?", None)
            .await;
        assert_eq!(answer, "42");

        let requests = model.requests.lock().unwrap();
        let human = requests[0].0[1].content();
        assert!(human.starts_with("What is 40 + 2?"));
        assert!(human.contains("ONLY the precise answer"));
    }

    #[tokio::test]
    async fn test_blank_question_skips_model() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![]));
        let answer = agent(model.clone(), dir.path()).answer_question("   ", None).await;
        assert_eq!(answer, EMPTY_QUESTION_ANSWER);
        assert_eq!(model.request_count(), 0);
    }

    #[tokio::test]
    async fn test_model_failure_becomes_answer_text() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![]));
        let answer = agent(model, dir.path()).answer_question("q", None).await;
        assert_eq!(answer, "Error answering question: Model error: script exhausted");
    }
}
