//! The retrieve → assist → tools control loop.
//!
//! ```text
//! START -> retriever -> assistant --(tool calls?)--> tools --+
//!                           ^             | no               |
//!                           |             v                  |
//!                           |            END                 |
//!                           +--------------------------------+
//! ```
//!
//! The retriever runs once. Every node execution counts against the
//! recursion limit.

use super::tools::ToolExecutor;
use crate::error::{Result, SvarError};
use crate::model::{ChatModel, Message};
use crate::retrieval::Retriever;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default number of node executions before a run is abandoned.
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    pub result: String,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}

/// Result of one graph execution.
#[derive(Debug)]
pub struct GraphRun {
    /// Full message log, system message first.
    pub messages: Vec<Message>,
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of model calls.
    pub iterations: usize,
}

impl GraphRun {
    /// Content of the final message.
    pub fn final_content(&self) -> &str {
        self.messages.last().map(Message::content).unwrap_or_default()
    }
}

/// Where control goes after the assistant node.
#[derive(Debug, PartialEq, Eq)]
enum Route {
    Tools,
    End,
}

/// Route to the tool node iff the last message requests at least one call.
fn tools_condition(messages: &[Message]) -> Route {
    match messages.last() {
        Some(last) if !last.tool_calls().is_empty() => Route::Tools,
        _ => Route::End,
    }
}

/// Compiled agent workflow.
pub struct AgentGraph {
    model: Arc<dyn ChatModel>,
    tools: Arc<dyn ToolExecutor>,
    retriever: Option<Retriever>,
    system_prompt: String,
    example_intro: String,
    recursion_limit: usize,
}

impl AgentGraph {
    pub fn new(model: Arc<dyn ChatModel>, tools: Arc<dyn ToolExecutor>, system_prompt: &str) -> Self {
        Self {
            model,
            tools,
            retriever: None,
            system_prompt: system_prompt.to_string(),
            example_intro: crate::config::QuestionPrompts::default().similar_example,
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }

    pub fn with_retriever(mut self, retriever: Retriever) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Text placed before the retrieved example.
    pub fn with_example_intro(mut self, intro: &str) -> Self {
        self.example_intro = intro.to_string();
        self
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    /// Run the workflow over the initial messages.
    pub async fn invoke(&self, messages: Vec<Message>) -> Result<GraphRun> {
        let mut steps = 0;
        let mut step = |node: &str| -> Result<()> {
            steps += 1;
            if steps > self.recursion_limit {
                return Err(SvarError::Agent(format!(
                    "Recursion limit of {} reached without hitting a stop condition (next node: {})",
                    self.recursion_limit, node
                )));
            }
            debug!("Step {}: {}", steps, node);
            Ok(())
        };

        step("retriever")?;
        let mut messages = self.retrieve(messages).await;

        let mut tool_calls = Vec::new();
        let mut iterations = 0;

        loop {
            step("assistant")?;
            iterations += 1;
            let reply = self.model.invoke(&messages, &self.tools.specs()).await?;
            debug!("{}", reply);
            messages.push(reply);

            if tools_condition(&messages) == Route::End {
                break;
            }

            step("tools")?;
            let requested = messages
                .last()
                .map(|m| m.tool_calls().to_vec())
                .unwrap_or_default();
            for call in requested {
                let result = self.tools.call(&call.name, &call.arguments).await;
                debug!("Tool {} returned {} bytes", call.name, result.len());
                messages.push(Message::tool(&call.id, &call.name, &result));
                tool_calls.push(ToolCallRecord {
                    name: call.name,
                    arguments: call.arguments,
                    result,
                });
            }
        }

        info!(
            "Graph finished after {} model call(s) and {} tool call(s)",
            iterations,
            tool_calls.len()
        );

        Ok(GraphRun {
            messages,
            tool_calls,
            iterations,
        })
    }

    /// Prepend the system message and append the nearest reference pair.
    async fn retrieve(&self, messages: Vec<Message>) -> Vec<Message> {
        let mut state = Vec::with_capacity(messages.len() + 2);
        state.push(Message::system(self.system_prompt.clone()));

        let example = match (&self.retriever, messages.first()) {
            (Some(retriever), Some(first)) => match retriever.most_similar(first.content()).await {
                Ok(example) => example,
                Err(e) => {
                    warn!("Similar-question lookup failed, continuing without it: {}", e);
                    None
                }
            },
            _ => None,
        };

        state.extend(messages);
        if let Some(example) = example {
            state.push(Message::human(format!(
                "{}{}",
                self.example_intro, example.page_content
            )));
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::tools::testing;
    use crate::embedding::testing::LetterEmbedder;
    use crate::embedding::Embedder;
    use crate::model::testing::{tool_call, ScriptedModel};
    use crate::retrieval::SimilarExample;
    use crate::vector_store::{Document, MemoryVectorStore, VectorStore};
    use pretty_assertions::assert_eq;

    fn graph(model: Arc<ScriptedModel>, dir: &std::path::Path) -> AgentGraph {
        AgentGraph::new(model, Arc::new(testing::context(dir)), "SYSTEM")
    }

    #[tokio::test]
    async fn test_ends_without_tool_calls() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![Message::assistant("Paris")]));

        let run = graph(model.clone(), dir.path())
            .invoke(vec![Message::human("Capital of France?")])
            .await
            .unwrap();

        assert_eq!(run.final_content(), "Paris");
        assert_eq!(run.iterations, 1);
        assert!(run.tool_calls.is_empty());
        assert_eq!(model.request_count(), 1);

        let requests = model.requests.lock().unwrap();
        let (sent, tools) = &requests[0];
        assert_eq!(sent, &vec![Message::system("SYSTEM"), Message::human("Capital of France?")]);
        assert!(tools.contains(&"add".to_string()));
    }

    #[tokio::test]
    async fn test_tool_results_loop_back() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![
            tool_call("call_1", "add", r#"{"a": 2, "b": 3}"#),
            tool_call("call_2", "multiply", r#"{"a": 5, "b": 4}"#),
            Message::assistant("20"),
        ]));

        let run = graph(model.clone(), dir.path())
            .invoke(vec![Message::human("(2+3)*4?")])
            .await
            .unwrap();

        assert_eq!(run.final_content(), "20");
        assert_eq!(run.iterations, 3);
        assert_eq!(run.tool_calls.len(), 2);
        assert_eq!(run.tool_calls[0].result, "5");
        assert_eq!(run.tool_calls[1].to_string(), r#"multiply({"a": 5, "b": 4})"#);

        // The second model call sees the first tool result
        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[1].0.last(), Some(&Message::tool("call_1", "add", "5")));
    }

    #[tokio::test]
    async fn test_bad_tool_call_becomes_message() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(ScriptedModel::new(vec![
            tool_call("call_1", "teleport", "{}"),
            Message::assistant("done"),
        ]));

        let run = graph(model, dir.path())
            .invoke(vec![Message::human("q")])
            .await
            .unwrap();

        assert_eq!(run.final_content(), "done");
        assert_eq!(run.tool_calls[0].result, "Failed to parse tool call: Unknown tool: teleport");
    }

    #[tokio::test]
    async fn test_recursion_limit() {
        let dir = tempfile::tempdir().unwrap();
        let replies = (0..10)
            .map(|i| tool_call(&format!("call_{i}"), "add", r#"{"a": 1, "b": 1}"#))
            .collect();
        let model = Arc::new(ScriptedModel::new(replies));

        // retriever + (assistant + tools) * 2 = 5 steps, the sixth fails
        let err = graph(model.clone(), dir.path())
            .with_recursion_limit(5)
            .invoke(vec![Message::human("loop")])
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Recursion limit of 5"));
        assert_eq!(model.request_count(), 2);
    }

    #[tokio::test]
    async fn test_retriever_appends_example() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = Arc::new(LetterEmbedder);
        let store = Arc::new(MemoryVectorStore::new());
        let content = SimilarExample::page_content_for("How many albums?", "3");
        store
            .add_documents(&[Document::new(
                "task-1",
                content.clone(),
                embedder.embed("How many albums?").await.unwrap(),
            )])
            .await
            .unwrap();

        let model = Arc::new(ScriptedModel::new(vec![Message::assistant("4")]));
        graph(model.clone(), dir.path())
            .with_retriever(Retriever::new(embedder, store))
            .invoke(vec![Message::human("How many singles?")])
            .await
            .unwrap();

        let requests = model.requests.lock().unwrap();
        assert_eq!(
            requests[0].0,
            vec![
                Message::system("SYSTEM"),
                Message::human("How many singles?"),
                Message::human(format!(
                    "Here I provide a similar question and answer for reference: \n\n{}",
                    content
                )),
            ]
        );
    }

    #[test]
    fn test_tools_condition() {
        assert_eq!(tools_condition(&[Message::assistant("x")]), Route::End);
        assert_eq!(tools_condition(&[tool_call("c", "add", "{}")]), Route::Tools);
        assert_eq!(tools_condition(&[]), Route::End);
    }
}
