//! The question answering agent.
//!
//! A question is turned into a prompt, run through the retrieve → assist →
//! tools loop, and the model's final text is normalized for exact-match
//! scoring.

mod graph;
mod normalize;
mod prompt;
mod runner;
mod tools;

pub use graph::{AgentGraph, GraphRun, ToolCallRecord, DEFAULT_RECURSION_LIMIT};
pub use normalize::{normalize_answer, RawAnswer, ANSWER_PREFIXES};
pub use prompt::{build_prompt, is_reversed};
pub use runner::{Agent, Answerer, EMPTY_QUESTION_ANSWER};
pub use tools::{parse_tool_call, tool_definitions, SearchEndpoints, ToolCall, ToolContext, ToolExecutor};
