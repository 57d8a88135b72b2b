//! Chat model abstraction.
//!
//! The agent graph talks to a [`ChatModel`], which receives the full message
//! log plus the tools it may call and returns the next assistant message.

mod openai;

pub use openai::{OpenAICompatibleModel, OpenAICompatibleTranscriber};

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A role-tagged entry in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Message {
    System {
        content: String,
    },
    Human {
        content: String,
        /// Image URLs (usually `data:` URLs) sent alongside the text.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        images: Vec<String>,
    },
    Assistant {
        content: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCallRequest>,
    },
    Tool {
        tool_call_id: String,
        name: String,
        content: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
        }
    }

    pub fn human(content: impl Into<String>) -> Self {
        Message::Human {
            content: content.into(),
            images: Vec::new(),
        }
    }

    /// Human message carrying text and one image.
    pub fn human_with_image(content: impl Into<String>, image_url: impl Into<String>) -> Self {
        Message::Human {
            content: content.into(),
            images: vec![image_url.into()],
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Message::Tool {
            tool_call_id: tool_call_id.into(),
            name: name.into(),
            content: content.into(),
        }
    }

    /// Text content of the message.
    pub fn content(&self) -> &str {
        match self {
            Message::System { content }
            | Message::Human { content, .. }
            | Message::Assistant { content, .. }
            | Message::Tool { content, .. } => content,
        }
    }

    /// Tool calls requested by an assistant message. Empty for other roles.
    pub fn tool_calls(&self) -> &[ToolCallRequest] {
        match self {
            Message::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }

    /// Role label used in logs.
    pub fn role(&self) -> &'static str {
        match self {
            Message::System { .. } => "System",
            Message::Human { .. } => "Human",
            Message::Assistant { .. } => "Ai",
            Message::Tool { .. } => "Tool",
        }
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let title = format!(" {} Message ", self.role());
        writeln!(f, "{:=^64}", title)?;
        if let Message::Tool { name, .. } = self {
            writeln!(f, "Name: {}", name)?;
        }
        if !self.content().is_empty() {
            writeln!(f, "{}", self.content())?;
        }
        for call in self.tool_calls() {
            writeln!(f, "Tool call: {}", call)?;
        }
        Ok(())
    }
}

/// A structured request from the model to invoke a named function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub id: String,
    pub name: String,
    /// JSON-encoded arguments.
    pub arguments: String,
}

impl std::fmt::Display for ToolCallRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({}) [{}]", self.name, self.arguments, self.id)
    }
}

/// A function the model may call, described by a JSON schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Trait for chat models that support tool calling.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Produce the next assistant message for the conversation.
    async fn invoke(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<Message>;

    /// Identifier of the underlying model.
    fn model_id(&self) -> &str;
}

/// Speech-to-text service.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an audio file to plain text.
    async fn transcribe(&self, audio_path: &Path) -> Result<String>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted model for exercising code that drives a [`ChatModel`].

    use super::*;
    use crate::error::SvarError;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned assistant messages and records every request.
    pub struct ScriptedModel {
        replies: Mutex<VecDeque<Message>>,
        pub requests: Mutex<Vec<(Vec<Message>, Vec<String>)>>,
    }

    impl ScriptedModel {
        pub fn new(replies: Vec<Message>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn invoke(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<Message> {
            self.requests.lock().unwrap().push((
                messages.to_vec(),
                tools.iter().map(|t| t.name.clone()).collect(),
            ));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| SvarError::Model("script exhausted".to_string()))
        }

        fn model_id(&self) -> &str {
            "scripted"
        }
    }

    /// Assistant message requesting a single tool call.
    pub fn tool_call(id: &str, name: &str, arguments: &str) -> Message {
        Message::Assistant {
            content: String::new(),
            tool_calls: vec![ToolCallRequest {
                id: id.to_string(),
                name: name.to_string(),
                arguments: arguments.to_string(),
            }],
        }
    }
}
