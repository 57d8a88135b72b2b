//! Chat model and speech-to-text over OpenAI-compatible endpoints.

use super::{ChatModel, Message, ToolCallRequest, ToolSpec, Transcriber};
use crate::config::ApiCredentials;
use crate::error::{Result, SvarError};
use crate::openai::create_client_with_timeout;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    AudioInput, ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImage,
    ChatCompletionRequestMessageContentPartText, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionRequestUserMessageContent, ChatCompletionRequestUserMessageContentPart,
    ChatCompletionTool, ChatCompletionToolType, CreateChatCompletionRequestArgs,
    CreateTranscriptionRequestArgs, FunctionCall, FunctionObject, ImageUrl,
};
use async_openai::Client;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};

fn build_error(e: impl std::fmt::Display) -> SvarError {
    SvarError::Model(format!("Failed to build request: {}", e))
}

/// Chat model served by any OpenAI-compatible endpoint.
pub struct OpenAICompatibleModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAICompatibleModel {
    /// Create a model client for the given endpoint.
    pub fn new(
        credentials: &ApiCredentials,
        model: &str,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(credentials, timeout)?,
            model: model.to_string(),
            temperature,
        })
    }

    fn to_request_message(message: &Message) -> Result<ChatCompletionRequestMessage> {
        let request: ChatCompletionRequestMessage = match message {
            Message::System { content } => ChatCompletionRequestSystemMessageArgs::default()
                .content(content.clone())
                .build()
                .map_err(build_error)?
                .into(),
            Message::Human { content, images } if images.is_empty() => {
                ChatCompletionRequestUserMessageArgs::default()
                    .content(content.clone())
                    .build()
                    .map_err(build_error)?
                    .into()
            }
            Message::Human { content, images } => {
                let mut parts = vec![ChatCompletionRequestUserMessageContentPart::Text(
                    ChatCompletionRequestMessageContentPartText {
                        text: content.clone(),
                    },
                )];
                parts.extend(images.iter().map(|url| {
                    ChatCompletionRequestUserMessageContentPart::ImageUrl(
                        ChatCompletionRequestMessageContentPartImage {
                            image_url: ImageUrl {
                                url: url.clone(),
                                detail: None,
                            },
                        },
                    )
                }));
                ChatCompletionRequestUserMessageArgs::default()
                    .content(ChatCompletionRequestUserMessageContent::Array(parts))
                    .build()
                    .map_err(build_error)?
                    .into()
            }
            Message::Assistant {
                content,
                tool_calls,
            } => {
                let mut args = ChatCompletionRequestAssistantMessageArgs::default();
                if !content.is_empty() {
                    args.content(content.clone());
                }
                if !tool_calls.is_empty() {
                    let calls: Vec<ChatCompletionMessageToolCall> = tool_calls
                        .iter()
                        .map(|call| ChatCompletionMessageToolCall {
                            id: call.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: call.name.clone(),
                                arguments: call.arguments.clone(),
                            },
                        })
                        .collect();
                    args.tool_calls(calls);
                }
                args.build().map_err(build_error)?.into()
            }
            Message::Tool {
                tool_call_id,
                content,
                ..
            } => ChatCompletionRequestToolMessageArgs::default()
                .tool_call_id(tool_call_id.clone())
                .content(content.clone())
                .build()
                .map_err(build_error)?
                .into(),
        };
        Ok(request)
    }

    fn to_tool_definition(spec: &ToolSpec) -> ChatCompletionTool {
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: spec.name.clone(),
                description: Some(spec.description.clone()),
                parameters: Some(spec.parameters.clone()),
                strict: None,
            },
        }
    }
}

#[async_trait]
impl ChatModel for OpenAICompatibleModel {
    #[instrument(skip(self, messages, tools), fields(model = %self.model, messages = messages.len()))]
    async fn invoke(&self, messages: &[Message], tools: &[ToolSpec]) -> Result<Message> {
        let request_messages = messages
            .iter()
            .map(Self::to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(&self.model)
            .messages(request_messages)
            .temperature(self.temperature);
        if !tools.is_empty() {
            args.tools(tools.iter().map(Self::to_tool_definition).collect::<Vec<_>>());
        }
        let request = args.build().map_err(build_error)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| SvarError::Model(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SvarError::Model("No response from model".to_string()))?;

        let tool_calls: Vec<ToolCallRequest> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| ToolCallRequest {
                id: call.id,
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect();

        debug!("Model replied with {} tool call(s)", tool_calls.len());

        Ok(Message::Assistant {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
        })
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Speech-to-text over an OpenAI-compatible transcription endpoint.
pub struct OpenAICompatibleTranscriber {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAICompatibleTranscriber {
    pub fn new(credentials: &ApiCredentials, model: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client_with_timeout(credentials, timeout)?,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Transcriber for OpenAICompatibleTranscriber {
    #[instrument(skip(self), fields(audio_path = %audio_path.display()))]
    async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        let file_bytes = tokio::fs::read(audio_path).await?;

        let request = CreateTranscriptionRequestArgs::default()
            .file(AudioInput::from_vec_u8(
                audio_path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audio.mp3")
                    .to_string(),
                file_bytes,
            ))
            .model(&self.model)
            .build()
            .map_err(build_error)?;

        let response = self
            .client
            .audio()
            .transcribe(request)
            .await
            .map_err(|e| SvarError::Model(format!("Transcription API error: {}", e)))?;

        Ok(response.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_definition_shape() {
        let spec = ToolSpec {
            name: "add".to_string(),
            description: "Add two integers.".to_string(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        };
        let tool = OpenAICompatibleModel::to_tool_definition(&spec);
        assert_eq!(tool.function.name, "add");
        assert_eq!(tool.function.description.as_deref(), Some("Add two integers."));
    }

    #[test]
    fn test_converts_every_role() {
        let messages = vec![
            Message::system("sys"),
            Message::human("q"),
            Message::human_with_image("what is this?", "data:image/png;base64,AAAA"),
            crate::model::testing::tool_call("call_1", "add", "{}"),
            Message::tool("call_1", "add", "3"),
            Message::assistant("3"),
        ];
        for message in &messages {
            assert!(OpenAICompatibleModel::to_request_message(message).is_ok());
        }
    }
}
