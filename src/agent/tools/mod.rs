//! Tools the model can call while answering a question.
//!
//! Every tool result is a plain string fed back as a tool message. Failures
//! become `Tool error: ...` strings instead of aborting the run.

mod files;
mod math;
mod media;
mod search;

pub use search::SearchEndpoints;

use crate::config::{credentials, ModelProvider, Settings, ToolSettings};
use crate::error::{Result, SvarError};
use crate::model::{ChatModel, OpenAICompatibleModel, OpenAICompatibleTranscriber, ToolSpec, Transcriber};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Available tools for the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ToolCall {
    Add { a: i64, b: i64 },
    #[serde(alias = "substract")]
    Subtract { a: i64, b: i64 },
    Multiply { a: i64, b: i64 },
    Divide { a: i64, b: i64 },
    Modulus { a: i64, b: i64 },

    WikiSearch { query: String },
    WebSearch { query: String },
    ArxivSearch { query: String },

    DownloadFileFromUrl {
        url: String,
        #[serde(default)]
        filename: Option<String>,
    },
    SaveAndReadFile {
        content: String,
        #[serde(default)]
        filename: Option<String>,
    },
    AnalyzeCsvFile {
        file_path: String,
        /// Accepted for compatibility; the summary always covers every column.
        #[serde(default)]
        query: Option<String>,
    },
    AnalyzeExcelFile {
        file_path: String,
        #[serde(default)]
        query: Option<String>,
    },

    ExtractTextFromImage { image_path: String },
    ImageAnalysis { question: String, file_path: String },
    AudioAnalysis { question: String, file_path: String },
    YoutubeAnalysis { question: String, url: String },
    SummarizeText {
        text: String,
        #[serde(default = "default_summary_length")]
        max_length: u32,
    },
}

fn default_summary_length() -> u32 {
    200
}

/// Runs the tool calls requested by the model.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Tools to advertise to the model.
    fn specs(&self) -> Vec<ToolSpec>;

    /// Run one call and return the text handed back to the model.
    async fn call(&self, name: &str, arguments: &str) -> String;
}

/// Tool execution context: HTTP client, scratch directory and the models
/// some tools delegate to.
pub struct ToolContext {
    pub(crate) http: reqwest::Client,
    pub(crate) endpoints: SearchEndpoints,
    pub(crate) tavily_api_key: Option<String>,
    pub(crate) settings: ToolSettings,
    pub(crate) temp_dir: PathBuf,
    pub(crate) model: Option<Arc<dyn ChatModel>>,
    pub(crate) vision: Option<Arc<dyn ChatModel>>,
    pub(crate) transcriber: Option<Arc<dyn Transcriber>>,
}

impl ToolContext {
    /// Context with only the self-contained tools wired up.
    pub fn new(settings: ToolSettings, temp_dir: PathBuf) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("svar/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http,
            endpoints: SearchEndpoints::default(),
            tavily_api_key: None,
            settings,
            temp_dir,
            model: None,
            vision: None,
            transcriber: None,
        })
    }

    /// Wire up every tool the environment has credentials for.
    ///
    /// `model` is the agent's own chat model, reused for summaries and for
    /// answering over transcripts and video metadata.
    pub fn from_settings(settings: &Settings, model: Arc<dyn ChatModel>) -> Result<Self> {
        let lookup = credentials::env_lookup;
        let timeout = Duration::from_secs(settings.model.timeout_seconds);
        let mut context = Self::new(settings.tools.clone(), settings.temp_dir())?
            .with_model(model);

        context.tavily_api_key = lookup("TAVILY_API_KEY").filter(|k| !k.trim().is_empty());
        if context.tavily_api_key.is_none() {
            warn!("TAVILY_API_KEY not set; web_search will fail");
        }

        let mut vision_settings = settings.model.clone();
        vision_settings.provider = ModelProvider::Google;
        vision_settings.api_base = None;
        match credentials::resolve_model_credentials(&vision_settings, lookup) {
            Ok(creds) => {
                let vision = OpenAICompatibleModel::new(
                    &creds,
                    &settings.tools.multimodal_model,
                    0.0,
                    timeout,
                )?;
                context.vision = Some(Arc::new(vision));
            }
            Err(_) => warn!("GEMINI_API_KEY not set; image_analysis will fail"),
        }

        let mut speech_settings = settings.model.clone();
        speech_settings.provider = ModelProvider::Groq;
        speech_settings.api_base = None;
        match credentials::resolve_model_credentials(&speech_settings, lookup) {
            Ok(creds) => {
                let transcriber = OpenAICompatibleTranscriber::new(
                    &creds,
                    &settings.tools.transcription_model,
                    timeout,
                )?;
                context.transcriber = Some(Arc::new(transcriber));
            }
            Err(_) => warn!("GROQ_API_KEY not set; audio_analysis will fail"),
        }

        Ok(context)
    }

    pub fn with_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_vision_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.vision = Some(model);
        self
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn with_endpoints(mut self, endpoints: SearchEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_tavily_api_key(mut self, key: impl Into<String>) -> Self {
        self.tavily_api_key = Some(key.into());
        self
    }

    /// Execute a tool call and return the result as a string.
    pub async fn execute(&self, tool: &ToolCall) -> Result<String> {
        match tool {
            ToolCall::Add { a, b } => math::add(*a, *b),
            ToolCall::Subtract { a, b } => math::subtract(*a, *b),
            ToolCall::Multiply { a, b } => math::multiply(*a, *b),
            ToolCall::Divide { a, b } => math::divide(*a, *b),
            ToolCall::Modulus { a, b } => math::modulus(*a, *b),
            ToolCall::WikiSearch { query } => self.wiki_search(query).await,
            ToolCall::WebSearch { query } => self.web_search(query).await,
            ToolCall::ArxivSearch { query } => self.arxiv_search(query).await,
            ToolCall::DownloadFileFromUrl { url, filename } => {
                self.download_file_from_url(url, filename.as_deref()).await
            }
            ToolCall::SaveAndReadFile { content, filename } => {
                self.save_and_read_file(content, filename.as_deref()).await
            }
            ToolCall::AnalyzeCsvFile { file_path, .. } => {
                files::analyze_table_file(file_path, files::analyze_csv_file).await
            }
            ToolCall::AnalyzeExcelFile { file_path, .. } => {
                files::analyze_table_file(file_path, files::analyze_excel_file).await
            }
            ToolCall::ExtractTextFromImage { image_path } => {
                media::extract_text_from_image(image_path).await
            }
            ToolCall::ImageAnalysis {
                question,
                file_path,
            } => self.image_analysis(question, file_path).await,
            ToolCall::AudioAnalysis {
                question,
                file_path,
            } => self.audio_analysis(question, file_path).await,
            ToolCall::YoutubeAnalysis { question, url } => {
                self.youtube_analysis(question, url).await
            }
            ToolCall::SummarizeText { text, max_length } => {
                self.summarize_text(text, *max_length).await
            }
        }
    }

    pub(crate) fn chat_model(&self) -> Result<&Arc<dyn ChatModel>> {
        self.model
            .as_ref()
            .ok_or_else(|| SvarError::Tool("No chat model configured for this tool".to_string()))
    }

    async fn summarize_text(&self, text: &str, max_length: u32) -> Result<String> {
        let prompt = format!("Summarize the following in <={} words:\n\n{}", max_length, text);
        let reply = self
            .chat_model()?
            .invoke(&[crate::model::Message::human(prompt)], &[])
            .await?;
        Ok(reply.content().to_string())
    }
}

#[async_trait]
impl ToolExecutor for ToolContext {
    fn specs(&self) -> Vec<ToolSpec> {
        tool_definitions()
    }

    async fn call(&self, name: &str, arguments: &str) -> String {
        info!("Agent calling tool: {} with args: {}", name, arguments);

        match parse_tool_call(name, arguments) {
            Ok(tool) => match self.execute(&tool).await {
                Ok(output) => output,
                Err(e) => format!("Tool error: {}", describe(e)),
            },
            Err(e) => format!("Failed to parse tool call: {}", describe(e)),
        }
    }
}

fn describe(error: SvarError) -> String {
    match error {
        SvarError::Tool(message) => message,
        other => other.to_string(),
    }
}

/// Parse a tool call from the model's function name and JSON arguments.
pub fn parse_tool_call(name: &str, arguments: &str) -> Result<ToolCall> {
    let arguments = if arguments.trim().is_empty() { "{}" } else { arguments };
    let mut args: serde_json::Value = serde_json::from_str(arguments)
        .map_err(|e| SvarError::Tool(format!("Invalid tool arguments: {}", e)))?;

    if !tool_definitions().iter().any(|t| t.name == name) && name != "substract" {
        return Err(SvarError::Tool(format!("Unknown tool: {}", name)));
    }

    let object = args
        .as_object_mut()
        .ok_or_else(|| SvarError::Tool("Tool arguments must be a JSON object".to_string()))?;
    object.insert("name".to_string(), json!(name));

    serde_json::from_value(args)
        .map_err(|e| SvarError::Tool(format!("Invalid arguments for {}: {}", name, e)))
}

fn spec(name: &str, description: &str, parameters: serde_json::Value) -> ToolSpec {
    ToolSpec {
        name: name.to_string(),
        description: description.to_string(),
        parameters,
    }
}

fn two_integers() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "a": { "type": "integer", "description": "first int" },
            "b": { "type": "integer", "description": "second int" }
        },
        "required": ["a", "b"]
    })
}

fn query_only() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "query": { "type": "string", "description": "The search query." }
        },
        "required": ["query"]
    })
}

fn question_and(field: &str, description: &str) -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "question": { "type": "string", "description": "The question to answer" },
            field: { "type": "string", "description": description }
        },
        "required": ["question", field]
    })
}

/// Function definitions advertised to the model.
pub fn tool_definitions() -> Vec<ToolSpec> {
    vec![
        spec("add", "Add two integer numbers.", two_integers()),
        spec("subtract", "Subtract two integer numbers.", two_integers()),
        spec("multiply", "Multiply two integer numbers.", two_integers()),
        spec("divide", "Divide two integer numbers.", two_integers()),
        spec("modulus", "Get the modulus of two integer numbers.", two_integers()),
        spec(
            "wiki_search",
            "Search Wikipedia for a query and return maximum 2 results.",
            query_only(),
        ),
        spec(
            "web_search",
            "Search Tavily for a query and return maximum 3 results.",
            query_only(),
        ),
        spec(
            "arxiv_search",
            "Search Arxiv for a query and return maximum 3 results.",
            query_only(),
        ),
        spec(
            "download_file_from_url",
            "Download a file from a URL and save it to a temporary location. Returns the local path.",
            json!({
                "type": "object",
                "properties": {
                    "url": { "type": "string", "description": "The URL to download" },
                    "filename": { "type": "string", "description": "Optional file name to save as" }
                },
                "required": ["url"]
            }),
        ),
        spec(
            "save_and_read_file",
            "Save content to a temporary file and return the path.",
            json!({
                "type": "object",
                "properties": {
                    "content": { "type": "string", "description": "Text to write" },
                    "filename": { "type": "string", "description": "Optional file name" }
                },
                "required": ["content"]
            }),
        ),
        spec(
            "analyze_csv_file",
            "Load a CSV file and return its row count, column names and per-column summary statistics.",
            json!({
                "type": "object",
                "properties": {
                    "file_path": { "type": "string", "description": "Path to the CSV file" },
                    "query": { "type": "string", "description": "Optional note about what to look for" }
                },
                "required": ["file_path"]
            }),
        ),
        spec(
            "analyze_excel_file",
            "Load the first sheet of an Excel file and return its row count, column names and per-column summary statistics.",
            json!({
                "type": "object",
                "properties": {
                    "file_path": { "type": "string", "description": "Path to the Excel file" },
                    "query": { "type": "string", "description": "Optional note about what to look for" }
                },
                "required": ["file_path"]
            }),
        ),
        spec(
            "extract_text_from_image",
            "Extract text from an image file using OCR.",
            json!({
                "type": "object",
                "properties": {
                    "image_path": { "type": "string", "description": "Path to the image file" }
                },
                "required": ["image_path"]
            }),
        ),
        spec(
            "image_analysis",
            "Given a question and an image file, analyze the image to answer the question.",
            question_and("file_path", "The image file path"),
        ),
        spec(
            "audio_analysis",
            "Given a question and a local audio file, transcribe the audio and answer the question.",
            question_and("file_path", "The audio file path"),
        ),
        spec(
            "youtube_analysis",
            "Given a question and a YouTube URL, analyze the video metadata to answer the question.",
            question_and("url", "The YouTube video URL"),
        ),
        spec(
            "summarize_text",
            "Summarize text using the agent's language model.",
            json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string", "description": "The text to summarize" },
                    "max_length": {
                        "type": "integer",
                        "description": "Maximum summary length in words (default: 200)",
                        "default": 200
                    }
                },
                "required": ["text"]
            }),
        ),
    ]
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Context with default settings and a scratch directory.
    pub fn context(temp_dir: &std::path::Path) -> ToolContext {
        ToolContext::new(ToolSettings::default(), temp_dir.to_path_buf()).unwrap()
    }
}
