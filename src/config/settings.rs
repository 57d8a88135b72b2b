//! Configuration settings for Svar.

use crate::error::{Result, SvarError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub model: ModelSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub benchmark: BenchmarkSettings,
    pub tools: ToolSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory where task attachments are downloaded.
    pub work_dir: String,
    /// Directory for files written by tools.
    pub temp_dir: String,
    /// Optional file that receives a copy of the log output.
    pub log_file: Option<String>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.svar".to_string(),
            work_dir: "~/.svar/files".to_string(),
            temp_dir: "/tmp/svar".to_string(),
            log_file: None,
        }
    }
}

/// Hosted chat model provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    /// Groq inference (OpenAI-compatible endpoint).
    Groq,
    /// Google Gemini through its OpenAI-compatible endpoint.
    Google,
    /// Hugging Face inference router.
    #[default]
    HuggingFace,
    /// Any other OpenAI-compatible endpoint (OpenAI, xAI, DashScope).
    OpenAi,
}

impl ModelProvider {
    /// Model used when none is configured.
    pub fn default_model_id(&self) -> &'static str {
        match self {
            ModelProvider::Groq => "qwen-qwq-32b",
            ModelProvider::Google => "gemini-2.5-flash-preview-04-17",
            ModelProvider::HuggingFace => "meta-llama/Llama-3.3-70B-Instruct",
            ModelProvider::OpenAi => "gpt-4o",
        }
    }
}

impl std::str::FromStr for ModelProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(ModelProvider::Groq),
            "google" | "gemini" => Ok(ModelProvider::Google),
            "huggingface" | "hfapimodel" | "hf" => Ok(ModelProvider::HuggingFace),
            "openai" | "openai-compatible" => Ok(ModelProvider::OpenAi),
            _ => Err(format!(
                "Unknown model provider: {} (expected groq, google, huggingface or openai)",
                s
            )),
        }
    }
}

impl std::fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelProvider::Groq => write!(f, "groq"),
            ModelProvider::Google => write!(f, "google"),
            ModelProvider::HuggingFace => write!(f, "huggingface"),
            ModelProvider::OpenAi => write!(f, "openai"),
        }
    }
}

/// Chat model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub provider: ModelProvider,
    /// Model identifier. Falls back to the provider default when unset.
    pub model_id: Option<String>,
    pub temperature: f32,
    /// Overrides the provider's base URL.
    pub api_base: Option<String>,
    /// Maximum number of graph steps per question.
    pub recursion_limit: usize,
    /// Timeout for a single model request.
    pub timeout_seconds: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: ModelProvider::HuggingFace,
            model_id: None,
            temperature: 0.2,
            api_base: None,
            recursion_limit: 25,
            timeout_seconds: 300,
        }
    }
}

impl ModelSettings {
    /// Effective model identifier.
    pub fn model_id(&self) -> String {
        self.model_id
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.provider.default_model_id().to_string())
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Hugging Face feature-extraction pipeline.
    #[default]
    HuggingFace,
    /// OpenAI-compatible embeddings endpoint.
    OpenAi,
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    /// Embedding model to use.
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Overrides the provider's base URL.
    pub api_base: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::HuggingFace,
            model: "sentence-transformers/all-mpnet-base-v2".to_string(),
            dimensions: 768,
            api_base: None,
        }
    }
}

/// Vector store backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    /// Hosted Supabase table searched through a PostgREST function.
    #[default]
    Supabase,
    /// Local SQLite database.
    Sqlite,
    /// Process-local store, empty at startup.
    Memory,
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    pub provider: VectorStoreProvider,
    /// Supabase project URL.
    pub supabase_url: Option<String>,
    /// Table holding the reference documents.
    pub table_name: String,
    /// Similarity search function exposed by the database.
    pub query_name: String,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
    /// Number of similar examples retrieved per question.
    pub top_k: usize,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: VectorStoreProvider::Supabase,
            supabase_url: None,
            table_name: "documents".to_string(),
            query_name: "match_documents".to_string(),
            sqlite_path: "~/.svar/examples.db".to_string(),
            top_k: 1,
        }
    }
}

/// Benchmark API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkSettings {
    /// Base URL of the scoring service.
    pub api_url: String,
    /// Username submitted with the answers. Submission is skipped when unset.
    pub username: Option<String>,
    /// Link to the agent's code submitted with the answers.
    pub agent_code: Option<String>,
    /// JSON answer key used for local scoring.
    pub answer_key_path: Option<String>,
    pub questions_timeout_seconds: u64,
    pub submit_timeout_seconds: u64,
}

impl Default for BenchmarkSettings {
    fn default() -> Self {
        Self {
            api_url: "https://agents-course-unit4-scoring.hf.space".to_string(),
            username: None,
            agent_code: None,
            answer_key_path: None,
            questions_timeout_seconds: 15,
            submit_timeout_seconds: 60,
        }
    }
}

/// Tool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Model used by the image, audio and video analysis tools.
    pub multimodal_model: String,
    /// Speech-to-text model used by the audio analysis tool.
    pub transcription_model: String,
    pub web_search_max_results: usize,
    pub wiki_max_docs: usize,
    pub arxiv_max_docs: usize,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            multimodal_model: "gemini-2.5-flash-preview-04-17".to_string(),
            transcription_model: "whisper-large-v3".to_string(),
            web_search_max_results: 3,
            wiki_max_docs: 2,
            arxiv_max_docs: 3,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// File holding the system prompt.
    pub system_prompt_path: Option<String>,
    /// TOML file overriding the question templates.
    pub templates_path: Option<String>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            system_prompt_path: Some("system_prompt.txt".to_string()),
            templates_path: None,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file and the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    /// Apply environment overrides. `lookup` returns the value of a variable.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(provider) = var("AGENT_MODEL_TYPE") {
            self.model.provider = provider.parse().map_err(SvarError::Config)?;
        }
        if let Some(model_id) = var("AGENT_MODEL_ID") {
            self.model.model_id = Some(model_id);
        }
        if let Some(temperature) = var("AGENT_TEMPERATURE") {
            self.model.temperature = temperature.parse().map_err(|_| {
                SvarError::Config(format!("AGENT_TEMPERATURE is not a number: {}", temperature))
            })?;
        }
        if let Some(url) = var("SUPABASE_URL") {
            self.vector_store.supabase_url = Some(url);
        }
        if let Some(space_id) = var("SPACE_ID") {
            if self.benchmark.agent_code.is_none() {
                self.benchmark.agent_code = Some(crate::benchmark::agent_code_url(&space_id));
            }
        }
        if let Some(username) = var("HF_USERNAME") {
            self.benchmark.username = Some(username);
        }

        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("svar")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded attachment directory path.
    pub fn work_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.work_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }

    /// Load the prompt templates named by these settings.
    ///
    /// `SYSTEM_PROMPT` in the environment replaces the system prompt file.
    pub fn prompts(&self) -> Result<super::Prompts> {
        let system_path = self.prompts.system_prompt_path.as_deref().map(Self::expand_path);
        let templates_path = self.prompts.templates_path.as_deref().map(Self::expand_path);
        super::Prompts::load(
            std::env::var("SYSTEM_PROMPT").ok(),
            system_path.as_deref(),
            templates_path.as_deref(),
        )
    }

    /// Get the expanded log file path, if any.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.general.log_file.as_deref().map(Self::expand_path)
    }
}
