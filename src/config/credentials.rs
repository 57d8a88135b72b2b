//! Credential resolution from the environment.
//!
//! Credentials are never stored in the configuration file. Missing model
//! credentials are fatal at startup; tool credentials are optional and only
//! checked when the tool runs.

use super::settings::{EmbeddingProvider, EmbeddingSettings, ModelProvider, ModelSettings};
use crate::error::{Result, SvarError};

/// Environment variables the agent reads credentials and overrides from.
pub const ENVIRONMENT_VARIABLES: &[&str] = &[
    "HF_TOKEN",
    "HUGGINGFACEHUB_API_TOKEN",
    "GROQ_API_KEY",
    "GEMINI_API_KEY",
    "OPENAI_API_KEY",
    "XAI_API_KEY",
    "DASHSCOPE_API_KEY",
    "AGENT_MODEL_TYPE",
    "AGENT_MODEL_ID",
    "AGENT_TEMPERATURE",
    "AGENT_API_BASE",
    "SUPABASE_URL",
    "SUPABASE_SERVICE_KEY",
    "TAVILY_API_KEY",
    "SYSTEM_PROMPT",
    "SPACE_ID",
];

const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const GOOGLE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
const HUGGINGFACE_API_BASE: &str = "https://router.huggingface.co/v1";
const HUGGINGFACE_INFERENCE_BASE: &str = "https://router.huggingface.co/hf-inference/models";
const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const XAI_API_BASE: &str = "https://api.x.ai/v1";
const DASHSCOPE_API_BASE: &str = "https://dashscope-intl.aliyuncs.com/compatible-mode/v1";

/// An API key paired with the endpoint it is valid for.
#[derive(Clone)]
pub struct ApiCredentials {
    pub api_key: String,
    pub api_base: String,
    /// Environment variable the key came from.
    pub source: &'static str,
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("source", &self.source)
            .finish()
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

fn first_of<F>(lookup: &F, keys: &[&'static str]) -> Option<(&'static str, String)>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .find_map(|key| non_empty(lookup, key).map(|value| (*key, value)))
}

/// Resolve the chat model's credentials for the configured provider.
pub fn resolve_model_credentials<F>(settings: &ModelSettings, lookup: F) -> Result<ApiCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    let (source, api_key, default_base) = match settings.provider {
        ModelProvider::Groq => {
            let (source, key) = first_of(&lookup, &["GROQ_API_KEY"]).ok_or_else(|| {
                SvarError::MissingCredentials("GROQ_API_KEY is required for the groq provider".into())
            })?;
            (source, key, GROQ_API_BASE.to_string())
        }
        ModelProvider::Google => {
            let (source, key) = first_of(&lookup, &["GEMINI_API_KEY"]).ok_or_else(|| {
                SvarError::MissingCredentials(
                    "GEMINI_API_KEY is required for the google provider".into(),
                )
            })?;
            (source, key, GOOGLE_API_BASE.to_string())
        }
        ModelProvider::HuggingFace => {
            let (source, key) = first_of(&lookup, &["HF_TOKEN", "HUGGINGFACEHUB_API_TOKEN"])
                .ok_or_else(|| {
                    SvarError::MissingCredentials(
                        "HF_TOKEN or HUGGINGFACEHUB_API_TOKEN is required for the huggingface provider"
                            .into(),
                    )
                })?;
            (source, key, HUGGINGFACE_API_BASE.to_string())
        }
        ModelProvider::OpenAi => {
            let (source, key) =
                first_of(&lookup, &["DASHSCOPE_API_KEY", "XAI_API_KEY", "OPENAI_API_KEY"])
                    .ok_or_else(|| {
                        SvarError::MissingCredentials(
                            "No API credentials found for an OpenAI-compatible service \
                             (set DASHSCOPE_API_KEY, XAI_API_KEY or OPENAI_API_KEY)"
                                .into(),
                        )
                    })?;
            let base = match source {
                "DASHSCOPE_API_KEY" => non_empty(&lookup, "DASHSCOPE_API_BASE")
                    .unwrap_or_else(|| DASHSCOPE_API_BASE.to_string()),
                "XAI_API_KEY" => {
                    non_empty(&lookup, "XAI_API_BASE").unwrap_or_else(|| XAI_API_BASE.to_string())
                }
                _ => non_empty(&lookup, "AGENT_API_BASE")
                    .unwrap_or_else(|| OPENAI_API_BASE.to_string()),
            };
            (source, key, base)
        }
    };

    Ok(ApiCredentials {
        api_key,
        api_base: settings.api_base.clone().unwrap_or(default_base),
        source,
    })
}

/// Resolve the embedder's credentials.
pub fn resolve_embedding_credentials<F>(
    settings: &EmbeddingSettings,
    lookup: F,
) -> Result<ApiCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    let (keys, default_base): (&[&'static str], &str) = match settings.provider {
        EmbeddingProvider::HuggingFace => (
            &["HF_TOKEN", "HUGGINGFACEHUB_API_TOKEN"],
            HUGGINGFACE_INFERENCE_BASE,
        ),
        EmbeddingProvider::OpenAi => (&["OPENAI_API_KEY"], OPENAI_API_BASE),
    };

    let (source, api_key) = first_of(&lookup, keys).ok_or_else(|| {
        SvarError::MissingCredentials(format!(
            "{} is required for embeddings",
            keys.join(" or ")
        ))
    })?;

    Ok(ApiCredentials {
        api_key,
        api_base: settings
            .api_base
            .clone()
            .unwrap_or_else(|| default_base.to_string()),
        source,
    })
}

/// Service key for the Supabase project.
pub fn supabase_service_key<F>(lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(&lookup, "SUPABASE_SERVICE_KEY").ok_or_else(|| {
        SvarError::MissingCredentials("SUPABASE_SERVICE_KEY is required for the supabase vector store".into())
    })
}

/// Read a variable from the process environment.
pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
