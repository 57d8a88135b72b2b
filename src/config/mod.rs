//! Configuration module for Svar.
//!
//! Handles loading settings, prompt templates and credentials.

pub mod credentials;
mod prompts;
mod settings;

pub use credentials::{ApiCredentials, ENVIRONMENT_VARIABLES};
pub use prompts::{Prompts, QuestionPrompts};
pub use settings::{
    BenchmarkSettings, EmbeddingProvider, EmbeddingSettings, GeneralSettings, ModelProvider,
    ModelSettings, PromptSettings, Settings, ToolSettings, VectorStoreProvider,
    VectorStoreSettings,
};
