//! Svar - benchmark question-answering agent
//!
//! Answers benchmark questions with a tool-calling chat model. Before the
//! model sees a question, the most similar solved question is retrieved from
//! a vector store and shown to it as an example. Final answers are
//! normalized so they can be compared by exact match, then submitted to a
//! scoring API and optionally scored locally against an answer key.
//!
//! # Architecture
//!
//! - `config` - Settings, prompt templates and credential resolution
//! - `model` - Chat model and speech-to-text abstraction
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction (Supabase, SQLite, memory)
//! - `retrieval` - Similar-example lookup and reference indexing
//! - `agent` - Agent graph, tools, prompt builder and answer normalizer
//! - `benchmark` - Scoring API client and local scoring
//! - `evaluation` - Run-and-submit harness
//!
//! # Example
//!
//! ```rust,no_run
//! use svar::agent::{Agent, Answerer};
//! use svar::config::Settings;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let agent = Agent::from_settings(&settings)?;
//!
//!     let answer = agent.answer_question("What is 6 times 7?", None).await;
//!     println!("{}", answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod benchmark;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod openai;
pub mod retrieval;
pub mod vector_store;

pub use error::{Result, SvarError};
