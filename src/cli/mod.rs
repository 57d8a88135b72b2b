//! CLI module for Svar.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Svar - benchmark question-answering agent
///
/// Answers benchmark questions with a tool-calling agent guided by a
/// similar solved example, and submits the answers for scoring.
/// The name "Svar" is the Norwegian word for "answer."
#[derive(Parser, Debug)]
#[command(name = "svar")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a single question
    Ask {
        /// The question to answer
        question: String,

        /// File attached to the question
        #[arg(short, long)]
        file: Option<String>,

        /// Print every message exchanged with the model
        #[arg(long)]
        trace: bool,
    },

    /// Answer every benchmark task and submit the answers
    Run {
        /// Username to submit under (defaults to HF_USERNAME / config)
        #[arg(short, long)]
        username: Option<String>,

        /// Only answer the first N tasks
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Start the web UI
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "7860")]
        port: u16,
    },

    /// Embed solved reference questions into the vector store
    Index {
        /// JSONL file with task_id, Question and Final answer fields
        file: String,
    },

    /// Check credentials, external tools and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_with_file() {
        let cli = Cli::try_parse_from(["svar", "-vv", "ask", "What is 2+2?", "--file", "a.png"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask { question, file, trace } => {
                assert_eq!(question, "What is 2+2?");
                assert_eq!(file.as_deref(), Some("a.png"));
                assert!(!trace);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_run_and_config() {
        let cli = Cli::try_parse_from(["svar", "run", "--limit", "3", "--config", "c.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("c.toml"));
        assert!(matches!(cli.command, Commands::Run { limit: Some(3), username: None }));

        let cli = Cli::try_parse_from(["svar", "config", "path"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { action: ConfigAction::Path }));
    }
}
