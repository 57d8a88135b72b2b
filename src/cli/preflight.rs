//! Pre-flight checks before expensive operations.
//!
//! Validates that credentials are available before starting operations
//! that would otherwise fail midway.

use crate::config::{credentials, Settings, VectorStoreProvider};
use crate::error::{Result, SvarError};
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering needs model credentials and a reachable vector store.
    Answer,
    /// Indexing needs embedding credentials and a vector store.
    Index,
}

/// Run pre-flight checks for the given operation.
pub fn check<F>(operation: Operation, settings: &Settings, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Operation::Answer = operation {
        credentials::resolve_model_credentials(&settings.model, &lookup)?;
    }
    credentials::resolve_embedding_credentials(&settings.embedding, &lookup)?;

    if settings.vector_store.provider == VectorStoreProvider::Supabase {
        if settings.vector_store.supabase_url.is_none() {
            return Err(SvarError::Config(
                "supabase_url (or SUPABASE_URL) is required for the supabase vector store"
                    .to_string(),
            ));
        }
        credentials::supabase_service_key(&lookup)?;
    }
    Ok(())
}

/// Version line of an external executable, if it runs.
pub fn executable_version(name: &str) -> Result<String> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            Ok(stdout
                .lines()
                .chain(stderr.lines())
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string())
        }
        Ok(_) => Err(SvarError::ExecutableNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SvarError::ExecutableNotFound(name.to_string()))
        }
        Err(e) => Err(SvarError::ExecutableNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelProvider;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |k| pairs.iter().find(|(key, _)| *key == k).map(|(_, v)| v.to_string())
    }

    #[test]
    fn test_answer_requires_model_credentials() {
        let mut settings = Settings::default();
        settings.model.provider = ModelProvider::Groq;
        settings.vector_store.provider = VectorStoreProvider::Memory;

        let err = check(Operation::Answer, &settings, lookup(&[("HF_TOKEN", "hf_x")])).unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));

        let ok = check(
            Operation::Answer,
            &settings,
            lookup(&[("HF_TOKEN", "hf_x"), ("GROQ_API_KEY", "gsk")]),
        );
        assert!(ok.is_ok());
    }

    #[test]
    fn test_supabase_requires_url_and_key() {
        let mut settings = Settings::default();
        settings.vector_store.provider = VectorStoreProvider::Supabase;
        settings.vector_store.supabase_url = None;

        let err = check(Operation::Index, &settings, lookup(&[("HF_TOKEN", "hf_x")])).unwrap_err();
        assert!(err.to_string().contains("supabase_url"));

        settings.vector_store.supabase_url = Some("https://x.supabase.co".to_string());
        let err = check(Operation::Index, &settings, lookup(&[("HF_TOKEN", "hf_x")])).unwrap_err();
        assert!(err.to_string().contains("SUPABASE_SERVICE_KEY"));
    }

    #[test]
    fn test_missing_executable() {
        let err = executable_version("svar-no-such-binary").unwrap_err();
        assert!(matches!(err, SvarError::ExecutableNotFound(_)));
    }
}
