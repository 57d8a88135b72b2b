//! Doctor command - verify credentials, external tools and configuration.

use crate::cli::preflight::executable_version;
use crate::cli::Output;
use crate::config::{credentials, Settings, VectorStoreProvider, ENVIRONMENT_VARIABLES};
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Svar Doctor");
    println!();

    println!("{}", style("Environment").bold());
    for line in environment_report(credentials::env_lookup) {
        println!("  {}", line);
    }
    println!();

    let mut checks = Vec::new();

    println!("{}", style("Credentials").bold());
    let credential_checks = check_credentials(settings, credentials::env_lookup);
    for check in &credential_checks {
        check.print();
    }
    checks.extend(credential_checks);
    println!();

    println!("{}", style("External Tools").bold());
    for (name, hint) in [
        ("tesseract", "Needed by extract_text_from_image. Install tesseract-ocr."),
        ("yt-dlp", "Needed by youtube_analysis. Install with: pip install yt-dlp"),
    ] {
        let check = match executable_version(name) {
            Ok(version) => CheckResult::ok(name, &version),
            Err(e) => CheckResult::warning(name, &e.to_string(), hint),
        };
        check.print();
        checks.push(check);
    }
    println!();

    println!("{}", style("Configuration").bold());
    let config_path = Settings::default_config_path();
    let config_check = if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create {} to override defaults", config_path.display()),
        )
    };
    config_check.print();
    checks.push(config_check);
    Output::kv("Model", &format!("{} ({})", settings.model.model_id(), settings.model.provider));
    Output::kv("Embedding", &settings.embedding.model);
    Output::kv("Work dir", &settings.work_dir().display().to_string());
    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before running the agent.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Svar is ready to use.");
    }

    Ok(())
}

/// One `[SET]`/`[NOT SET]` line per known environment variable. Values are
/// never printed.
fn environment_report<F>(lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    ENVIRONMENT_VARIABLES
        .iter()
        .map(|key| {
            let set = lookup(key).is_some_and(|v| !v.trim().is_empty());
            format!("{}: {}", key, if set { "[SET]" } else { "[NOT SET]" })
        })
        .collect()
}

fn check_credentials<F>(settings: &Settings, lookup: F) -> Vec<CheckResult>
where
    F: Fn(&str) -> Option<String>,
{
    let mut results = Vec::new();

    results.push(
        match credentials::resolve_model_credentials(&settings.model, &lookup) {
            Ok(creds) => CheckResult::ok("Model", &format!("key from {}", creds.source)),
            Err(e) => CheckResult::error("Model", &e.to_string(), "Set the key for the configured provider"),
        },
    );

    results.push(
        match credentials::resolve_embedding_credentials(&settings.embedding, &lookup) {
            Ok(creds) => CheckResult::ok("Embedding", &format!("key from {}", creds.source)),
            Err(e) => CheckResult::error("Embedding", &e.to_string(), "Set HF_TOKEN or OPENAI_API_KEY"),
        },
    );

    if settings.vector_store.provider == VectorStoreProvider::Supabase {
        let store = match (
            settings.vector_store.supabase_url.as_deref(),
            credentials::supabase_service_key(&lookup),
        ) {
            (Some(url), Ok(_)) => CheckResult::ok("Supabase", url),
            (None, _) => CheckResult::error("Supabase", "no URL", "Set SUPABASE_URL"),
            (Some(_), Err(e)) => CheckResult::error("Supabase", &e.to_string(), "Set SUPABASE_SERVICE_KEY"),
        };
        results.push(store);
    }

    results.push(match lookup("TAVILY_API_KEY").filter(|v| !v.trim().is_empty()) {
        Some(_) => CheckResult::ok("Web search", "TAVILY_API_KEY set"),
        None => CheckResult::warning(
            "Web search",
            "TAVILY_API_KEY not set",
            "web_search will report an error when called",
        ),
    });

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelProvider;

    fn lookup(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |k| pairs.iter().find(|(key, _)| *key == k).map(|(_, v)| v.to_string())
    }

    #[test]
    fn test_environment_report_never_prints_values() {
        let report = environment_report(lookup(&[("GROQ_API_KEY", "gsk_secret"), ("HF_TOKEN", " ")]));
        assert!(report.contains(&"GROQ_API_KEY: [SET]".to_string()));
        assert!(report.contains(&"HF_TOKEN: [NOT SET]".to_string()));
        assert!(report.iter().all(|line| !line.contains("gsk_secret")));
        assert_eq!(report.len(), ENVIRONMENT_VARIABLES.len());
    }

    #[test]
    fn test_missing_model_key_is_an_error() {
        let mut settings = Settings::default();
        settings.model.provider = ModelProvider::Groq;
        settings.vector_store.provider = VectorStoreProvider::Memory;

        let checks = check_credentials(&settings, lookup(&[("HF_TOKEN", "hf_x")]));
        assert_eq!(checks[0].status, CheckStatus::Error);
        assert_eq!(checks[1].status, CheckStatus::Ok);
        assert_eq!(checks.last().map(|c| &c.status), Some(&CheckStatus::Warning));
    }

    #[test]
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }
}
