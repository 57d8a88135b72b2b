//! Web UI for running the evaluation.
//!
//! Serves a single page with a run button, a status box, a results table and
//! the local evaluation, backed by a small JSON API.

use crate::cli::Output;
use crate::config::Settings;
use crate::evaluation::{EvaluationRunner, RunOutcome};
use axum::{
    extract::State,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Agent Evaluation Runner</title>
<style>
body { font-family: sans-serif; max-width: 960px; margin: 2em auto; }
textarea { width: 100%; }
table { border-collapse: collapse; width: 100%; margin-top: 1em; }
td, th { border: 1px solid #ccc; padding: 4px; text-align: left; vertical-align: top; }
</style>
</head>
<body>
<h1>Agent Evaluation Runner</h1>
<p>Enter your username and click below to run &amp; submit all tasks.</p>
<input id="username" placeholder="Username">
<button id="run">Run Evaluation &amp; Submit All Answers</button>
<h3>Status</h3>
<textarea id="status" rows="3" readonly></textarea>
<h3>Local Evaluation</h3>
<textarea id="local" rows="2" readonly></textarea>
<h3>Results</h3>
<table><thead><tr><th>Task ID</th><th>Question</th><th>Submitted Answer</th></tr></thead>
<tbody id="results"></tbody></table>
<script>
document.getElementById("run").onclick = async () => {
  const button = document.getElementById("run");
  const status = document.getElementById("status");
  button.disabled = true;
  status.value = "Running...";
  try {
    const username = document.getElementById("username").value.trim();
    const res = await fetch("/api/run", {
      method: "POST",
      headers: { "Content-Type": "application/json" },
      body: JSON.stringify(username ? { username } : {}),
    });
    const outcome = await res.json();
    status.value = outcome.status;
    document.getElementById("local").value = outcome.local_status || "";
    const body = document.getElementById("results");
    body.innerHTML = "";
    for (const r of outcome.results) {
      const row = body.insertRow();
      for (const value of [r.task_id, r.question, r.answer]) {
        row.insertCell().textContent = value;
      }
    }
  } catch (e) {
    status.value = "Request failed: " + e;
  } finally {
    button.disabled = false;
  }
};
</script>
</body>
</html>
"#;

/// Shared application state.
struct AppState {
    runner: EvaluationRunner,
    default_username: Option<String>,
    /// Held for the duration of a run so runs never overlap.
    running: Mutex<()>,
}

/// Run the web UI server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    let state = Arc::new(AppState {
        runner: EvaluationRunner::from_settings(&settings)?,
        default_username: settings.benchmark.username.clone(),
        running: Mutex::new(()),
    });

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Svar Evaluation Runner");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("UI", "GET  /");
    Output::kv("Run", "POST /api/run");
    Output::kv("Health", "GET  /health");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/run", post(run))
        .layer(cors)
        .with_state(state)
}

#[derive(Deserialize, Default)]
struct RunRequest {
    #[serde(default)]
    username: Option<String>,
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn run(State(state): State<Arc<AppState>>, Json(req): Json<RunRequest>) -> Json<RunOutcome> {
    let _guard = state.running.lock().await;
    let username = req.username.or_else(|| state.default_username.clone());
    info!("Evaluation requested (user: {:?})", username);
    Json(state.runner.run_and_submit_all(username.as_deref()).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Answerer;
    use crate::benchmark::BenchmarkClient;
    use crate::config::BenchmarkSettings;
    use async_trait::async_trait;
    use std::path::Path;

    struct FixedAnswerer;

    #[async_trait]
    impl Answerer for FixedAnswerer {
        async fn answer_question(&self, _question: &str, _file: Option<&Path>) -> String {
            "42".to_string()
        }
    }

    async fn spawn(api_url: String, work_dir: &Path) -> String {
        let client = BenchmarkClient::new(&BenchmarkSettings {
            api_url,
            ..BenchmarkSettings::default()
        })
        .unwrap();
        let runner = EvaluationRunner::new(
            client,
            work_dir.to_path_buf(),
            "code",
            Box::new(|| Ok(Arc::new(FixedAnswerer) as Arc<dyn Answerer>)),
        );
        let state = Arc::new(AppState {
            runner,
            default_username: None,
            running: Mutex::new(()),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_index_and_health() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn("http://127.0.0.1:1".to_string(), dir.path()).await;

        let page = reqwest::get(format!("{}/", base)).await.unwrap().text().await.unwrap();
        assert!(page.contains("Run Evaluation"));

        let health: serde_json::Value = reqwest::get(format!("{}/health", base))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");
    }

    #[tokio::test]
    async fn test_run_without_username() {
        let mut api = mockito::Server::new_async().await;
        api.mock("GET", "/questions")
            .with_body(r#"[{"task_id": "a", "question": "Q?"}]"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let base = spawn(api.url(), dir.path()).await;

        let outcome: RunOutcome = reqwest::Client::new()
            .post(format!("{}/api/run", base))
            .json(&serde_json::json!({}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(outcome.status, "Please log in to submit.");
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].answer, "42");
    }
}
