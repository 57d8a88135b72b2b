//! OCR, image, audio and YouTube tools.

use super::ToolContext;
use crate::error::{Result, SvarError};
use crate::model::Message;
use base64::Engine;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Run `tesseract` on an image and return the recognized text.
#[instrument]
pub async fn extract_text_from_image(image_path: &str) -> Result<String> {
    if !Path::new(image_path).exists() {
        return Err(SvarError::Tool(format!("File not found: {}", image_path)));
    }

    let output = Command::new("tesseract")
        .arg(image_path)
        .arg("stdout")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SvarError::ExecutableNotFound("tesseract".to_string())
            } else {
                SvarError::Tool(format!("Failed to run tesseract: {}", e))
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SvarError::Tool(format!("tesseract failed: {}", stderr.trim())));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

fn image_mime_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

/// Read an image into a `data:` URL.
async fn image_data_url(file_path: &str) -> Result<String> {
    let path = Path::new(file_path);
    let mime_type = image_mime_type(path).ok_or_else(|| {
        SvarError::Tool(format!("Could not determine MIME type for {}", file_path))
    })?;
    let bytes = tokio::fs::read(path).await?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
    Ok(format!("data:{};base64,{}", mime_type, encoded))
}

/// Whether a URL points at YouTube. `Err` carries the message returned to
/// the model for a malformed URL.
fn check_youtube_url(url: &str) -> std::result::Result<(), &'static str> {
    let parsed = url::Url::parse(url)
        .map_err(|_| "Please provide a valid video URL with http:// or https:// prefix.")?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err("Please provide a valid video URL with http:// or https:// prefix.");
    }
    if !url.contains("youtube.com") && !url.contains("youtu.be") {
        return Err("Only YouTube videos are supported.");
    }
    Ok(())
}

impl ToolContext {
    #[instrument(skip(self, question))]
    pub(crate) async fn image_analysis(&self, question: &str, file_path: &str) -> Result<String> {
        let vision = self.vision.as_ref().ok_or_else(|| {
            SvarError::Tool("GEMINI_API_KEY environment variable is not set.".to_string())
        })?;

        let data_url = image_data_url(file_path).await?;
        let reply = vision
            .invoke(&[Message::human_with_image(question, data_url)], &[])
            .await
            .map_err(|e| SvarError::Tool(format!("Processing failed: {}", e)))?;

        Ok(reply.content().to_string())
    }

    #[instrument(skip(self, question))]
    pub(crate) async fn audio_analysis(&self, question: &str, file_path: &str) -> Result<String> {
        let transcriber = self.transcriber.as_ref().ok_or_else(|| {
            SvarError::Tool("No transcription service configured (set GROQ_API_KEY).".to_string())
        })?;

        let path = Path::new(file_path);
        if !path.exists() {
            return Err(SvarError::Tool(format!("File not found: {}", file_path)));
        }

        let transcript = transcriber
            .transcribe(path)
            .await
            .map_err(|e| SvarError::Tool(format!("Processing failed: {}", e)))?;
        debug!("Transcript has {} characters", transcript.len());

        let prompt = format!(
            "Here is the transcript of the audio file {}:\n\n{}\n\nQuestion: {}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            transcript,
            question
        );
        let reply = self.chat_model()?.invoke(&[Message::human(prompt)], &[]).await?;
        Ok(reply.content().to_string())
    }

    #[instrument(skip(self, question))]
    pub(crate) async fn youtube_analysis(&self, question: &str, url: &str) -> Result<String> {
        if let Err(message) = check_youtube_url(url) {
            return Ok(message.to_string());
        }

        let output = Command::new("yt-dlp")
            .args(["--dump-json", "--skip-download", "--no-playlist", "--no-warnings", url])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SvarError::ExecutableNotFound("yt-dlp".to_string())
                } else {
                    SvarError::Tool(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SvarError::Tool(format!(
                "Error analyzing video: {}",
                stderr.trim()
            )));
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| SvarError::Tool(format!("Failed to parse yt-dlp output: {}", e)))?;

        let prompt = youtube_prompt(
            info["title"].as_str().unwrap_or("Unknown"),
            url,
            info["description"]
                .as_str()
                .unwrap_or("No description provided."),
            question,
        );
        let reply = self.chat_model()?.invoke(&[Message::human(prompt)], &[]).await?;
        Ok(reply.content().to_string())
    }
}

fn youtube_prompt(title: &str, url: &str, description: &str, question: &str) -> String {
    format!(
        "Analyze this YouTube video metadata:\n\
         Title: {title}\n\
         URL: {url}\n\
         Description: {description}\n\
         Question: {question}\n\
         Focus your answer on:\n\
         1. Main topic and key points\n\
         2. Expected visual elements\n\
         3. Overall message or purpose\n\
         4. Target audience"
    )
}
