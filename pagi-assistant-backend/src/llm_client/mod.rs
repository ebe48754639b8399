use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use pagi_assistant_core::Oracle;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    temperature: f32,
}

// --- Concrete Oracle Implementation (HTTP Endpoint) ---
pub struct HttpOracle {
    http_client: Client,
    endpoint_url: String,
}

impl HttpOracle {
    pub fn new(endpoint_url: String) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("failed to create HTTP client for LLM")?;

        Ok(Self {
            http_client,
            endpoint_url,
        })
    }
}

#[async_trait]
impl Oracle for HttpOracle {
    async fn ask(&self, prompt: &str) -> Result<String> {
        tracing::debug!("Sending LLM call to: {}", self.endpoint_url);

        let response = self
            .http_client
            .post(&self.endpoint_url)
            .json(&CompletionRequest {
                prompt,
                temperature: 0.7,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            bail!("LLM API call failed with status: {}. Body: {}", status, text);
        }

        let raw_response = response.text().await?;
        Ok(extract_completion(&raw_response))
    }
}

/// Pulls the completion text out of an endpoint response.
///
/// Accepts `{"content": ..}`, `{"text": ..}`, `{"response": ..}`, the chat
/// completions shape (`choices[0].message.content`), or plain text.
pub fn extract_completion(raw_response: &str) -> String {
    let Ok(json_body) = serde_json::from_str::<serde_json::Value>(raw_response) else {
        return raw_response.trim().to_string();
    };

    let direct = ["content", "text", "response"]
        .iter()
        .find_map(|key| json_body.get(*key).and_then(|v| v.as_str()));
    let chat = json_body
        .pointer("/choices/0/message/content")
        .and_then(|v| v.as_str());

    match direct.or(chat) {
        Some(text) => text.trim().to_string(),
        None => raw_response.trim().to_string(),
    }
}

/// Offline oracle for `LLM_PROVIDER=mock`: echoes the user's sentence as talk.
pub struct MockOracle;

#[async_trait]
impl Oracle for MockOracle {
    async fn ask(&self, prompt: &str) -> Result<String> {
        if let Some(rest) = prompt.strip_prefix("Refer to this sentence:\n") {
            let sentence = rest.lines().next().unwrap_or("").trim();
            return Ok(format!("[TALK]: {sentence}"));
        }
        let tail = prompt.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
        Ok(format!("ACK(mock): {}", tail.trim()))
    }

    async fn is_related(&self, _a: &str, _b: &str) -> Result<bool> {
        Ok(true)
    }

    async fn rewrite(&self, sentence: &str, _context: &str) -> Result<String> {
        Ok(sentence.to_string())
    }
}
