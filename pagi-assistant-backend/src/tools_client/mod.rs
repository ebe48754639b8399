use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::info;

use pagi_assistant_core::{ActionOutput, Capability, SkillArguments, SkillInvoker};

#[derive(Debug, Serialize)]
pub struct ToolExecutionRequest<'a> {
    pub tool_name: &'a str,
    pub args: &'a SkillArguments,
}

#[derive(Debug, Deserialize)]
pub struct ToolExecutionResponse {
    pub status: String,
    #[serde(default)]
    pub tool_name: String,
    #[serde(default)]
    pub result: Value,
}

/// Runs skills by posting `{tool_name, args}` to a tool execution service.
pub struct HttpSkillInvoker {
    http_client: Client,
    endpoint_url: String,
}

impl HttpSkillInvoker {
    pub fn new(endpoint_url: String) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .context("failed to create HTTP client for tools")?;

        Ok(Self {
            http_client,
            endpoint_url,
        })
    }
}

#[async_trait]
impl SkillInvoker for HttpSkillInvoker {
    async fn invoke(
        &self,
        skill: &Capability,
        args: &SkillArguments,
    ) -> Result<Option<ActionOutput>> {
        let args_json = Value::Object(args.clone());
        info!(
            tool_name = %skill.name,
            args = %args_json,
            endpoint = %self.endpoint_url,
            "Executing skill"
        );

        let response = self
            .http_client
            .post(&self.endpoint_url)
            .json(&ToolExecutionRequest {
                tool_name: &skill.name,
                args,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            bail!("Tool call failed with status: {}. Body: {}", status, text);
        }

        let body: ToolExecutionResponse = response.json().await?;
        Ok(tool_output(body))
    }
}

/// Maps a tool response to an action output. An empty result means no output.
pub fn tool_output(body: ToolExecutionResponse) -> Option<ActionOutput> {
    let content = match body.result.get("stdout").unwrap_or(&body.result) {
        Value::Null => return None,
        Value::String(s) if s.trim().is_empty() => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };

    let content = if body.status == "success" {
        content
    } else {
        format!("[{}] {}: {}", body.status, body.tool_name, content)
    };

    Some(ActionOutput {
        content,
        instruct_content: Some(body.result),
    })
}
