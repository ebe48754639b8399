use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- 1. Request from Frontend (User Input) ---
#[derive(Debug, Deserialize, Clone)]
pub struct ChatRequest {
    pub session_id: Uuid,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

// --- 2. Response to Frontend (Agent Output) ---
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type")]
pub enum ChatResponse {
    // Reply produced by one think/act turn
    #[serde(rename = "complete_message")]
    CompleteMessage {
        id: Uuid,
        content: String,
        is_final: bool,
        latency_ms: u64,
        issued_command: Option<AgentCommand>,
    },

    // For status updates (e.g., nothing to do, oracle call failed)
    #[serde(rename = "status_update")]
    StatusUpdate {
        status: String,
        details: Option<String>,
    },
}

impl ChatResponse {
    pub fn status(status: &str, details: Option<String>) -> Self {
        Self::StatusUpdate {
            status: status.to_string(),
            details,
        }
    }

    /// Serializes for the socket, falling back to a fixed status frame.
    pub fn to_frame(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            "{\"type\":\"status_update\",\"status\":\"serialization_error\"}".to_string()
        })
    }
}

// --- 3. Structured Command (skill the agent ran for this turn) ---
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "command")]
pub enum AgentCommand {
    #[serde(rename = "execute_tool")]
    ExecuteTool {
        tool_name: String,
        arguments: serde_json::Value,
        result: Option<serde_json::Value>,
    },
}
