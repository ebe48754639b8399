use anyhow::Result;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::{collections::HashMap, env, path::PathBuf, sync::Arc};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

mod llm_client;
mod protocol;
mod tools_client;

use llm_client::{HttpOracle, MockOracle};
use pagi_assistant_core::{
    ActionExecutor, ArgumentResolver, Assistant, AssistantConfig, CapabilityCatalog, Oracle,
    OracleArgumentResolver, OracleExecutor, PendingAction, SkillCatalog,
};
use protocol::{AgentCommand, ChatRequest, ChatResponse};
use tools_client::HttpSkillInvoker;

fn load_dotenv() {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let candidates: Vec<PathBuf> = vec![
        manifest_dir.join(".env"),
        // Workspace root
        manifest_dir
            .parent()
            .map(|p| p.join(".env"))
            .unwrap_or_else(|| PathBuf::from(".env")),
        PathBuf::from(".env"),
    ];

    for candidate in candidates {
        if !candidate.exists() {
            continue;
        }
        match dotenvy::from_path(&candidate) {
            Ok(_) => {
                info!(path = %candidate.display(), "Loaded .env");
                return;
            }
            Err(e) => {
                warn!(path = %candidate.display(), error = %e, "Failed to load .env");
            }
        }
    }

    warn!("No .env file loaded; relying on process environment");
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn assistant_config_from_env() -> AssistantConfig {
    let defaults = AssistantConfig::default();

    let summary_raw = env_or("ASSISTANT_SUMMARY_MAX_WORDS", &defaults.summary_max_words.to_string());
    let summary_max_words = summary_raw.parse::<usize>().unwrap_or_else(|e| {
        warn!(
            value = %summary_raw,
            error = %e,
            "Invalid ASSISTANT_SUMMARY_MAX_WORDS; falling back to default"
        );
        defaults.summary_max_words
    });

    AssistantConfig {
        name: env_or("ASSISTANT_NAME", &defaults.name),
        language: env_or("ASSISTANT_LANGUAGE", &defaults.language),
        summary_max_words,
        skill_path: env::var("ASSISTANT_SKILL_PATH").ok().map(PathBuf::from),
        ..defaults
    }
}

// --- API Shared State ---
// Stores the long-running Assistant instance for each user. Each agent sits
// behind its own mutex so think/act turns for one user never overlap.
pub struct ApiState {
    config: Arc<AssistantConfig>,
    oracle: Arc<dyn Oracle>,
    catalog: Arc<dyn CapabilityCatalog>,
    resolver: Arc<dyn ArgumentResolver>,
    executor: Arc<dyn ActionExecutor>,
    active_agents: Mutex<HashMap<String, Arc<Mutex<Assistant>>>>,
}

impl ApiState {
    pub async fn get_or_create_agent(&self, user_id: &str) -> Arc<Mutex<Assistant>> {
        let mut map = self.active_agents.lock().await;
        if let Some(agent) = map.get(user_id) {
            return agent.clone();
        }

        let new_agent = Arc::new(Mutex::new(Assistant::new(
            self.config.clone(),
            self.oracle.clone(),
            self.catalog.clone(),
            self.resolver.clone(),
            self.executor.clone(),
        )));
        map.insert(user_id.to_string(), new_agent.clone());
        info!(user_id = user_id, "New assistant session created");
        new_agent
    }
}

/// One conversational turn: record the message, decide, execute.
async fn run_turn(agent: Arc<Mutex<Assistant>>, message: String) -> Result<ChatResponse> {
    let started = std::time::Instant::now();
    let mut agent = agent.lock().await;

    agent.talk(message);
    if !agent.think().await? {
        return Ok(ChatResponse::status("idle", None));
    }

    let issued_command = match agent.pending_action() {
        Some(PendingAction::Skill { skill, args }) => Some((skill.name.clone(), args.clone())),
        _ => None,
    };

    let Some(output) = agent.act().await? else {
        return Ok(ChatResponse::status("conversation_ended", None));
    };

    Ok(ChatResponse::CompleteMessage {
        id: Uuid::new_v4(),
        content: output.content,
        is_final: true,
        latency_ms: started.elapsed().as_millis() as u64,
        issued_command: issued_command.map(|(tool_name, args)| AgentCommand::ExecuteTool {
            tool_name,
            arguments: serde_json::Value::Object(args),
            result: output.instruct_content,
        }),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pagi_assistant_backend=info,pagi_assistant_core=info".into()),
        )
        .with_target(false)
        .init();

    load_dotenv();

    let config = Arc::new(assistant_config_from_env());

    let llm_provider = env_or("LLM_PROVIDER", "mock").to_lowercase();
    let oracle: Arc<dyn Oracle> = match llm_provider.as_str() {
        "http" => Arc::new(HttpOracle::new(env_or(
            "LLM_ENDPOINT_URL",
            "http://127.0.0.1:8182/v1/complete",
        ))?),
        "mock" => Arc::new(MockOracle),
        other => {
            warn!(provider = %other, "Unknown LLM_PROVIDER; falling back to 'mock'");
            Arc::new(MockOracle)
        }
    };

    let catalog = match &config.skill_path {
        Some(path) => SkillCatalog::load_from_file(path).await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load skill catalog; continuing without skills");
            SkillCatalog::default()
        }),
        None => SkillCatalog::default(),
    };

    let invoker = Arc::new(HttpSkillInvoker::new(env_or(
        "SKILL_ENDPOINT_URL",
        "http://127.0.0.1:8183/tools/execute",
    ))?);

    let state = Arc::new(ApiState {
        config: config.clone(),
        oracle: oracle.clone(),
        catalog: Arc::new(catalog),
        resolver: Arc::new(OracleArgumentResolver::new(oracle.clone())),
        executor: Arc::new(OracleExecutor::new(config.clone(), oracle, invoker)),
        active_agents: Mutex::new(HashMap::new()),
    });

    let app = Router::new()
        .route("/api/health", get(health_check))
        .route("/api/memory/:user_id", get(export_memory).put(import_memory))
        .route("/ws/chat/:user_id", get(ws_handler))
        .with_state(state);

    let bind_addr = env_or("ASSISTANT_BIND", "127.0.0.1:8080");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, provider = %llm_provider, "PAGI Assistant Backend listening");

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "PAGI Assistant Backend Operational")
}

async fn export_memory(
    Path(user_id): Path<String>,
    State(state): State<Arc<ApiState>>,
) -> impl IntoResponse {
    let agent = state.get_or_create_agent(&user_id).await;
    let agent = agent.lock().await;
    match agent.export_memory() {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)),
        Err(e) => {
            error!(user_id = %user_id, error = %e, "Failed to export memory");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
        }
    }
}

async fn import_memory(
    Path(user_id): Path<String>,
    State(state): State<Arc<ApiState>>,
    Json(snapshot): Json<serde_json::Value>,
) -> impl IntoResponse {
    let agent = state.get_or_create_agent(&user_id).await;
    let applied = agent.lock().await.load_memory(snapshot);
    let status = if applied {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(serde_json::json!({ "applied": applied })))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(user_id): Path<String>,
    State(state): State<Arc<ApiState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, user_id, state))
}

async fn handle_socket(mut socket: WebSocket, user_id: String, state: Arc<ApiState>) {
    info!(user_id = %user_id, "WebSocket connected");

    let agent = state.get_or_create_agent(&user_id).await;

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                let req: ChatRequest = match serde_json::from_str(&text) {
                    Ok(r) => r,
                    Err(e) => {
                        error!(user_id = %user_id, error = %e, "Invalid ChatRequest JSON");
                        let resp = ChatResponse::status("invalid_request", Some(e.to_string()));
                        let _ = socket.send(Message::Text(resp.to_frame())).await;
                        continue;
                    }
                };

                if req.user_id != user_id {
                    error!(
                        path_user_id = %user_id,
                        body_user_id = %req.user_id,
                        "user_id mismatch between path and payload"
                    );
                    let resp = ChatResponse::status(
                        "user_id_mismatch",
                        Some("user_id in payload must match /ws/chat/:user_id".to_string()),
                    );
                    let _ = socket.send(Message::Text(resp.to_frame())).await;
                    continue;
                }

                info!(
                    user_id = %user_id,
                    session_id = %req.session_id,
                    msg = %req.message,
                    "User message"
                );

                // Run the turn without blocking the WS task.
                let response_handle = tokio::spawn(run_turn(agent.clone(), req.message));

                let resp = match response_handle.await {
                    Ok(Ok(response)) => response,
                    Ok(Err(e)) => {
                        error!(user_id = %user_id, error = %e, "Assistant turn failed");
                        ChatResponse::status("agent_error", Some(e.to_string()))
                    }
                    Err(e) => {
                        error!(user_id = %user_id, error = %e, "Assistant task panicked/aborted");
                        ChatResponse::status("agent_task_failed", Some(e.to_string()))
                    }
                };
                let _ = socket.send(Message::Text(resp.to_frame())).await;
            }
            Message::Close(_) => {
                info!(user_id = %user_id, "WebSocket closed by client");
                break;
            }
            _ => {}
        }
    }
}
