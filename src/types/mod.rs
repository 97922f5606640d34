use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============= Catalog Types =============

/// The raw payload of an agent: what a human approves and what the
/// `agents` collection stores under `raw`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub agent_name: String,
    pub agent_description: String,
    /// Review requests may omit the instruction; it is then indexed as empty.
    #[serde(default)]
    pub agent_instruction: String,
    pub tools: Vec<String>,
}

impl AgentDefinition {
    /// Text that is both searched lexically and embedded.
    pub fn search_text(&self) -> String {
        [
            self.agent_name.as_str(),
            self.agent_description.as_str(),
            self.agent_instruction.as_str(),
        ]
        .join(" ")
    }

    /// Parse a definition out of a loosely typed payload, naming the
    /// offending field on failure.
    pub fn from_payload(payload: Value) -> Result<Self> {
        serde_json::from_value(payload)
            .map_err(|e| AppError::InvalidInput(format!("invalid payload: {}", e)))
    }
}

/// The raw payload of a tool in the `tools` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolEntry {
    pub name: String,
    pub description: String,
}

impl ToolEntry {
    pub fn search_text(&self) -> String {
        format!("{} {}", self.name, self.description)
    }
}

// ============= Agent Runtime Types =============

/// A single user turn routed to an agent within a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    pub session_id: String,
    pub user_id: String,
    pub query: String,
}

/// Query string of `POST /invoke_agent`.
#[derive(Debug, Clone, Deserialize)]
pub struct InvokeAgentParams {
    pub session_id: String,
    pub user_id: String,
    pub query: String,
}

impl From<InvokeAgentParams> for AgentMessage {
    fn from(params: InvokeAgentParams) -> Self {
        Self {
            session_id: params.session_id,
            user_id: params.user_id,
            query: params.query,
        }
    }
}

/// Arguments of the `call_agent` tool, also the unit of background work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAgentRequest {
    pub agent_name: String,
    pub agent_description: String,
    pub agent_instruction: String,
    pub required_tools: Vec<String>,
    pub input_query: String,
}

// ============= Tool Types =============

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub name: String,
    pub result: serde_json::Value,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Search engine error: {0}")]
    Index(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Notifier error: {0}")]
    Notifier(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Index(msg)
            | AppError::Embedding(msg)
            | AppError::LLM(msg)
            | AppError::Notifier(msg)
            | AppError::Chat(msg)
            | AppError::Configuration(msg)
            | AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            tracing::error!(%status, error = %message, "request failed");
        }

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
