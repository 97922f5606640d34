//! HTTP/JSON client for the approval notifier's loopback listener.

use crate::types::{AgentDefinition, AppError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

/// How the registry service reaches humans.
#[async_trait]
pub trait AgentNotifier: Send + Sync {
    /// Post an agent definition for review. Returns the notifier's
    /// acknowledgement without waiting for a decision.
    async fn request_approval(&self, definition: &AgentDefinition) -> Result<Value>;

    /// Relay an agent's final answer (or failure report) to the channel.
    async fn send_agent_response(&self, agent_response: &str) -> Result<Value>;
}

pub struct NotifierClient {
    base_url: String,
    client: reqwest::Client,
}

impl NotifierClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Notifier(format!("POST {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Notifier(format!(
                "POST {} returned {}: {}",
                path, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Notifier(format!("POST {} returned invalid JSON: {}", path, e)))
    }
}

#[async_trait]
impl AgentNotifier for NotifierClient {
    async fn request_approval(&self, definition: &AgentDefinition) -> Result<Value> {
        let body = serde_json::to_value(definition)
            .map_err(|e| AppError::Internal(format!("Failed to serialize agent: {}", e)))?;
        self.post("/send_message", &body).await
    }

    async fn send_agent_response(&self, agent_response: &str) -> Result<Value> {
        self.post(
            "/send_agent_response",
            &json!({ "agent_response": agent_response }),
        )
        .await
    }
}
