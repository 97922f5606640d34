use crate::NotifierState;
use crate::api::handlers::invalid_body;
use crate::types::{AgentDefinition, Result};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct AgentResponseRequest {
    pub agent_response: String,
}

/// Open a review request and post its card.
pub async fn send_message(
    State(state): State<NotifierState>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(payload) = body.map_err(invalid_body)?;
    let definition = AgentDefinition::from_payload(payload)?;

    let request_id = state.workflow.submit(definition).await?;
    tracing::debug!(request = %request_id, "Review card posted");
    Ok(Json(json!({ "status": "sent" })))
}

pub async fn send_agent_response(
    State(state): State<NotifierState>,
    body: std::result::Result<Json<AgentResponseRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = body.map_err(invalid_body)?;
    state.workflow.relay_response(&request.agent_response).await?;
    Ok(Json(json!({ "status": "sent" })))
}
