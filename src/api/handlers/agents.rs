use crate::ApiState;
use crate::agents::ExecutionTrace;
use crate::agents::orchestrator::orchestrator_spec;
use crate::api::handlers::invalid_query;
use crate::types::{AgentMessage, AppError, InvokeAgentParams, Result};
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};

/// Run the orchestrator on one user turn and return everything it did.
pub async fn invoke_agent(
    State(state): State<ApiState>,
    params: std::result::Result<Query<InvokeAgentParams>, QueryRejection>,
) -> Result<Json<ExecutionTrace>> {
    let Query(params) = params.map_err(invalid_query)?;
    if params.query.trim().is_empty() {
        return Err(AppError::InvalidInput("query must not be empty".to_string()));
    }

    let message = AgentMessage::from(params);
    let trace = state.executor.execute(&orchestrator_spec(), &message).await?;
    Ok(Json(trace))
}
