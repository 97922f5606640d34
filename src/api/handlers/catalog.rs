use crate::ApiState;
use crate::api::handlers::invalid_body;
use crate::db::Collection;
use crate::types::{AppError, Result};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde_json::{Value, json};

pub async fn get_all_agents(State(state): State<ApiState>) -> Result<Json<Vec<Value>>> {
    Ok(Json(state.catalog.list(Collection::Agents).await?))
}

pub async fn get_all_tools(State(state): State<ApiState>) -> Result<Json<Vec<Value>>> {
    Ok(Json(state.catalog.list(Collection::Tools).await?))
}

pub async fn delete_agent(
    State(state): State<ApiState>,
    Path(agent_name): Path<String>,
) -> Result<Json<Value>> {
    let changes = state.catalog.delete(Collection::Agents, &agent_name).await?;
    let docs: Vec<Value> = changes
        .into_iter()
        .map(|change| json!({ "id": change.id, "response": change.response }))
        .collect();
    Ok(Json(json!({ "result": "deleted", "docs": docs })))
}

pub async fn delete_tool(
    State(state): State<ApiState>,
    Path(tool_name): Path<String>,
) -> Result<Json<Value>> {
    let changes = state.catalog.delete(Collection::Tools, &tool_name).await?;
    let deleted: Vec<Value> = changes
        .into_iter()
        .map(|change| json!({ "id": change.id, "result": change.response }))
        .collect();
    Ok(Json(json!({ "deleted": deleted })))
}

pub async fn update_agent(
    State(state): State<ApiState>,
    Path(agent_name): Path<String>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    update(&state, Collection::Agents, &agent_name, body).await
}

pub async fn update_tool(
    State(state): State<ApiState>,
    Path(tool_name): Path<String>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    update(&state, Collection::Tools, &tool_name, body).await
}

async fn update(
    state: &ApiState,
    collection: Collection,
    name: &str,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(raw) = body.map_err(invalid_body)?;
    if !raw.is_object() {
        return Err(AppError::InvalidInput(
            "invalid payload: expected a JSON object".to_string(),
        ));
    }

    let change = state.catalog.update(collection, name, &raw).await?;
    Ok(Json(json!({
        "result": "updated",
        "id": change.id,
        "update_response": change.response
    })))
}
