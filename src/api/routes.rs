use crate::api::handlers::{agents, catalog, notifier};
use crate::{ApiState, NotifierState};
use axum::{
    Json, Router,
    routing::{delete, get, post, put},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Front-end routes. CORS is fully permissive.
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/invoke_agent", post(agents::invoke_agent))
        .route("/get_all_agents", get(catalog::get_all_agents))
        .route("/get_all_tools", get(catalog::get_all_tools))
        .route("/delete_agent/{agent_name}", delete(catalog::delete_agent))
        .route("/delete_tool/{tool_name}", delete(catalog::delete_tool))
        .route("/update_agent/{agent_name}", put(catalog::update_agent))
        .route("/update_tool/{tool_name}", put(catalog::update_tool))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Loopback routes of the approval notifier.
pub fn create_notifier_router(state: NotifierState) -> Router {
    Router::new()
        .route("/send_message", post(notifier::send_message))
        .route("/send_agent_response", post(notifier::send_agent_response))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
