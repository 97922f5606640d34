//! HTTP surfaces built on axum.
//!
//! # Front-end API
//!
//! - `POST /invoke_agent?session_id&user_id&query` - run the orchestrator
//! - `GET /get_all_agents`, `GET /get_all_tools` - raw payloads
//! - `DELETE /delete_agent/{name}`, `DELETE /delete_tool/{name}`
//! - `PUT /update_agent/{name}`, `PUT /update_tool/{name}` - replace the raw payload
//! - `GET /health`
//!
//! # Notifier listener (loopback only)
//!
//! - `POST /send_message` - open a review request
//! - `POST /send_agent_response` - relay an agent's answer

/// Request handlers.
pub mod handlers;
/// Router construction.
pub mod routes;
