//! API request handlers.

/// Orchestrator invocation.
pub mod agents;
/// List, update and delete over the agent and tool collections.
pub mod catalog;
/// The notifier's loopback endpoints.
pub mod notifier;

use crate::types::AppError;
use axum::extract::rejection::{JsonRejection, QueryRejection};

pub(crate) fn invalid_body(rejection: JsonRejection) -> AppError {
    AppError::InvalidInput(format!("invalid payload: {}", rejection.body_text()))
}

pub(crate) fn invalid_query(rejection: QueryRejection) -> AppError {
    AppError::InvalidInput(rejection.body_text())
}
