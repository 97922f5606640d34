//! # Agent Factory
//!
//! An orchestrator agent that discovers existing agents and tools through
//! hybrid search, asks a human to approve new agents, and runs catalogued
//! agents in the background.
//!
//! ## Services
//!
//! One binary, one subcommand per process:
//!
//! 1. **Tool registry** (`agent-factory registry`) - MCP over streamable HTTP
//!    with `search_agent`, `create_agent`, `tool_search`, `call_agent` and
//!    `invoice_extraction`
//! 2. **Approval notifier** (`agent-factory notifier`) - a Discord bot posting
//!    review cards, plus a loopback listener the registry posts to
//! 3. **Front-end API** (`agent-factory api`) - orchestrator invocation and
//!    catalog CRUD
//!
//! The document index is an external OpenSearch cluster with an `agents` and
//! a `tools` index; [`db::InMemoryIndex`] implements the same contract.
//!
//! ## Modules
//!
//! - [`agents`] - the tool-calling agent loop, sessions and background runs
//! - [`api`] - axum routes and handlers
//! - [`approval`] - review requests, cards and the Discord bot
//! - [`cli`] - argument parsing and process bootstrap
//! - [`db`] - document index clients and catalog operations
//! - [`llm`] - OpenAI-compatible model client
//! - [`mcp`] - the MCP tool registry server
//! - [`notifier`] - client side of the notifier's loopback listener
//! - [`rag`] - embeddings and hybrid retrieval
//! - [`tools`] - toolsets agents are bound to
//! - [`types`] - shared payloads and [`AppError`]
//! - [`utils`] - environment configuration
//!
//! ```rust,ignore
//! use factory::db::{Catalog, InMemoryIndex};
//! use std::sync::Arc;
//!
//! let catalog = Catalog::new(Arc::new(InMemoryIndex::with_collections()), embedder);
//! catalog.register_agent(&definition).await?;
//! ```

pub mod agents;
pub mod api;
pub mod approval;
pub mod cli;
pub mod db;
pub mod llm;
pub mod mcp;
pub mod notifier;
pub mod rag;
pub mod tools;
pub mod types;
pub mod utils;

pub use agents::{AgentExecutor, AgentSpec, RemoteInvoker};
pub use approval::ApprovalWorkflow;
pub use db::{Catalog, Collection, DocumentIndex};
pub use llm::{LLMClient, LLMResponse};
pub use rag::{EmbeddingProvider, HybridRetriever};
pub use types::{AppError, Result};
pub use utils::config::Config;

use std::sync::Arc;

/// State of the front-end API.
#[derive(Clone)]
pub struct ApiState {
    /// Runs the orchestrator in the caller's session.
    pub executor: Arc<AgentExecutor>,
    pub catalog: Arc<Catalog>,
}

/// State of the notifier's loopback listener.
#[derive(Clone)]
pub struct NotifierState {
    pub workflow: ApprovalWorkflow,
}
