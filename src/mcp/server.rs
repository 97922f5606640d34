use crate::agents::RemoteInvoker;
use crate::notifier::AgentNotifier;
use crate::rag::HybridRetriever;
use crate::tools::InvoiceExtractor;
use crate::types::{AgentDefinition, AppError, RemoteAgentRequest};
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router,
    transport::streamable_http_server::{
        StreamableHttpService, session::local::LocalSessionManager,
    },
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SearchAgentParams {
    /// Name of the agent to look for
    pub agent_name: String,
    /// What the agent should do
    pub agent_description: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CreateAgentParams {
    pub agent_name: String,
    pub agent_description: String,
    /// System instruction of the new agent
    #[serde(alias = "agent_insturctions")]
    pub agent_instructions: String,
    /// Names of the tools the agent may call
    pub tools: Vec<String>,
}

impl From<CreateAgentParams> for AgentDefinition {
    fn from(params: CreateAgentParams) -> Self {
        AgentDefinition {
            agent_name: params.agent_name,
            agent_description: params.agent_description,
            agent_instruction: params.agent_instructions,
            tools: params.tools,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct ToolSearchParams {
    pub tool_name: String,
    pub tool_description: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CallAgentParams {
    pub agent_name: String,
    pub agent_description: String,
    pub agent_instruction: String,
    /// Tools the agent is allowed to use
    pub required_tools: Vec<String>,
    /// The query the agent should answer
    pub input_query: String,
}

impl From<CallAgentParams> for RemoteAgentRequest {
    fn from(params: CallAgentParams) -> Self {
        RemoteAgentRequest {
            agent_name: params.agent_name,
            agent_description: params.agent_description,
            agent_instruction: params.agent_instruction,
            required_tools: params.required_tools,
            input_query: params.input_query,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct InvoiceExtractionParams {
    /// Path of the invoice image on the server's filesystem
    pub invoice_image_path: String,
}

fn to_mcp_error(error: AppError) -> McpError {
    match error {
        AppError::InvalidInput(msg) | AppError::NotFound(msg) => McpError::invalid_params(msg, None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

fn json_result(value: &Value) -> CallToolResult {
    CallToolResult::success(vec![Content::text(value.to_string())])
}

/// The tool registry: catalog search, agent creation and remote invocation.
#[derive(Clone)]
pub struct AgentManagerServer {
    retriever: Arc<HybridRetriever>,
    notifier: Arc<dyn AgentNotifier>,
    invoker: RemoteInvoker,
    invoice: Arc<InvoiceExtractor>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl AgentManagerServer {
    pub fn new(
        retriever: Arc<HybridRetriever>,
        notifier: Arc<dyn AgentNotifier>,
        invoker: RemoteInvoker,
        invoice: Arc<InvoiceExtractor>,
    ) -> Self {
        Self {
            retriever,
            notifier,
            invoker,
            invoice,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "This tool is used to search agents")]
    async fn search_agent(
        &self,
        Parameters(params): Parameters<SearchAgentParams>,
    ) -> Result<CallToolResult, McpError> {
        let hits = self
            .retriever
            .search_agents(&params.agent_name, &params.agent_description)
            .await
            .map_err(to_mcp_error)?;
        tracing::debug!(agent = %params.agent_name, hits = hits.len(), "search_agent");
        Ok(json_result(&Value::Array(hits)))
    }

    #[tool(description = "This tool is used to create a new agent")]
    async fn create_agent(
        &self,
        Parameters(params): Parameters<CreateAgentParams>,
    ) -> Result<CallToolResult, McpError> {
        let definition = AgentDefinition::from(params);
        let ack = self
            .notifier
            .request_approval(&definition)
            .await
            .map_err(to_mcp_error)?;
        tracing::info!(agent = %definition.agent_name, "Agent submitted for review");
        Ok(json_result(&ack))
    }

    #[tool(description = "This tool is used to search similar tools which can be attached to the agents")]
    async fn tool_search(
        &self,
        Parameters(params): Parameters<ToolSearchParams>,
    ) -> Result<CallToolResult, McpError> {
        let hits = self
            .retriever
            .search_tools(&params.tool_name, &params.tool_description)
            .await
            .map_err(to_mcp_error)?;
        tracing::debug!(tool = %params.tool_name, hits = hits.len(), "tool_search");
        Ok(json_result(&Value::Array(hits)))
    }

    #[tool(description = "This tool is used to invoke the agent with the required parameters")]
    async fn call_agent(
        &self,
        Parameters(params): Parameters<CallAgentParams>,
    ) -> Result<CallToolResult, McpError> {
        let ticket = self.invoker.invoke(params.into());
        Ok(json_result(&json!({ "Message": ticket.acknowledgement() })))
    }

    #[tool(description = "This tool is used to extract the details from a given invoice")]
    async fn invoice_extraction(
        &self,
        Parameters(params): Parameters<InvoiceExtractionParams>,
    ) -> Result<CallToolResult, McpError> {
        let path = PathBuf::from(&params.invoice_image_path);
        let details = self.invoice.extract(&path).await.map_err(to_mcp_error)?;
        Ok(CallToolResult::success(vec![Content::text(details)]))
    }
}

#[tool_handler]
impl ServerHandler for AgentManagerServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "Agent Manager".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some("This server has capablities to manage agents".into()),
        }
    }
}

/// Serve `server` over streamable HTTP at `/mcp`.
pub fn mcp_router(server: AgentManagerServer) -> axum::Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );
    axum::Router::new().nest_service("/mcp", service)
}
