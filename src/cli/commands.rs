//! Process bootstrap for each subcommand.
//!
//! Network clients are built once here and shared by `Arc`. Background work
//! (remote agent runs, approval timers) lives on a [`TaskTracker`] that is
//! drained, with a bound, before the process exits.

use crate::agents::orchestrator::ORCHESTRATOR_APP;
use crate::agents::{AgentExecutor, InMemorySessionService, RemoteInvoker};
use crate::api::routes::{create_notifier_router, create_router};
use crate::approval::discord::run_bot;
use crate::approval::{ApprovalHandler, ApprovalWorkflow, DiscordChannel};
use crate::cli::output::Output;
use crate::db::{Catalog, DocumentIndex, OpenSearchIndex};
use crate::llm::{LLMClient, OpenAIClient};
use crate::mcp::{AgentManagerServer, mcp_router};
use crate::notifier::{AgentNotifier, NotifierClient};
use crate::rag::{EmbeddingProvider, HybridRetriever, OllamaEmbedder};
use crate::tools::{InvoiceExtractor, McpToolsetFactory};
use crate::types::{AppError, Result, ToolEntry};
use crate::utils::config::Config;
use crate::{ApiState, NotifierState};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;

/// Session namespace of agents started through `call_agent`.
pub const REMOTE_APP: &str = "remote_agents";

const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

struct Backends {
    index: Arc<OpenSearchIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Backends {
    fn connect(config: &Config) -> Result<Self> {
        Ok(Self {
            index: Arc::new(OpenSearchIndex::new(&config.search)?),
            embedder: Arc::new(OllamaEmbedder::from_config(&config.embedding)?),
        })
    }

    fn document_index(&self) -> Arc<dyn DocumentIndex> {
        self.index.clone()
    }

    fn catalog(&self) -> Arc<Catalog> {
        Arc::new(Catalog::new(self.document_index(), self.embedder.clone()))
    }
}

/// Cancelled on Ctrl-C.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        tracing::info!("Shutdown requested");
        trigger.cancel();
    });
    token
}

async fn drain(tracker: &TaskTracker) {
    tracker.close();
    if tokio::time::timeout(DRAIN_TIMEOUT, tracker.wait()).await.is_err() {
        tracing::warn!(
            remaining = tracker.len(),
            "Background tasks still running at shutdown"
        );
    }
}

async fn bind(addr: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Configuration(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!(%addr, "Listening");
    Ok(listener)
}

async fn serve(
    listener: TcpListener,
    router: axum::Router,
    shutdown: CancellationToken,
) -> Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))
}

pub async fn run_api(config: Config, output: &Output) -> Result<()> {
    let backends = Backends::connect(&config)?;
    let llm: Arc<dyn LLMClient> = Arc::new(OpenAIClient::gemini(&config.llm));

    let executor = Arc::new(AgentExecutor::new(
        ORCHESTRATOR_APP,
        llm,
        Arc::new(McpToolsetFactory::new(&config.registry.mcp_server_url)),
        Arc::new(InMemorySessionService::new()),
        config.llm.max_tool_iterations,
    ));
    let state = ApiState {
        executor,
        catalog: backends.catalog(),
    };

    let addr = format!("{}:{}", config.server.api_host, config.server.api_port);
    output.banner("api");
    output.kv("MCP registry", &config.registry.mcp_server_url);
    output.kv("Model", &config.llm.model_id());
    output.listening("Front-end API", &addr);

    let listener = bind(&addr).await?;
    serve(listener, create_router(state), shutdown_token()).await
}

pub async fn run_registry(config: Config, output: &Output) -> Result<()> {
    let backends = Backends::connect(&config)?;
    let tracker = TaskTracker::new();

    let notifier: Arc<dyn AgentNotifier> = Arc::new(NotifierClient::new(&config.notifier.url));
    let llm: Arc<dyn LLMClient> = Arc::new(OpenAIClient::gemini(&config.llm));
    let executor = Arc::new(AgentExecutor::new(
        REMOTE_APP,
        llm,
        Arc::new(McpToolsetFactory::new(&config.registry.mcp_server_url)),
        Arc::new(InMemorySessionService::new()),
        config.llm.max_tool_iterations,
    ));
    let invoker = RemoteInvoker::new(executor, notifier.clone(), tracker.clone());
    let invoice = Arc::new(InvoiceExtractor::new(Arc::new(OpenAIClient::ocr(&config.ocr))));
    let retriever = Arc::new(HybridRetriever::new(
        backends.document_index(),
        backends.embedder.clone(),
    ));

    let server = AgentManagerServer::new(retriever, notifier, invoker, invoice);
    let router = mcp_router(server).layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.registry.host, config.registry.port);
    output.banner("registry");
    output.kv("OpenSearch", &config.search.base_url());
    output.kv("Notifier", &config.notifier.url);
    output.listening("MCP (streamable HTTP)", &format!("{}/mcp", addr));

    let listener = bind(&addr).await?;
    let result = serve(listener, router, shutdown_token()).await;
    drain(&tracker).await;
    result
}

pub async fn run_notifier(config: Config, output: &Output) -> Result<()> {
    let backends = Backends::connect(&config)?;
    let tracker = TaskTracker::new();
    let shutdown = shutdown_token();

    let channel = Arc::new(DiscordChannel::new(
        &config.discord.bot_token,
        config.discord.channel_id,
    )?);
    let workflow = ApprovalWorkflow::new(
        channel,
        backends.catalog(),
        config.notifier.approval_timeout,
        tracker.clone(),
    );

    let addr = format!("127.0.0.1:{}", config.notifier.port);
    output.banner("notifier");
    output.kv("Discord channel", &config.discord.channel_id.to_string());
    output.kv(
        "Approval timeout",
        &format!("{}s", config.notifier.approval_timeout.as_secs()),
    );
    output.listening("Notifier (loopback)", &addr);

    // The registry posts here; a taken port fails before the bot connects.
    let listener = bind(&addr).await?;
    let router = create_notifier_router(NotifierState {
        workflow: workflow.clone(),
    });
    let listener = tokio::spawn(serve(listener, router, shutdown.clone()));

    let bot = run_bot(
        &config.discord.bot_token,
        ApprovalHandler::new(workflow),
        shutdown.clone().cancelled_owned(),
    )
    .await;
    shutdown.cancel();

    let served = listener
        .await
        .map_err(|e| AppError::Internal(format!("Notifier listener panicked: {}", e)))?;
    drain(&tracker).await;
    bot.and(served)
}

pub async fn setup_index(config: Config, output: &Output) -> Result<()> {
    let backends = Backends::connect(&config)?;

    output.step(1, 2, "Creating hybrid search pipeline");
    backends.index.ensure_search_pipeline().await?;
    output.success(&format!(
        "Search pipeline '{}' ready",
        backends.index.search_pipeline()
    ));

    output.step(2, 2, "Creating agents and tools indices");
    backends
        .catalog()
        .ensure_collections(config.embedding.dimensions)
        .await?;
    output.success(&format!(
        "Indices ready ({} dimensions)",
        config.embedding.dimensions
    ));
    Ok(())
}

pub async fn register_tool(
    config: Config,
    output: &Output,
    name: String,
    description: String,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::InvalidInput("tool name must not be empty".to_string()));
    }
    let backends = Backends::connect(&config)?;
    let record = backends
        .catalog()
        .register_tool(&ToolEntry { name, description })
        .await?;
    output.success(&format!(
        "Indexed tool '{}' ({} dimensions)",
        record.name,
        record.embedding.len()
    ));
    Ok(())
}
