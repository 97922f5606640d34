//! Mock implementations for testing.
//!
//! Stand-ins for every external service: the hosted model, the embedding
//! server, the Discord channel, the notifier and the registry's tools.

#![allow(dead_code)]

use async_trait::async_trait;
use factory::approval::{ChatChannel, MessageRef, ReviewCard};
use factory::llm::{ChatMessage, GenerationOptions, LLMClient, LLMResponse};
use factory::notifier::AgentNotifier;
use factory::rag::EmbeddingProvider;
use factory::tools::{ToolFilter, Toolset, ToolsetFactory};
use factory::types::{AgentDefinition, AppError, Result, ToolCall, ToolDefinition};
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

// ============= LLM =============

enum Scripted {
    Respond(LLMResponse),
    Fail(String),
}

/// Replays scripted turns in order and records what it was sent.
#[derive(Default)]
pub struct MockLLMClient {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<(Vec<ChatMessage>, Vec<ToolDefinition>, GenerationOptions)>>,
}

impl MockLLMClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// A model that answers every turn with tool calls and never finishes.
    pub fn looping(turns: usize) -> Self {
        let client = Self::new();
        for i in 0..turns {
            client.push_tool_call(&format!("call_{}", i), "echo", json!({"text": "again"}));
        }
        client
    }

    pub fn push_text(&self, text: &str) -> &Self {
        self.script
            .lock()
            .push_back(Scripted::Respond(LLMResponse::text(text)));
        self
    }

    pub fn push_tool_call(&self, id: &str, name: &str, arguments: Value) -> &Self {
        self.script
            .lock()
            .push_back(Scripted::Respond(LLMResponse::with_tool_calls(vec![
                ToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    arguments,
                },
            ])));
        self
    }

    pub fn push_failure(&self, message: &str) -> &Self {
        self.script
            .lock()
            .push_back(Scripted::Fail(message.to_string()));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn request(&self, index: usize) -> (Vec<ChatMessage>, Vec<ToolDefinition>, GenerationOptions) {
        self.requests.lock()[index].clone()
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
        options: GenerationOptions,
    ) -> Result<LLMResponse> {
        self.requests
            .lock()
            .push((messages.to_vec(), tools.to_vec(), options));

        match self.script.lock().pop_front() {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(message)) => Err(AppError::LLM(message)),
            None => Err(AppError::LLM("mock script exhausted".to_string())),
        }
    }

    async fn describe_image(&self, _prompt: &str, _image_url: &str) -> Result<String> {
        Ok("Invoice #1".to_string())
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

// ============= Embeddings =============

pub const MOCK_DIMENSIONS: usize = 64;

/// Deterministic bag-of-words embedding: each lowercase token is hashed into
/// a bucket. Texts sharing words point in similar directions.
#[derive(Default)]
pub struct MockEmbedder {
    calls: AtomicU64,
    failing: AtomicBool,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let embedder = Self::new();
        embedder.failing.store(true, Ordering::SeqCst);
        embedder
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; MOCK_DIMENSIONS];
        vector[0] = 0.1;
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in token.to_lowercase().bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            vector[1 + (hash as usize) % (MOCK_DIMENSIONS - 1)] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Embedding("mock embedder down".to_string()));
        }
        Ok(Self::vector(text))
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }
}

// ============= Chat channel =============

#[derive(Debug, Clone)]
pub struct SentCard {
    pub request_id: String,
    pub card: ReviewCard,
    pub message: MessageRef,
}

/// Records cards, edits and messages instead of talking to Discord.
#[derive(Default)]
pub struct RecordingChannel {
    next_id: AtomicU64,
    failing: AtomicBool,
    close_failing: AtomicBool,
    cards: Mutex<Vec<SentCard>>,
    closed: Mutex<Vec<(MessageRef, String)>>,
    texts: Mutex<Vec<String>>,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Fail only edits of sent cards.
    pub fn set_close_failing(&self, failing: bool) {
        self.close_failing.store(failing, Ordering::SeqCst);
    }

    pub fn cards(&self) -> Vec<SentCard> {
        self.cards.lock().clone()
    }

    pub fn closed(&self) -> Vec<(MessageRef, String)> {
        self.closed.lock().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Chat("mock channel down".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatChannel for RecordingChannel {
    async fn send_card(&self, request_id: &str, card: &ReviewCard) -> Result<MessageRef> {
        self.check()?;
        let message = MessageRef {
            channel_id: 42,
            message_id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
        };
        self.cards.lock().push(SentCard {
            request_id: request_id.to_string(),
            card: card.clone(),
            message,
        });
        Ok(message)
    }

    async fn close_card(&self, message: &MessageRef, text: &str) -> Result<()> {
        self.check()?;
        if self.close_failing.load(Ordering::SeqCst) {
            return Err(AppError::Chat("mock card edit rejected".to_string()));
        }
        self.closed.lock().push((*message, text.to_string()));
        Ok(())
    }

    async fn send_text(&self, text: &str) -> Result<()> {
        self.check()?;
        self.texts.lock().push(text.to_string());
        Ok(())
    }
}

// ============= Notifier =============

#[derive(Default)]
pub struct RecordingNotifier {
    approvals: Mutex<Vec<AgentDefinition>>,
    responses: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn approvals(&self) -> Vec<AgentDefinition> {
        self.approvals.lock().clone()
    }

    pub fn responses(&self) -> Vec<String> {
        self.responses.lock().clone()
    }
}

#[async_trait]
impl AgentNotifier for RecordingNotifier {
    async fn request_approval(&self, definition: &AgentDefinition) -> Result<Value> {
        self.approvals.lock().push(definition.clone());
        Ok(json!({"status": "sent"}))
    }

    async fn send_agent_response(&self, agent_response: &str) -> Result<Value> {
        self.responses.lock().push(agent_response.to_string());
        Ok(json!({"status": "sent"}))
    }
}

// ============= Tools =============

/// A tool implemented in-process.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    async fn execute(&self, args: Value) -> Result<Value>;
}

/// In-process tools standing in for the MCP registry.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
    filter: ToolFilter,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }
}

#[async_trait]
impl Toolset for ToolRegistry {
    async fn definitions(&self) -> Result<Vec<ToolDefinition>> {
        Ok(self
            .tools
            .values()
            .filter(|tool| self.filter.allows(tool.name()))
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect())
    }

    async fn call(&self, name: &str, args: Value) -> Result<Value> {
        match self.tools.get(name) {
            Some(tool) if self.filter.allows(name) => tool.execute(args).await,
            _ => Err(AppError::NotFound(format!("Tool not found: {}", name))),
        }
    }
}

#[async_trait]
impl ToolsetFactory for ToolRegistry {
    async fn connect(&self, filter: &ToolFilter) -> Result<Arc<dyn Toolset>> {
        Ok(Arc::new(Self {
            tools: self.tools.clone(),
            filter: filter.clone(),
        }))
    }
}

pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo the given text"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"text": {"type": "string"}},
            "required": ["text"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        Ok(json!({ "echo": args["text"] }))
    }
}

pub struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "http_get"
    }

    fn description(&self) -> &str {
        "Fetch a URL"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {"url": {"type": "string"}},
            "required": ["url"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        match args["url"].as_str() {
            Some(url) => Ok(json!({ "url": url, "body": "sunny, 21C" })),
            None => Err(AppError::InvalidInput("url is required".to_string())),
        }
    }
}

pub fn tool_registry() -> Arc<ToolRegistry> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(EchoTool));
    registry.register(Arc::new(WeatherTool));
    Arc::new(registry)
}

pub fn weather_agent() -> AgentDefinition {
    AgentDefinition {
        agent_name: "Weather".to_string(),
        agent_description: "fetches weather".to_string(),
        agent_instruction: String::new(),
        tools: vec!["http_get".to_string()],
    }
}
