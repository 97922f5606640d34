//! Document index abstraction.
//!
//! Agents and tools live in two collections of one search engine. Every
//! record carries its raw payload, the text that is searched lexically and
//! the dense embedding of that same text:
//!
//! ```text
//! { "agent_name" | "name": ..., "raw": {...}, "search_text": ...,
//!   "tools": [...] (agents only), "embedding": [f32; N] }
//! ```
//!
//! [`DocumentIndex`] is implemented by the OpenSearch client and by an
//! in-memory index used in tests and local runs.

use crate::types::{AgentDefinition, AppError, Result, ToolEntry};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::fmt;

/// The two collections of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Agents,
    Tools,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Agents, Collection::Tools];

    pub fn index_name(&self) -> &'static str {
        match self {
            Collection::Agents => "agents",
            Collection::Tools => "tools",
        }
    }

    /// Top-level field holding the record's name, boosted in lexical search.
    pub fn name_field(&self) -> &'static str {
        match self {
            Collection::Agents => "agent_name",
            Collection::Tools => "name",
        }
    }

    /// Keyword field used for exact-name lookups.
    pub fn raw_name_field(&self) -> String {
        format!("raw.{}.keyword", self.name_field())
    }

    pub fn not_found_message(&self) -> &'static str {
        match self {
            Collection::Agents => "Agent not found",
            Collection::Tools => "Tool not found",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.index_name())
    }
}

/// A full stored record, as written at approval or registration time.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedRecord {
    pub name: String,
    pub raw: Value,
    pub search_text: String,
    pub tools: Option<Vec<String>>,
    pub embedding: Vec<f32>,
}

impl IndexedRecord {
    pub fn for_agent(definition: &AgentDefinition, embedding: Vec<f32>) -> Result<Self> {
        let raw = serde_json::to_value(definition)
            .map_err(|e| AppError::Internal(format!("Failed to serialize agent: {}", e)))?;

        Ok(Self {
            name: definition.agent_name.clone(),
            raw,
            search_text: definition.search_text(),
            tools: Some(definition.tools.clone()),
            embedding,
        })
    }

    pub fn for_tool(tool: &ToolEntry, embedding: Vec<f32>) -> Result<Self> {
        let raw = serde_json::to_value(tool)
            .map_err(|e| AppError::Internal(format!("Failed to serialize tool: {}", e)))?;

        Ok(Self {
            name: tool.name.clone(),
            raw,
            search_text: tool.search_text(),
            tools: None,
            embedding,
        })
    }

    /// The `_source` document written to the engine.
    pub fn to_source(&self, collection: Collection) -> Value {
        let mut source = Map::new();
        source.insert(collection.name_field().to_string(), json!(self.name));
        source.insert("raw".to_string(), self.raw.clone());
        source.insert("search_text".to_string(), json!(self.search_text));
        if let Some(tools) = &self.tools {
            source.insert("tools".to_string(), json!(tools));
        }
        source.insert("embedding".to_string(), json!(self.embedding));
        Value::Object(source)
    }

    pub fn from_source(collection: Collection, source: &Value) -> Result<Self> {
        let malformed =
            |field: &str| AppError::Index(format!("stored {} record lacks '{}'", collection, field));

        let name = source
            .get(collection.name_field())
            .and_then(Value::as_str)
            .ok_or_else(|| malformed(collection.name_field()))?
            .to_string();
        let raw = source.get("raw").cloned().ok_or_else(|| malformed("raw"))?;
        let search_text = source
            .get("search_text")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("search_text"))?
            .to_string();
        let tools = source.get("tools").and_then(|t| {
            t.as_array().map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
        });
        let embedding = source
            .get("embedding")
            .and_then(Value::as_array)
            .ok_or_else(|| malformed("embedding"))?
            .iter()
            .filter_map(|v| v.as_f64().map(|f| f as f32))
            .collect();

        Ok(Self {
            name,
            raw,
            search_text,
            tools,
            embedding,
        })
    }
}

/// One search hit: the engine's document id and the stored raw payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentHit {
    pub id: String,
    pub raw: Value,
}

/// A combined lexical + vector query, fused by rank on the engine side.
#[derive(Debug, Clone)]
pub struct HybridQuery {
    pub text: String,
    pub vector: Vec<f32>,
    /// Number of hits returned.
    pub size: usize,
    /// Neighbours requested from the vector side.
    pub k: usize,
}

impl HybridQuery {
    pub fn new(text: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            text: text.into(),
            vector,
            size: 3,
            k: 3,
        }
    }
}

/// Storage operations the catalog relies on.
#[async_trait]
pub trait DocumentIndex: Send + Sync {
    async fn collection_exists(&self, collection: Collection) -> Result<bool>;

    /// Create the collection with a vector field of `dimensions` if missing.
    async fn ensure_collection(&self, collection: Collection, dimensions: usize) -> Result<()>;

    /// Write (or overwrite) the document with the given id.
    async fn index(&self, collection: Collection, id: &str, record: &IndexedRecord)
        -> Result<()>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<IndexedRecord>>;

    /// Hybrid search, hits in fused rank order.
    async fn hybrid_search(
        &self,
        collection: Collection,
        query: &HybridQuery,
    ) -> Result<Vec<DocumentHit>>;

    /// Raw payloads of up to `limit` documents.
    async fn list_raw(&self, collection: Collection, limit: usize) -> Result<Vec<Value>>;

    /// Documents whose raw name equals `name` exactly.
    async fn find_by_name(
        &self,
        collection: Collection,
        name: &str,
        limit: usize,
    ) -> Result<Vec<DocumentHit>>;

    /// Replace only the raw payload of a document. Returns the engine's
    /// response body.
    async fn update_raw(&self, collection: Collection, id: &str, raw: &Value) -> Result<Value>;

    /// Delete a document by id. Returns the engine's response body.
    async fn delete(&self, collection: Collection, id: &str) -> Result<Value>;
}
