//! Writes and administrative reads over the agent and tool collections.

use crate::db::index::{Collection, DocumentIndex, IndexedRecord};
use crate::rag::embeddings::EmbeddingProvider;
use crate::types::{AgentDefinition, AppError, Result, ToolEntry};
use serde_json::Value;
use std::sync::Arc;

/// Upper bound on documents returned by list and name lookups.
pub const LIST_LIMIT: usize = 1000;

/// Outcome of removing or updating one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    pub id: String,
    /// The engine's response body for this document.
    pub response: Value,
}

#[derive(Clone)]
pub struct Catalog {
    index: Arc<dyn DocumentIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl Catalog {
    pub fn new(index: Arc<dyn DocumentIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { index, embedder }
    }

    pub fn index(&self) -> &Arc<dyn DocumentIndex> {
        &self.index
    }

    pub async fn ensure_collections(&self, dimensions: usize) -> Result<()> {
        for collection in Collection::ALL {
            self.index.ensure_collection(collection, dimensions).await?;
        }
        Ok(())
    }

    /// Embed an approved agent and write it under its name.
    pub async fn register_agent(&self, definition: &AgentDefinition) -> Result<IndexedRecord> {
        let embedding = self.embedder.embed(&definition.search_text()).await?;
        let record = IndexedRecord::for_agent(definition, embedding)?;

        self.index
            .index(Collection::Agents, &definition.agent_name, &record)
            .await?;
        tracing::info!(agent = %definition.agent_name, "Agent indexed");
        Ok(record)
    }

    pub async fn register_tool(&self, tool: &ToolEntry) -> Result<IndexedRecord> {
        let embedding = self.embedder.embed(&tool.search_text()).await?;
        let record = IndexedRecord::for_tool(tool, embedding)?;

        self.index.index(Collection::Tools, &tool.name, &record).await?;
        tracing::info!(tool = %tool.name, "Tool indexed");
        Ok(record)
    }

    /// Raw payloads of the collection; empty when it does not exist yet.
    pub async fn list(&self, collection: Collection) -> Result<Vec<Value>> {
        if !self.index.collection_exists(collection).await? {
            return Ok(Vec::new());
        }
        self.index.list_raw(collection, LIST_LIMIT).await
    }

    /// Delete every document whose raw name matches exactly.
    pub async fn delete(&self, collection: Collection, name: &str) -> Result<Vec<DocumentChange>> {
        let hits = self.matches(collection, name, LIST_LIMIT).await?;

        let mut changes = Vec::with_capacity(hits.len());
        for hit in hits {
            let response = self.index.delete(collection, &hit.id).await?;
            changes.push(DocumentChange {
                id: hit.id,
                response,
            });
        }

        tracing::info!(collection = %collection, name, deleted = changes.len(), "Deleted documents");
        Ok(changes)
    }

    /// Replace the raw payload of the first exact match. Search text and
    /// embedding keep the values computed when the record was written.
    pub async fn update(
        &self,
        collection: Collection,
        name: &str,
        raw: &Value,
    ) -> Result<DocumentChange> {
        let hit = self
            .matches(collection, name, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(collection.not_found_message().to_string()))?;

        let response = self.index.update_raw(collection, &hit.id, raw).await?;
        tracing::info!(collection = %collection, name, id = %hit.id, "Updated raw payload");

        Ok(DocumentChange {
            id: hit.id,
            response,
        })
    }

    async fn matches(
        &self,
        collection: Collection,
        name: &str,
        limit: usize,
    ) -> Result<Vec<crate::db::index::DocumentHit>> {
        let not_found = || AppError::NotFound(collection.not_found_message().to_string());

        if !self.index.collection_exists(collection).await? {
            return Err(not_found());
        }
        let hits = self.index.find_by_name(collection, name, limit).await?;
        if hits.is_empty() {
            return Err(not_found());
        }
        Ok(hits)
    }
}
