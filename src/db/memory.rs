//! In-memory document index.
//!
//! Data is not persisted and will be lost when the process exits. Hybrid
//! search mirrors the engine: BM25 `best_fields` over the boosted name and
//! the search text, cosine k-NN over the embedding, fused with RRF.

use crate::db::index::{Collection, DocumentHit, DocumentIndex, HybridQuery, IndexedRecord};
use crate::rag::search::{sort_ranked, Bm25Index, RrfFusion};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};

/// Lexical boost applied to the name field.
const NAME_BOOST: f32 = 3.0;

#[derive(Default)]
pub struct InMemoryIndex {
    collections: RwLock<HashMap<Collection, BTreeMap<String, IndexedRecord>>>,
    rrf: RrfFusion,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// An index with both collections already created.
    pub fn with_collections() -> Self {
        let index = Self::new();
        {
            let mut collections = index.collections.write();
            for collection in Collection::ALL {
                collections.entry(collection).or_default();
            }
        }
        index
    }

    pub fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .get(&collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }

    fn lexical_ranking(docs: &BTreeMap<String, IndexedRecord>, text: &str) -> Vec<(String, f32)> {
        let mut names = Bm25Index::new();
        let mut bodies = Bm25Index::new();
        for (id, record) in docs {
            names.add_document(id, &record.name);
            bodies.add_document(id, &record.search_text);
        }

        // best_fields: a document scores by its best matching field
        let mut best: HashMap<String, f32> = HashMap::new();
        for (id, score) in names.search(text, docs.len()) {
            best.insert(id, score * NAME_BOOST);
        }
        for (id, score) in bodies.search(text, docs.len()) {
            let entry = best.entry(id).or_insert(0.0);
            *entry = entry.max(score);
        }

        let mut ranked: Vec<_> = best.into_iter().collect();
        sort_ranked(&mut ranked);
        ranked
    }

    fn vector_ranking(
        docs: &BTreeMap<String, IndexedRecord>,
        vector: &[f32],
        k: usize,
    ) -> Vec<(String, f32)> {
        let mut ranked: Vec<_> = docs
            .iter()
            .map(|(id, record)| (id.clone(), Self::cosine_similarity(vector, &record.embedding)))
            .collect();
        sort_ranked(&mut ranked);
        ranked.truncate(k);
        ranked
    }
}

fn missing(collection: Collection) -> AppError {
    AppError::Index(format!("no such index [{}]", collection))
}

#[async_trait]
impl DocumentIndex for InMemoryIndex {
    async fn collection_exists(&self, collection: Collection) -> Result<bool> {
        Ok(self.collections.read().contains_key(&collection))
    }

    async fn ensure_collection(&self, collection: Collection, _dimensions: usize) -> Result<()> {
        self.collections.write().entry(collection).or_default();
        Ok(())
    }

    async fn index(
        &self,
        collection: Collection,
        id: &str,
        record: &IndexedRecord,
    ) -> Result<()> {
        // Writing to a missing index creates it, as the engine does.
        self.collections
            .write()
            .entry(collection)
            .or_default()
            .insert(id.to_string(), record.clone());
        Ok(())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<IndexedRecord>> {
        let collections = self.collections.read();
        let docs = collections.get(&collection).ok_or_else(|| missing(collection))?;
        Ok(docs.get(id).cloned())
    }

    async fn hybrid_search(
        &self,
        collection: Collection,
        query: &HybridQuery,
    ) -> Result<Vec<DocumentHit>> {
        let collections = self.collections.read();
        let docs = collections.get(&collection).ok_or_else(|| missing(collection))?;

        let lexical = Self::lexical_ranking(docs, &query.text);
        let vector = Self::vector_ranking(docs, &query.vector, query.k);
        let mut fused = self
            .rrf
            .fuse(&[(lexical.as_slice(), 1.0), (vector.as_slice(), 1.0)]);
        fused.truncate(query.size);

        Ok(fused
            .into_iter()
            .filter_map(|(id, _)| {
                docs.get(&id).map(|record| DocumentHit {
                    id,
                    raw: record.raw.clone(),
                })
            })
            .collect())
    }

    async fn list_raw(&self, collection: Collection, limit: usize) -> Result<Vec<Value>> {
        let collections = self.collections.read();
        let docs = collections.get(&collection).ok_or_else(|| missing(collection))?;
        Ok(docs.values().take(limit).map(|r| r.raw.clone()).collect())
    }

    async fn find_by_name(
        &self,
        collection: Collection,
        name: &str,
        limit: usize,
    ) -> Result<Vec<DocumentHit>> {
        let collections = self.collections.read();
        let docs = collections.get(&collection).ok_or_else(|| missing(collection))?;

        Ok(docs
            .iter()
            .filter(|(_, record)| {
                record.raw.get(collection.name_field()).and_then(Value::as_str) == Some(name)
            })
            .take(limit)
            .map(|(id, record)| DocumentHit {
                id: id.clone(),
                raw: record.raw.clone(),
            })
            .collect())
    }

    async fn update_raw(&self, collection: Collection, id: &str, raw: &Value) -> Result<Value> {
        let mut collections = self.collections.write();
        let docs = collections
            .get_mut(&collection)
            .ok_or_else(|| missing(collection))?;
        let record = docs
            .get_mut(id)
            .ok_or_else(|| AppError::Index(format!("document [{}] missing", id)))?;
        record.raw = raw.clone();

        Ok(json!({ "_index": collection.index_name(), "_id": id, "result": "updated" }))
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<Value> {
        let mut collections = self.collections.write();
        let docs = collections
            .get_mut(&collection)
            .ok_or_else(|| missing(collection))?;
        let result = if docs.remove(id).is_some() {
            "deleted"
        } else {
            "not_found"
        };

        Ok(json!({ "_index": collection.index_name(), "_id": id, "result": result }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolEntry;

    fn tool(name: &str, description: &str, embedding: Vec<f32>) -> IndexedRecord {
        IndexedRecord::for_tool(
            &ToolEntry {
                name: name.to_string(),
                description: description.to_string(),
            },
            embedding,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_collection() {
        let index = InMemoryIndex::new();
        assert!(!index.collection_exists(Collection::Agents).await.unwrap());
        assert!(index.list_raw(Collection::Agents, 10).await.is_err());

        index.ensure_collection(Collection::Agents, 4).await.unwrap();
        assert!(index.collection_exists(Collection::Agents).await.unwrap());
    }

    #[tokio::test]
    async fn test_hybrid_search_prefers_name_match() {
        let index = InMemoryIndex::with_collections();
        index
            .index(Collection::Tools, "http_get", &tool("http_get", "performs an HTTP GET", vec![1.0, 0.0]))
            .await
            .unwrap();
        index
            .index(Collection::Tools, "send_mail", &tool("send_mail", "sends an email over http", vec![0.0, 1.0]))
            .await
            .unwrap();

        let query = HybridQuery::new("http_get performs an HTTP GET", vec![1.0, 0.0]);
        let hits = index.hybrid_search(Collection::Tools, &query).await.unwrap();

        assert_eq!(hits[0].id, "http_get");
        assert_eq!(hits[0].raw["name"], "http_get");
    }

    #[tokio::test]
    async fn test_hybrid_search_respects_size() {
        let index = InMemoryIndex::with_collections();
        for i in 0..5 {
            let name = format!("tool_{}", i);
            index
                .index(Collection::Tools, &name, &tool(&name, "generic tool", vec![1.0, i as f32]))
                .await
                .unwrap();
        }

        let query = HybridQuery::new("generic tool", vec![1.0, 0.0]);
        let hits = index.hybrid_search(Collection::Tools, &query).await.unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[tokio::test]
    async fn test_update_keeps_text_and_embedding() {
        let index = InMemoryIndex::with_collections();
        let original = tool("http_get", "performs an HTTP GET", vec![0.25, 0.75]);
        index.index(Collection::Tools, "http_get", &original).await.unwrap();

        let raw = json!({"name": "http_get", "description": "now with retries"});
        let response = index
            .update_raw(Collection::Tools, "http_get", &raw)
            .await
            .unwrap();
        assert_eq!(response["result"], "updated");

        let stored = index.get(Collection::Tools, "http_get").await.unwrap().unwrap();
        assert_eq!(stored.raw, raw);
        assert_eq!(stored.search_text, original.search_text);
        assert_eq!(stored.embedding, original.embedding);
    }

    #[tokio::test]
    async fn test_find_by_name_is_exact() {
        let index = InMemoryIndex::with_collections();
        index
            .index(Collection::Tools, "http_get", &tool("http_get", "GET", vec![1.0]))
            .await
            .unwrap();

        let found = index.find_by_name(Collection::Tools, "http_get", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        let none = index.find_by_name(Collection::Tools, "http", 10).await.unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((InMemoryIndex::cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(InMemoryIndex::cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 0.001);
        assert_eq!(InMemoryIndex::cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
