//! Hybrid retrieval over the agent and tool collections.
//!
//! A query is the record's name and description joined by a space. It is
//! embedded once and sent as a single hybrid request (lexical `best_fields`
//! over the boosted name and the search text, plus k-NN over the embedding).
//! The engine fuses both lists by reciprocal rank.
//!
//! [`Bm25Index`] and [`RrfFusion`] implement the same ranking locally for the
//! in-memory index.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;

use crate::db::index::{Collection, DocumentIndex, HybridQuery};
use crate::rag::embeddings::EmbeddingProvider;
use crate::types::Result;

/// Maximum number of records a search returns.
pub const RESULT_LIMIT: usize = 3;

// ============================================================================
// Hybrid Retriever
// ============================================================================

/// Embeds a name/description pair and runs the hybrid query against a
/// collection.
#[derive(Clone)]
pub struct HybridRetriever {
    index: Arc<dyn DocumentIndex>,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl HybridRetriever {
    pub fn new(index: Arc<dyn DocumentIndex>, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self { index, embedder }
    }

    /// Up to [`RESULT_LIMIT`] raw payloads, in engine order.
    pub async fn search(
        &self,
        collection: Collection,
        name: &str,
        description: &str,
    ) -> Result<Vec<Value>> {
        let text = format!("{} {}", name, description);
        let vector = self.embedder.embed(&text).await?;

        let query = HybridQuery::new(text, vector);
        let hits = self.index.hybrid_search(collection, &query).await?;

        tracing::debug!(
            collection = %collection,
            query = %query.text,
            hits = hits.len(),
            "Hybrid search completed"
        );

        Ok(hits
            .into_iter()
            .take(RESULT_LIMIT)
            .map(|hit| hit.raw)
            .collect())
    }

    pub async fn search_agents(&self, agent_name: &str, description: &str) -> Result<Vec<Value>> {
        self.search(Collection::Agents, agent_name, description).await
    }

    pub async fn search_tools(&self, tool_name: &str, description: &str) -> Result<Vec<Value>> {
        self.search(Collection::Tools, tool_name, description).await
    }
}

// ============================================================================
// BM25 Index
// ============================================================================

/// BM25 index for lexical matching
#[derive(Debug, Clone, Default)]
pub struct Bm25Index {
    /// Document ID -> tokenized content
    documents: HashMap<String, Vec<String>>,
    /// Term -> document IDs containing term
    inverted_index: HashMap<String, HashSet<String>>,
    document_frequencies: HashMap<String, usize>,
    avg_doc_length: f32,
    /// Term frequency saturation
    k1: f32,
    /// Length normalization
    b: f32,
}

impl Bm25Index {
    pub fn new() -> Self {
        Self {
            k1: 1.2,
            b: 0.75,
            ..Default::default()
        }
    }

    /// Lowercase alphanumeric terms of two or more characters.
    fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| s.len() > 1)
            .map(String::from)
            .collect()
    }

    pub fn add_document(&mut self, id: &str, content: &str) {
        let tokens = Self::tokenize(content);

        let unique_terms: HashSet<_> = tokens.iter().cloned().collect();
        for term in &unique_terms {
            *self.document_frequencies.entry(term.clone()).or_insert(0) += 1;
            self.inverted_index
                .entry(term.clone())
                .or_default()
                .insert(id.to_string());
        }

        self.documents.insert(id.to_string(), tokens);

        let total_tokens: usize = self.documents.values().map(|v| v.len()).sum();
        self.avg_doc_length = total_tokens as f32 / self.documents.len() as f32;
    }

    fn idf(&self, term: &str) -> f32 {
        let df = self.document_frequencies.get(term).copied().unwrap_or(0) as f32;
        let n = self.documents.len() as f32;
        if df == 0.0 || n == 0.0 {
            return 0.0;
        }
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    fn score_document(&self, doc_tokens: &[String], query_terms: &[String]) -> f32 {
        let doc_len = doc_tokens.len() as f32;
        let mut term_freq: HashMap<&str, usize> = HashMap::new();
        for token in doc_tokens {
            *term_freq.entry(token.as_str()).or_insert(0) += 1;
        }

        query_terms
            .iter()
            .map(|term| {
                let tf = term_freq.get(term.as_str()).copied().unwrap_or(0) as f32;
                let numerator = tf * (self.k1 + 1.0);
                let denominator =
                    tf + self.k1 * (1.0 - self.b + self.b * doc_len / self.avg_doc_length);
                self.idf(term) * numerator / denominator
            })
            .sum()
    }

    /// Score every document sharing a term with the query; best first.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<(String, f32)> {
        let query_terms = Self::tokenize(query);
        if query_terms.is_empty() {
            return Vec::new();
        }

        let mut candidates: HashSet<&String> = HashSet::new();
        for term in &query_terms {
            if let Some(docs) = self.inverted_index.get(term) {
                candidates.extend(docs.iter());
            }
        }

        let mut results: Vec<(String, f32)> = candidates
            .into_iter()
            .filter_map(|id| {
                let tokens = self.documents.get(id)?;
                let score = self.score_document(tokens, &query_terms);
                (score > 0.0).then(|| (id.clone(), score))
            })
            .collect();

        sort_ranked(&mut results);
        results.truncate(top_k);
        results
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Descending score, ties broken by id so rankings are stable.
pub(crate) fn sort_ranked(results: &mut [(String, f32)]) {
    results.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
}

// ============================================================================
// Reciprocal Rank Fusion (RRF)
// ============================================================================

/// Reciprocal Rank Fusion for combining multiple ranked lists
#[derive(Debug, Clone)]
pub struct RrfFusion {
    /// RRF constant (typically 60)
    k: f32,
}

impl Default for RrfFusion {
    fn default() -> Self {
        Self { k: 60.0 }
    }
}

impl RrfFusion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_k(k: f32) -> Self {
        Self { k }
    }

    /// Fuse ranked `(id, score)` lists, each paired with a weight.
    pub fn fuse(&self, ranked_lists: &[(&[(String, f32)], f32)]) -> Vec<(String, f32)> {
        let mut fused_scores: HashMap<String, f32> = HashMap::new();

        for (results, weight) in ranked_lists {
            for (rank, (doc_id, _score)) in results.iter().enumerate() {
                let rrf_score = weight / (self.k + rank as f32 + 1.0);
                *fused_scores.entry(doc_id.clone()).or_insert(0.0) += rrf_score;
            }
        }

        let mut results: Vec<_> = fused_scores.into_iter().collect();
        sort_ranked(&mut results);
        results
    }
}
