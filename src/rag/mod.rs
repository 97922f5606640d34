//! Retrieval over the agent and tool catalog.
//!
//! - [`rag::embeddings`](crate::rag::embeddings) - dense embeddings served by Ollama
//! - [`rag::search`](crate::rag::search) - hybrid retrieval, BM25 and RRF fusion
//!
//! # Flow
//!
//! 1. **Query** - `"<name> <description>"`
//! 2. **Embedding** - the query is embedded once
//! 3. **Retrieval** - one hybrid request, lexical and k-NN
//! 4. **Fusion** - reciprocal rank fusion, top 3 raw payloads returned
//!
//! ```ignore
//! let retriever = HybridRetriever::new(index, embedder);
//! let agents = retriever.search_agents("Weather", "fetches weather").await?;
//! ```

pub mod embeddings;
pub mod search;

pub use embeddings::{EmbeddingProvider, OllamaEmbedder};
pub use search::{HybridRetriever, RrfFusion};
