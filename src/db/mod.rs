//! Document index clients.
//!
//! - [`index`] - the [`DocumentIndex`] trait and record/query types
//! - [`opensearch`] - OpenSearch over its REST API (hybrid query + RRF pipeline)
//! - [`memory`] - in-memory index with the same ranking, for tests and local runs
//! - [`catalog`] - agent/tool writes and the CRUD operations of the front-end API

pub mod catalog;
pub mod index;
pub mod memory;
pub mod opensearch;

pub use catalog::{Catalog, DocumentChange};
pub use index::{Collection, DocumentHit, DocumentIndex, HybridQuery, IndexedRecord};
pub use memory::InMemoryIndex;
pub use opensearch::OpenSearchIndex;
