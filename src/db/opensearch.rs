//! OpenSearch REST client for the agent and tool collections.
//!
//! Hybrid queries are sent with a `search_pipeline` whose
//! `score-ranker-processor` fuses the lexical and k-NN result lists by
//! reciprocal rank.

use crate::db::index::{Collection, DocumentHit, DocumentIndex, HybridQuery, IndexedRecord};
use crate::types::{AppError, Result};
use crate::utils::config::SearchConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde_json::{json, Value};

pub struct OpenSearchIndex {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    search_pipeline: String,
}

impl OpenSearchIndex {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        // Clusters are commonly deployed with self-signed certificates.
        let client = Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| AppError::Index(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(
            client,
            config.base_url(),
            config.username.clone(),
            config.password.clone(),
            config.search_pipeline.clone(),
        ))
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        search_pipeline: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            search_pipeline: search_pipeline.into(),
        }
    }

    pub fn search_pipeline(&self) -> &str {
        &self.search_pipeline
    }

    /// Create or replace the RRF search pipeline used by hybrid queries.
    pub async fn ensure_search_pipeline(&self) -> Result<()> {
        let body = json!({
            "description": "Reciprocal rank fusion of lexical and k-NN results",
            "phase_results_processors": [
                { "score-ranker-processor": { "combination": { "technique": "rrf" } } }
            ]
        });

        let url = format!("{}/_search/pipeline/{}", self.base_url, self.search_pipeline);
        self.send(self.client.put(url).json(&body), "put search pipeline")
            .await?;
        tracing::info!(pipeline = %self.search_pipeline, "Search pipeline ready");
        Ok(())
    }

    fn url(&self, collection: Collection, path: &str) -> String {
        format!("{}/{}{}", self.base_url, collection.index_name(), path)
    }

    /// URL of one document under `endpoint` (`_doc`, `_update`). Each
    /// segment is percent-encoded, so ids may contain `/`, `?` or `#`.
    fn doc_url(&self, collection: Collection, endpoint: &str, id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            AppError::Configuration(format!("Invalid OpenSearch URL {}: {}", self.base_url, e))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                AppError::Configuration(format!("OpenSearch URL has no path: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend([collection.index_name(), endpoint, id]);
        Ok(url)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }

    /// Send a request and decode the JSON body, mapping non-2xx to an error.
    async fn send(&self, request: RequestBuilder, operation: &str) -> Result<Value> {
        let response = self
            .authed(request)
            .send()
            .await
            .map_err(|e| AppError::Index(format!("{} failed: {}", operation, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Index(format!(
                "{} returned {}: {}",
                operation, status, body
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| AppError::Index(format!("{} returned invalid JSON: {}", operation, e)))
    }

    async fn search(&self, collection: Collection, url: String, body: Value) -> Result<Vec<Value>> {
        let response = self
            .send(self.client.post(url).json(&body), &format!("search {}", collection))
            .await?;
        Ok(hits(&response))
    }
}

fn hits(response: &Value) -> Vec<Value> {
    response
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn to_document_hit(hit: &Value) -> Option<DocumentHit> {
    Some(DocumentHit {
        id: hit.get("_id")?.as_str()?.to_string(),
        raw: hit.pointer("/_source/raw")?.clone(),
    })
}

#[async_trait]
impl DocumentIndex for OpenSearchIndex {
    async fn collection_exists(&self, collection: Collection) -> Result<bool> {
        let response = self
            .authed(self.client.head(self.url(collection, "")))
            .send()
            .await
            .map_err(|e| AppError::Index(format!("index exists check failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(AppError::Index(format!(
                "index exists check for {} returned {}",
                collection, status
            ))),
        }
    }

    async fn ensure_collection(&self, collection: Collection, dimensions: usize) -> Result<()> {
        if self.collection_exists(collection).await? {
            tracing::debug!(index = %collection, "Index already exists");
            return Ok(());
        }

        let mut properties = json!({
            collection.name_field(): {
                "type": "text",
                "fields": { "keyword": { "type": "keyword" } }
            },
            "search_text": { "type": "text" },
            "embedding": { "type": "knn_vector", "dimension": dimensions }
        });
        if collection == Collection::Agents {
            properties["tools"] = json!({ "type": "keyword" });
        }

        let body = json!({
            "settings": { "index": { "knn": true } },
            "mappings": { "properties": properties }
        });

        self.send(
            self.client.put(self.url(collection, "")).json(&body),
            "create index",
        )
        .await?;
        tracing::info!(index = %collection, dimensions, "Index created");
        Ok(())
    }

    async fn index(
        &self,
        collection: Collection,
        id: &str,
        record: &IndexedRecord,
    ) -> Result<()> {
        let body = record.to_source(collection);
        self.send(
            self.client
                .put(self.doc_url(collection, "_doc", id)?)
                .json(&body),
            "index document",
        )
        .await?;
        Ok(())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<IndexedRecord>> {
        let response = self
            .authed(self.client.get(self.doc_url(collection, "_doc", id)?))
            .send()
            .await
            .map_err(|e| AppError::Index(format!("get document failed: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(AppError::Index(format!(
                "get document returned {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Index(format!("get document returned invalid JSON: {}", e)))?;
        match body.get("_source") {
            Some(source) => IndexedRecord::from_source(collection, source).map(Some),
            None => Ok(None),
        }
    }

    async fn hybrid_search(
        &self,
        collection: Collection,
        query: &HybridQuery,
    ) -> Result<Vec<DocumentHit>> {
        let body = json!({
            "size": query.size,
            "_source": ["raw"],
            "query": {
                "hybrid": {
                    "queries": [
                        {
                            "multi_match": {
                                "query": query.text,
                                "fields": [format!("{}^3", collection.name_field()), "search_text"],
                                "type": "best_fields"
                            }
                        },
                        {
                            "knn": {
                                "embedding": { "vector": query.vector, "k": query.k }
                            }
                        }
                    ]
                }
            }
        });

        let url = format!(
            "{}?search_pipeline={}",
            self.url(collection, "/_search"),
            self.search_pipeline
        );
        let hits = self.search(collection, url, body).await?;
        Ok(hits.iter().filter_map(to_document_hit).collect())
    }

    async fn list_raw(&self, collection: Collection, limit: usize) -> Result<Vec<Value>> {
        let body = json!({ "query": { "match_all": {} }, "size": limit });
        let hits = self
            .search(collection, self.url(collection, "/_search"), body)
            .await?;
        Ok(hits
            .iter()
            .filter_map(|hit| hit.pointer("/_source/raw").cloned())
            .collect())
    }

    async fn find_by_name(
        &self,
        collection: Collection,
        name: &str,
        limit: usize,
    ) -> Result<Vec<DocumentHit>> {
        let body = json!({
            "query": { "term": { collection.raw_name_field(): name } },
            "size": limit
        });
        let hits = self
            .search(collection, self.url(collection, "/_search"), body)
            .await?;
        Ok(hits.iter().filter_map(to_document_hit).collect())
    }

    async fn update_raw(&self, collection: Collection, id: &str, raw: &Value) -> Result<Value> {
        let body = json!({ "doc": { "raw": raw } });
        self.send(
            self.client
                .post(self.doc_url(collection, "_update", id)?)
                .json(&body),
            "update document",
        )
        .await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<Value> {
        self.send(
            self.client.delete(self.doc_url(collection, "_doc", id)?),
            "delete document",
        )
        .await
    }
}
