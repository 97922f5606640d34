use crate::types::{AppError, Result};
use crate::utils::config::EmbeddingConfig;
use async_trait::async_trait;
use ollama_rs::{generation::embeddings::request::GenerateEmbeddingsRequest, Ollama};

/// Produces the dense vector stored next to each record and used for k-NN.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn model_name(&self) -> &str;
}

/// Embeddings served by a local Ollama instance.
pub struct OllamaEmbedder {
    client: Ollama,
    model: String,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: impl Into<String>) -> Result<Self> {
        let client = Ollama::try_new(base_url).map_err(|e| {
            AppError::Configuration(format!("Invalid Ollama URL '{}': {}", base_url, e))
        })?;

        Ok(Self {
            client,
            model: model.into(),
        })
    }

    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        Self::new(&config.ollama_url, config.model.clone())
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = GenerateEmbeddingsRequest::new(self.model.clone(), text.into());

        let response = self
            .client
            .generate_embeddings(request)
            .await
            .map_err(|e| AppError::Embedding(format!("Ollama error: {}", e)))?;

        match response.embeddings.into_iter().next() {
            Some(vector) if !vector.is_empty() => Ok(vector),
            _ => Err(AppError::Embedding(format!(
                "{} returned an empty embedding",
                self.model
            ))),
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
