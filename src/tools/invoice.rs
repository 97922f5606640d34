use crate::llm::LLMClient;
use crate::types::{AppError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use std::sync::Arc;

pub const INVOICE_PROMPT: &str = "Extract all the details from the given image";

/// Reads an invoice image from disk and asks a vision model to transcribe it.
#[derive(Clone)]
pub struct InvoiceExtractor {
    llm: Arc<dyn LLMClient>,
}

impl InvoiceExtractor {
    pub fn new(llm: Arc<dyn LLMClient>) -> Self {
        Self { llm }
    }

    pub async fn extract(&self, image_path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(image_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::InvalidInput(format!("Invoice image not found: {}", image_path.display()))
            } else {
                AppError::Internal(format!("Failed to read {}: {}", image_path.display(), e))
            }
        })?;

        let data_uri = format!("data:image/png;base64,{}", STANDARD.encode(&bytes));
        tracing::debug!(path = %image_path.display(), bytes = bytes.len(), "Extracting invoice");

        self.llm.describe_image(INVOICE_PROMPT, &data_uri).await
    }
}
