//! Tools available to agents.
//!
//! # Module Structure
//!
//! - [`mcp`](crate::tools::mcp) - tools served by the registry service over MCP
//! - [`invoice`](crate::tools::invoice) - invoice OCR through a vision model
//!
//! An agent never sees every tool: it is bound to a [`Toolset`] connected
//! with a [`ToolFilter`] naming the tools it may call.

use crate::types::{Result, ToolDefinition};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub mod invoice;
pub mod mcp;

pub use invoice::InvoiceExtractor;
pub use mcp::{McpToolset, McpToolsetFactory};

/// Names of the tools an agent may see and call. `None` allows all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolFilter(Option<Vec<String>>);

impl ToolFilter {
    pub fn all() -> Self {
        Self(None)
    }

    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Some(names.into_iter().map(Into::into).collect()))
    }

    pub fn allows(&self, name: &str) -> bool {
        match &self.0 {
            Some(names) => names.iter().any(|n| n == name),
            None => true,
        }
    }
}

/// A connected set of callable tools.
#[async_trait]
pub trait Toolset: Send + Sync {
    /// Definitions of the tools passing the filter this set was opened with.
    async fn definitions(&self) -> Result<Vec<ToolDefinition>>;

    /// Call a tool by name. Tools outside the filter are rejected.
    async fn call(&self, name: &str, args: Value) -> Result<Value>;
}

/// Opens a [`Toolset`] per agent run.
#[async_trait]
pub trait ToolsetFactory: Send + Sync {
    async fn connect(&self, filter: &ToolFilter) -> Result<Arc<dyn Toolset>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter() {
        let filter = ToolFilter::only(["search_agent", "call_agent"]);
        assert!(filter.allows("search_agent"));
        assert!(!filter.allows("invoice_extraction"));
        assert!(ToolFilter::all().allows("anything"));
    }
}
