//! MCP client side: agents reach the registry service's tools over
//! streamable HTTP.

use crate::tools::{ToolFilter, Toolset, ToolsetFactory};
use crate::types::{AppError, Result, ToolDefinition};
use async_trait::async_trait;
use rmcp::{
    model::{CallToolRequestParam, Tool as McpTool},
    service::{RoleClient, RunningService},
    transport::StreamableHttpClientTransport,
    ServiceExt,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// A live MCP session restricted to a set of tool names. The session is
/// cancelled when the toolset is dropped.
pub struct McpToolset {
    service: RunningService<RoleClient, ()>,
    tools: Vec<McpTool>,
    filter: ToolFilter,
}

impl McpToolset {
    pub async fn connect(url: &str, filter: ToolFilter) -> Result<Self> {
        let transport = StreamableHttpClientTransport::from_uri(url.to_string());
        let service = ()
            .serve(transport)
            .await
            .map_err(|e| AppError::Internal(format!("MCP connect to {} failed: {}", url, e)))?;

        let tools = service
            .list_all_tools()
            .await
            .map_err(|e| AppError::Internal(format!("MCP list tools failed: {}", e)))?
            .into_iter()
            .filter(|tool| filter.allows(&tool.name))
            .collect::<Vec<_>>();

        tracing::debug!(url, tools = tools.len(), "MCP toolset connected");
        Ok(Self {
            service,
            tools,
            filter,
        })
    }
}

fn to_definition(tool: &McpTool) -> ToolDefinition {
    ToolDefinition {
        name: tool.name.to_string(),
        description: tool.description.as_deref().unwrap_or_default().to_string(),
        parameters: Value::Object(tool.input_schema.as_ref().clone()),
    }
}

/// Collapse a tool result into one JSON value: structured content when
/// present, otherwise the text parts (parsed as JSON when they are JSON).
pub(crate) fn result_to_value(result: &Value) -> Value {
    if let Some(structured) = result.get("structuredContent").filter(|v| !v.is_null()) {
        return structured.clone();
    }

    let texts: Vec<&str> = result
        .get("content")
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();

    match texts.as_slice() {
        [] => Value::Null,
        [single] => serde_json::from_str(single).unwrap_or_else(|_| json!(single)),
        many => json!(many.join("\n")),
    }
}

#[async_trait]
impl Toolset for McpToolset {
    async fn definitions(&self) -> Result<Vec<ToolDefinition>> {
        Ok(self.tools.iter().map(to_definition).collect())
    }

    async fn call(&self, name: &str, args: Value) -> Result<Value> {
        if !self.filter.allows(name) {
            return Err(AppError::InvalidInput(format!(
                "Tool '{}' is not available to this agent",
                name
            )));
        }

        let params: CallToolRequestParam =
            serde_json::from_value(json!({ "name": name, "arguments": args }))
                .map_err(|e| AppError::InvalidInput(format!("Invalid tool arguments: {}", e)))?;

        let result = self
            .service
            .call_tool(params)
            .await
            .map_err(|e| AppError::Internal(format!("MCP call '{}' failed: {}", name, e)))?;

        let value = serde_json::to_value(&result)
            .map_err(|e| AppError::Internal(format!("Invalid MCP result: {}", e)))?;

        if result.is_error.unwrap_or(false) {
            return Err(AppError::Internal(format!(
                "Tool '{}' failed: {}",
                name,
                result_to_value(&value)
            )));
        }
        Ok(result_to_value(&value))
    }
}

/// Opens a fresh MCP session against the registry service per agent run.
#[derive(Debug, Clone)]
pub struct McpToolsetFactory {
    url: String,
}

impl McpToolsetFactory {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[async_trait]
impl ToolsetFactory for McpToolsetFactory {
    async fn connect(&self, filter: &ToolFilter) -> Result<Arc<dyn Toolset>> {
        Ok(Arc::new(McpToolset::connect(&self.url, filter.clone()).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_json_text_is_parsed() {
        let result = json!({
            "content": [{"type": "text", "text": "{\"status\":\"sent\"}"}],
            "isError": false
        });
        assert_eq!(result_to_value(&result), json!({"status": "sent"}));
    }

    #[test]
    fn test_plain_text_is_kept() {
        let result = json!({"content": [{"type": "text", "text": "Total: 42"}]});
        assert_eq!(result_to_value(&result), json!("Total: 42"));
    }

    #[test]
    fn test_structured_content_wins() {
        let result = json!({
            "content": [{"type": "text", "text": "ignored"}],
            "structuredContent": {"ok": true}
        });
        assert_eq!(result_to_value(&result), json!({"ok": true}));
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(result_to_value(&json!({"content": []})), Value::Null);
    }
}
