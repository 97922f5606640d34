//! The tool-calling loop.
//!
//! Each turn sends the conversation and the agent's tool definitions to the
//! model. Requested tool calls are executed in order and their results are
//! fed back; a turn without tool calls ends the run with its text as the
//! final response.

use crate::agents::{AgentEvent, AgentSpec};
use crate::llm::{ChatMessage, GenerationOptions, LLMClient};
use crate::tools::Toolset;
use crate::types::{AppError, Result, ToolResult};
use futures::Stream;
use serde_json::json;
use std::sync::Arc;

pub struct LlmAgent {
    spec: AgentSpec,
    llm: Arc<dyn LLMClient>,
    toolset: Arc<dyn Toolset>,
    max_tool_iterations: usize,
}

impl LlmAgent {
    pub fn new(
        spec: AgentSpec,
        llm: Arc<dyn LLMClient>,
        toolset: Arc<dyn Toolset>,
        max_tool_iterations: usize,
    ) -> Self {
        Self {
            spec,
            llm,
            toolset,
            max_tool_iterations,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Run the agent on `query`, with `history` as prior turns of the session.
    pub fn run<'a>(
        &'a self,
        history: Vec<ChatMessage>,
        query: &'a str,
    ) -> impl Stream<Item = Result<AgentEvent>> + Send + 'a {
        async_stream::try_stream! {
            let mut messages = Vec::with_capacity(history.len() + 2);
            messages.push(ChatMessage::system(self.spec.system_prompt()));
            messages.extend(history);
            messages.push(ChatMessage::user(query));

            let tools = self.toolset.definitions().await?;
            let options = GenerationOptions {
                temperature: self.spec.temperature,
            };
            let mut finished = false;

            for iteration in 0..self.max_tool_iterations {
                let response = self
                    .llm
                    .generate_with_tools(&messages, &tools, options)
                    .await?;

                if !response.has_tool_calls() {
                    tracing::debug!(agent = %self.spec.name, iteration, "Final response");
                    finished = true;
                    yield AgentEvent::FinalResponse(response.content);
                    break;
                }

                messages.push(ChatMessage::assistant(
                    response.content.clone(),
                    response.tool_calls.clone(),
                ));

                for call in response.tool_calls {
                    yield AgentEvent::FunctionCall(call.clone());

                    let result = match self.toolset.call(&call.name, call.arguments.clone()).await {
                        Ok(value) => value,
                        Err(e) => {
                            tracing::warn!(agent = %self.spec.name, tool = %call.name, error = %e, "Tool call failed");
                            json!({ "error": e.to_string() })
                        }
                    };

                    messages.push(ChatMessage::tool(call.id.clone(), result.to_string()));
                    yield AgentEvent::FunctionResponse(ToolResult {
                        tool_call_id: call.id,
                        name: call.name,
                        result,
                    });
                }
            }

            if !finished {
                Err::<(), _>(AppError::LLM(format!(
                    "{} exceeded {} tool iterations",
                    self.spec.name, self.max_tool_iterations
                )))?;
            }
        }
    }
}
