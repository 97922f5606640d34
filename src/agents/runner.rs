use crate::agents::session::{InMemorySessionService, SessionKey};
use crate::agents::{AgentEvent, AgentSpec, LlmAgent};
use crate::llm::{ChatMessage, LLMClient};
use crate::tools::ToolsetFactory;
use crate::types::{AgentMessage, Result, ToolCall, ToolResult};
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Everything an agent run produced, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionTrace {
    pub function_calls: Vec<ToolCall>,
    pub function_responses: Vec<ToolResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_response: Option<String>,
}

impl ExecutionTrace {
    pub fn record(&mut self, event: AgentEvent) {
        match event {
            AgentEvent::FunctionCall(call) => self.function_calls.push(call),
            AgentEvent::FunctionResponse(response) => self.function_responses.push(response),
            AgentEvent::FinalResponse(text) => self.final_response = Some(text),
        }
    }
}

/// Runs agents inside sessions of one app.
pub struct AgentExecutor {
    app_name: String,
    llm: Arc<dyn LLMClient>,
    toolsets: Arc<dyn ToolsetFactory>,
    sessions: Arc<InMemorySessionService>,
    max_tool_iterations: usize,
}

impl AgentExecutor {
    pub fn new(
        app_name: impl Into<String>,
        llm: Arc<dyn LLMClient>,
        toolsets: Arc<dyn ToolsetFactory>,
        sessions: Arc<InMemorySessionService>,
        max_tool_iterations: usize,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            llm,
            toolsets,
            sessions,
            max_tool_iterations,
        }
    }

    pub fn sessions(&self) -> &Arc<InMemorySessionService> {
        &self.sessions
    }

    /// Run `spec` on the message's query in the message's session (created
    /// on first use) and return the full trace.
    pub async fn execute(&self, spec: &AgentSpec, message: &AgentMessage) -> Result<ExecutionTrace> {
        let key = SessionKey::new(&self.app_name, &message.user_id, &message.session_id);
        let session = self.sessions.get_or_create(&key);

        let toolset = self.toolsets.connect(&spec.tool_filter).await?;
        let agent = LlmAgent::new(
            spec.clone(),
            self.llm.clone(),
            toolset,
            self.max_tool_iterations,
        );

        tracing::info!(
            agent = %agent.name(),
            session = %message.session_id,
            "Running agent"
        );

        let mut trace = ExecutionTrace::default();
        let events = agent.run(session.history, &message.query);
        futures::pin_mut!(events);
        while let Some(event) = events.next().await {
            trace.record(event?);
        }

        let mut turn = vec![ChatMessage::user(message.query.clone())];
        if let Some(text) = &trace.final_response {
            turn.push(ChatMessage::assistant(text.clone(), Vec::new()));
        }
        self.sessions.append(&key, turn);

        Ok(trace)
    }

    /// Run `spec` on `query` in a fresh session that is dropped once the run
    /// ends, whatever its outcome.
    pub async fn execute_once(&self, spec: &AgentSpec, query: &str) -> Result<ExecutionTrace> {
        let message = AgentMessage {
            session_id: Uuid::new_v4().simple().to_string(),
            user_id: Uuid::new_v4().simple().to_string(),
            query: query.to_string(),
        };
        let result = self.execute(spec, &message).await;
        self.sessions.remove(&SessionKey::new(
            &self.app_name,
            &message.user_id,
            &message.session_id,
        ));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trace_is_append_only() {
        let mut trace = ExecutionTrace::default();
        for id in ["call_1", "call_2"] {
            trace.record(AgentEvent::FunctionCall(ToolCall {
                id: id.to_string(),
                name: "search_agent".to_string(),
                arguments: json!({}),
            }));
            trace.record(AgentEvent::FunctionResponse(ToolResult {
                tool_call_id: id.to_string(),
                name: "search_agent".to_string(),
                result: json!([]),
            }));
        }
        trace.record(AgentEvent::FinalResponse("done".to_string()));

        assert_eq!(trace.function_calls.len(), 2);
        assert_eq!(trace.function_calls[1].id, "call_2");
        assert_eq!(trace.function_responses.len(), 2);
        assert_eq!(trace.final_response.as_deref(), Some("done"));
    }

    #[test]
    fn test_trace_serialization() {
        let trace = ExecutionTrace::default();
        let value = serde_json::to_value(&trace).unwrap();
        assert_eq!(value, json!({"function_calls": [], "function_responses": []}));
    }
}
