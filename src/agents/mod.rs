//! Agent runtime.
//!
//! - [`llm_agent`] - the tool-calling loop of one agent
//! - [`runner`] - runs an agent inside a session and collects its trace
//! - [`session`] - in-memory sessions keyed by app, user and session id
//! - [`orchestrator`] - the agent behind the front-end API
//! - [`invocation`] - background runs of catalogued agents (`call_agent`)

pub mod invocation;
pub mod llm_agent;
pub mod orchestrator;
pub mod runner;
pub mod session;

pub use invocation::{InvocationOutcome, InvocationTicket, RemoteInvoker};
pub use llm_agent::LlmAgent;
pub use runner::{AgentExecutor, ExecutionTrace};
pub use session::{InMemorySessionService, SessionKey};

use crate::tools::ToolFilter;
use crate::types::{RemoteAgentRequest, ToolCall, ToolResult};

/// Everything needed to instantiate an agent for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    pub name: String,
    pub description: String,
    pub instruction: String,
    pub tool_filter: ToolFilter,
    pub temperature: Option<f32>,
}

impl AgentSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            instruction: instruction.into(),
            tool_filter: ToolFilter::all(),
            temperature: None,
        }
    }

    pub fn with_tools(mut self, tool_filter: ToolFilter) -> Self {
        self.tool_filter = tool_filter;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// The system prompt: the instruction followed by the agent's identity.
    pub fn system_prompt(&self) -> String {
        format!(
            "{}\n\nYou are an agent. Your internal name is \"{}\". The description about you is \"{}\".",
            self.instruction.trim(),
            self.name,
            self.description
        )
    }
}

impl From<&RemoteAgentRequest> for AgentSpec {
    fn from(request: &RemoteAgentRequest) -> Self {
        AgentSpec::new(
            request.agent_name.replace(' ', "_"),
            request.agent_description.clone(),
            request.agent_instruction.clone(),
        )
        .with_tools(ToolFilter::only(request.required_tools.iter().cloned()))
    }
}

/// What an agent run emits, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    FunctionCall(ToolCall),
    FunctionResponse(ToolResult),
    FinalResponse(String),
}
