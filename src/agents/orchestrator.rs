//! The orchestrator agent served by the front-end API. It discovers,
//! creates and invokes agents through the registry service's tools.

use crate::agents::AgentSpec;
use crate::tools::ToolFilter;

pub const ORCHESTRATOR_NAME: &str = "orchestrator_agent";

/// Session namespace of front-end conversations.
pub const ORCHESTRATOR_APP: &str = "agent_factory";

/// Registry tools the orchestrator may call.
pub const ORCHESTRATOR_TOOLS: [&str; 4] = ["create_agent", "tool_search", "search_agent", "call_agent"];

const ORCHESTRATOR_INSTRUCTION: &str = r#"Execution Flow
    Search for a suitable existing agent.
    If found → invoke the agent with required parameters.
    If not found → search for required tools.
    If any required tools are missing → return a tool creation request.
Create a new agent only if:
    No suitable agent exists, and
    All required tools are available.
    Do not create agents for tasks that can be handled directly.
    Never invoke unavailable agents.
Output Rules
    Return only the final decision and action taken.
    No reasoning, explanations, or extra text.
    Response must be concise, deterministic, and unambiguous."#;

/// Deterministic (temperature 0) and limited to the four catalog tools.
pub fn orchestrator_spec() -> AgentSpec {
    AgentSpec::new(
        ORCHESTRATOR_NAME,
        "Agent who is responsible for creating and managing all the agents",
        ORCHESTRATOR_INSTRUCTION,
    )
    .with_tools(ToolFilter::only(ORCHESTRATOR_TOOLS))
    .with_temperature(0.0)
}
