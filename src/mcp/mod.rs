//! MCP tool registry served over streamable HTTP.

pub mod server;

pub use server::{AgentManagerServer, mcp_router};
