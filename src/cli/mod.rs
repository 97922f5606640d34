//! Command-line interface of the agent-factory binary.
//!
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Agent Factory: discover, approve and run LLM agents.
#[derive(Parser, Debug)]
#[command(
    name = "agent-factory",
    version,
    about = "Agent Factory - hybrid agent discovery, MCP tool registry and Discord approvals",
    after_help = "EXAMPLES:\n    \
                  agent-factory setup-index          # Create the RRF pipeline and both indices\n    \
                  agent-factory notifier             # Discord bot + loopback listener\n    \
                  agent-factory registry             # MCP tool registry on :8005\n    \
                  agent-factory api                  # Front-end API on :8006\n    \
                  agent-factory register-tool --name http_get --description \"GET a URL\""
)]
pub struct Cli {
    /// Load environment variables from this file instead of .env
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the front-end API (orchestrator invocation and catalog CRUD)
    Api,

    /// Serve the MCP tool registry over streamable HTTP
    Registry,

    /// Run the Discord approval bot and its loopback listener
    Notifier,

    /// Create the hybrid search pipeline and the agents/tools indices
    SetupIndex,

    /// Embed and index a tool so `tool_search` can find it
    RegisterTool {
        /// Tool name (also the document id)
        #[arg(long)]
        name: String,

        /// What the tool does
        #[arg(long)]
        description: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_register_tool_args() {
        let cli = Cli::try_parse_from([
            "agent-factory",
            "--verbose",
            "register-tool",
            "--name",
            "http_get",
            "--description",
            "GET a URL",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::RegisterTool { name, description } => {
                assert_eq!(name, "http_get");
                assert_eq!(description, "GET a URL");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["agent-factory", "api", "--log-json", "--no-color"]).unwrap();
        assert!(cli.log_json);
        assert!(cli.no_color);
        assert!(matches!(cli.command, Commands::Api));
    }
}
