use crate::types::{AppError, Result};
use std::collections::HashMap;
use std::env;
use std::path::Path;
use std::time::Duration;

/// Gemini's OpenAI-compatible endpoint for API-key mode.
const GEMINI_OPENAI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub discord: DiscordConfig,
    pub llm: LLMConfig,
    pub search: SearchConfig,
    pub embedding: EmbeddingConfig,
    pub registry: RegistryConfig,
    pub notifier: NotifierConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub api_host: String,
    pub api_port: u16,
}

#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub bot_token: String,
    pub channel_id: u64,
}

#[derive(Debug, Clone)]
pub struct LLMConfig {
    pub api_key: String,
    pub use_vertexai: bool,
    pub vertex_project: Option<String>,
    pub vertex_location: Option<String>,
    pub model: String,
    pub max_tool_iterations: usize,
}

impl LLMConfig {
    /// Base URL of the OpenAI-compatible Gemini surface for the selected mode.
    pub fn api_base(&self) -> String {
        match (&self.vertex_project, &self.vertex_location) {
            (Some(project), Some(location)) if self.use_vertexai => format!(
                "https://{location}-aiplatform.googleapis.com/v1beta1/projects/{project}/locations/{location}/endpoints/openapi"
            ),
            _ => GEMINI_OPENAI_BASE.to_string(),
        }
    }

    /// Vertex addresses publisher models by a `google/` prefix.
    pub fn model_id(&self) -> String {
        if self.use_vertexai && !self.model.contains('/') {
            format!("google/{}", self.model)
        } else {
            self.model.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub use_ssl: bool,
    pub search_pipeline: String,
}

impl SearchConfig {
    pub fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub ollama_url: String,
    pub model: String,
    pub dimensions: usize,
}

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Where agents reach the tool registry (MCP endpoint).
    pub mcp_server_url: String,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Where the registry reaches the notifier's loopback listener.
    pub url: String,
    pub port: u16,
    pub approval_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
}

impl Config {
    /// Load `.env` (if present) and build the configuration from the process
    /// environment.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an explicit env file.
    pub fn from_env_file(path: &Path) -> Result<Self> {
        dotenvy::from_path(path).map_err(|e| {
            AppError::Configuration(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from a fixed set of variables.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars { lookup };

        let use_vertexai = parse_flag(&vars.required("GOOGLE_GENAI_USE_VERTEXAI")?)?;
        let (vertex_project, vertex_location) = if use_vertexai {
            (
                Some(vars.required("GOOGLE_CLOUD_PROJECT")?),
                Some(vars.required("GOOGLE_CLOUD_LOCATION")?),
            )
        } else {
            (None, None)
        };

        Ok(Config {
            server: ServerConfig {
                api_host: vars.or("API_HOST", "0.0.0.0"),
                api_port: vars.parsed_or("API_PORT", 8006)?,
            },
            discord: DiscordConfig {
                bot_token: vars.required("DISCORD_BOT_TOKEN")?,
                channel_id: vars.required_parsed("DISCORD_CHANNEL_ID")?,
            },
            llm: LLMConfig {
                api_key: vars.required("GOOGLE_API_KEY")?,
                use_vertexai,
                vertex_project,
                vertex_location,
                model: vars.or("LLM_MODEL", "gemini-2.5-flash"),
                max_tool_iterations: vars.parsed_or("MAX_TOOL_ITERATIONS", 10)?,
            },
            search: SearchConfig {
                host: vars.required("OPENSEARCH_HOST")?,
                port: vars.required_parsed("OPENSEARCH_PORT")?,
                username: vars.required("OPENSEARCH_USERNAME")?,
                password: vars.required("OPENSEARCH_PASSWORD")?,
                use_ssl: match (vars.lookup)("OPENSEARCH_USE_SSL") {
                    Some(value) => parse_flag(&value)?,
                    None => true,
                },
                search_pipeline: vars.or("OPENSEARCH_SEARCH_PIPELINE", "agent_team_rrf"),
            },
            embedding: EmbeddingConfig {
                ollama_url: vars.or("OLLAMA_URL", "http://localhost:11434"),
                model: vars.or("EMBEDDING_MODEL", "qwen3-embedding:0.6b"),
                dimensions: vars.parsed_or("EMBEDDING_DIMENSIONS", 1024)?,
            },
            registry: RegistryConfig {
                mcp_server_url: vars.required("MCP_SERVER_URL")?,
                host: vars.or("REGISTRY_HOST", "0.0.0.0"),
                port: vars.parsed_or("REGISTRY_PORT", 8005)?,
            },
            notifier: NotifierConfig {
                url: vars.or("NOTIFIER_URL", "http://localhost:8090"),
                port: vars.parsed_or("NOTIFIER_PORT", 8090)?,
                approval_timeout: Duration::from_secs(vars.parsed_or("APPROVAL_TIMEOUT_SECS", 180)?),
            },
            ocr: OcrConfig {
                api_base: vars.or("OCR_API_BASE", "http://localhost:8091/v1"),
                api_key: vars.or("OCR_API_KEY", ""),
                model: vars.or("OCR_MODEL", "tencent/HunyuanOCR"),
            },
        })
    }
}

struct Vars<F> {
    lookup: F,
}

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn required(&self, key: &str) -> Result<String> {
        match (self.lookup)(key) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(AppError::Configuration(format!(
                "Missing required environment variable {}",
                key
            ))),
        }
    }

    fn required_parsed<T: std::str::FromStr>(&self, key: &str) -> Result<T> {
        let value = self.required(key)?;
        parse_value(key, &value)
    }

    fn or(&self, key: &str, default: &str) -> String {
        (self.lookup)(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed_or<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T> {
        match (self.lookup)(key) {
            Some(value) => parse_value(key, &value),
            None => Ok(default),
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        AppError::Configuration(format!("Invalid value for {}: {:?}", key, value))
    })
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(AppError::Configuration(format!(
            "Invalid boolean flag: {:?}",
            other
        ))),
    }
}
