//! LLM Provider Clients and Abstractions
//!
//! - [`LLMClient`] - the trait agents and tools are written against
//! - [`OpenAIClient`] - OpenAI-compatible chat completions (Gemini, local OCR)
//!
//! # Example
//!
//! ```ignore
//! use factory::llm::{ChatMessage, GenerationOptions, LLMClient, OpenAIClient};
//!
//! let client = OpenAIClient::gemini(&config.llm);
//! let response = client
//!     .generate_with_tools(&[ChatMessage::user("What is 2+2?")], &[], GenerationOptions::default())
//!     .await?;
//! println!("{}", response.content);
//! ```

/// Core LLM client trait and message types.
pub mod client;
/// OpenAI-compatible client.
pub mod openai;

pub use client::{ChatMessage, GenerationOptions, LLMClient, LLMResponse};
pub use openai::OpenAIClient;
