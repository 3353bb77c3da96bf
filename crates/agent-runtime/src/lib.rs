//! # agent-runtime
//!
//! Runtime LLM providers for the portfolio advisor.
//!
//! ## Providers
//!
//! - **Gemini** (default): Google Generative Language API
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{GeminiConfig, GeminiProvider};
//!
//! let provider = GeminiProvider::new(GeminiConfig::new(api_key))?;
//! let completion = provider.complete(&messages, &options).await?;
//! ```

#[cfg(feature = "gemini")]
pub mod gemini;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiConfig, GeminiProvider};

// Re-export core types for convenience
pub use agent_core::{AgentError, LlmProvider, Message, Result, Role};
